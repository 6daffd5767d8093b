//! Edits applied to the graph state on behalf of the editor.
//!
//! Position edits are the editor's side of the pinning contract: a dragged node is
//! pinned, a reset node is released back to auto-layout.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use super::types::*;

/// Which kind of graph the editor is showing; selects the well-known anchor names.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphKind {
    Environment,
    Engine,
}

impl std::str::FromStr for GraphKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "environment" => Ok(GraphKind::Environment),
            "engine" => Ok(GraphKind::Engine),
            other => Err(Error::UnknownGraphKind { kind: other.to_string() }),
        }
    }
}

const ENVIRONMENT_ANCHORS: &[(&str, AnchorRole)] = &[
    ("env/actions", AnchorRole::Input),
    ("env/observations", AnchorRole::Output),
    ("env/render", AnchorRole::Output),
];

const ENGINE_ANCHORS: &[(&str, AnchorRole)] = &[
    ("actuators", AnchorRole::Input),
    ("sensors", AnchorRole::Output),
];

/// Well-known boundary nodes of a graph kind that are present in `state`.
pub fn default_anchors(kind: GraphKind, state: &GraphState) -> BTreeMap<String, AnchorRole> {
    let table = match kind {
        GraphKind::Environment => ENVIRONMENT_ANCHORS,
        GraphKind::Engine => ENGINE_ANCHORS,
    };
    table
        .iter()
        .filter(|(name, _)| state.nodes.contains_key(*name))
        .map(|(name, role)| (name.to_string(), *role))
        .collect()
}

/// Pin a node at `pos` (e.g. after the user dragged it).
pub fn set_node_position(state: &mut GraphState, node: &str, pos: Point) -> Result<()> {
    if !pos.is_finite() {
        return Err(Error::NonFinitePosition { x: pos.x, y: pos.y });
    }
    if !state.nodes.contains_key(node) {
        return Err(Error::UnknownNode { id: node.to_string() });
    }
    state.gui_state.entry(node.to_string()).or_default().pos = Some(pos);
    Ok(())
}

/// Release a node back to auto-layout.
/// Returns true if the node had a position.
pub fn clear_node_position(state: &mut GraphState, node: &str) -> Result<bool> {
    if !state.nodes.contains_key(node) {
        return Err(Error::UnknownNode { id: node.to_string() });
    }
    Ok(state
        .gui_state
        .get_mut(node)
        .and_then(|g| g.pos.take())
        .is_some())
}

/// Release every node. The next layout call places the whole graph from scratch.
pub fn clear_all_positions(state: &mut GraphState) {
    for gui in state.gui_state.values_mut() {
        gui.pos = None;
    }
}

/// Bring `gui_state` in line with the current nodes and connections:
/// - every node gets a record
/// - records of removed nodes are dropped
/// - line styles of input terminals that are no longer connected are dropped
pub fn sync_gui_state(state: &mut GraphState) {
    let GraphState { nodes, connects, gui_state, .. } = state;

    gui_state.retain(|name, _| {
        let keep = nodes.contains_key(name);
        if !keep {
            debug!(node = %name, "dropping gui state of removed node");
        }
        keep
    });
    for name in nodes.keys() {
        gui_state.entry(name.clone()).or_default();
    }

    // Line styles are keyed by the full terminal name (`inputs/image`).
    let connected: BTreeSet<(&str, String)> = connects
        .iter()
        .map(|c| (c.target.node.as_str(), c.target.port()))
        .collect();

    for (name, gui) in gui_state.iter_mut() {
        gui.linestyle.retain(|terminal, _| {
            connected.contains(&(name.as_str(), terminal.clone()))
        });
    }
}
