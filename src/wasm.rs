//! WASM bindings for the layout engine.
//!
//! All functions exposed to JavaScript via wasm-bindgen are defined here.
//! They take and return JSON strings; an edit that fails logs to the console
//! and hands back the state it was given.

use wasm_bindgen::prelude::*;

use crate::error::Result;
use crate::output::layout_state_json;
use crate::state::{self, GraphKind, GraphState, Point};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = error)]
    pub fn console_error(s: &str);
}

/// Lay out a graph state with the default configuration.
/// Returns a `LayoutOutput` as JSON.
#[wasm_bindgen]
pub fn layout_graph_state(state_json: &str) -> String {
    layout_with(state_json, None)
}

/// Lay out a graph state; `config_json` may override any `LayoutConfig` field.
#[wasm_bindgen]
pub fn layout_graph_state_with_config(state_json: &str, config_json: &str) -> String {
    layout_with(state_json, Some(config_json))
}

fn layout_with(state_json: &str, config_json: Option<&str>) -> String {
    let output = layout_state_json(state_json, config_json);
    if let Some(e) = &output.error {
        console_error(&format!("Error laying out graph: {}", e.message));
    }
    output.to_json()
}

/// Pin a node (after a drag) and return the new state.
#[wasm_bindgen]
pub fn set_node_pos(state_json: &str, node: &str, x: f64, y: f64) -> String {
    edit_state(state_json, |s| state::set_node_position(s, node, Point::new(x, y)))
}

/// Release a node back to auto-layout and return the new state.
#[wasm_bindgen]
pub fn clear_node_pos(state_json: &str, node: &str) -> String {
    edit_state(state_json, |s| state::clear_node_position(s, node).map(|_| ()))
}

/// Release every node and return the new state.
#[wasm_bindgen]
pub fn clear_all_pos(state_json: &str) -> String {
    edit_state(state_json, |s| {
        state::clear_all_positions(s);
        Ok(())
    })
}

/// Reconcile `gui_state` with the current nodes and connections.
#[wasm_bindgen]
pub fn sync_state(state_json: &str) -> String {
    edit_state(state_json, |s| {
        state::sync_gui_state(s);
        Ok(())
    })
}

/// Replace the anchors with the well-known boundary nodes of `kind`
/// (`"environment"` or `"engine"`).
#[wasm_bindgen]
pub fn use_default_anchors(state_json: &str, kind: &str) -> String {
    edit_state(state_json, |s| {
        let kind: GraphKind = kind.parse()?;
        s.anchors = state::default_anchors(kind, s);
        Ok(())
    })
}

fn edit_state(source: &str, edit: impl FnOnce(&mut GraphState) -> Result<()>) -> String {
    let result = GraphState::from_json(source).and_then(|mut s| {
        edit(&mut s)?;
        s.to_json()
    });
    match result {
        Ok(json) => json,
        Err(e) => {
            console_error(&format!("Error editing graph state: {}", e));
            source.to_string()
        }
    }
}
