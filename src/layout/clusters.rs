// Cluster partition and fixed positions.
//
// Before anything is relaxed, every node is either fixed for this run or free:
// - a stored (pinned) position is kept exactly
// - an unpinned anchor gets its canonical slot in the left or right column
// - everything else is free
//
// Clusters are the connected components of the undirected graph, found with an
// explicit stack so deep chains cannot overflow. A cluster holding at least
// one anchor is anchored; the rest are loose.

use tracing::debug;

use crate::state::{AnchorRole, GraphState, Point};
use super::adjacency::{Adjacency, NodeIx};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    /// Sorted; never empty.
    pub members: Vec<NodeIx>,
    pub anchored: bool,
}

impl Cluster {
    /// Smallest member; used to order clusters deterministically.
    pub fn representative(&self) -> NodeIx {
        self.members[0]
    }

    pub fn has_fixed(&self, fixed: &[Option<Point>]) -> bool {
        self.members.iter().any(|ix| fixed[ix.0].is_some())
    }

    pub fn all_fixed(&self, fixed: &[Option<Point>]) -> bool {
        self.members.iter().all(|ix| fixed[ix.0].is_some())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub ix: NodeIx,
    pub role: AnchorRole,
}

/// Connected components, ordered by representative.
pub fn find_clusters(adjacency: &Adjacency, is_anchor: &[bool]) -> Vec<Cluster> {
    let mut visited = vec![false; adjacency.len()];
    let mut clusters = Vec::new();
    let mut stack: Vec<NodeIx> = Vec::new();

    // Starts are visited in index order, so each start is the smallest member
    // of its component.
    for start in adjacency.nodes() {
        if visited[start.0] {
            continue;
        }
        visited[start.0] = true;
        stack.push(start);

        let mut members = Vec::new();
        while let Some(ix) = stack.pop() {
            members.push(ix);
            for &next in adjacency.neighbors(ix) {
                if !visited[next.0] {
                    visited[next.0] = true;
                    stack.push(next);
                }
            }
        }

        members.sort();
        let anchored = members.iter().any(|ix| is_anchor[ix.0]);
        clusters.push(Cluster { members, anchored });
    }

    clusters
}

/// Anchors named in the state that exist as nodes, in node order.
pub fn resolve_anchors(state: &GraphState, adjacency: &Adjacency) -> Vec<Anchor> {
    let mut anchors: Vec<Anchor> = Vec::with_capacity(state.anchors.len());
    for (name, &role) in &state.anchors {
        match adjacency.index_of(name) {
            Some(ix) => anchors.push(Anchor { ix, role }),
            None => debug!(anchor = %name, "ignoring anchor that is not a node"),
        }
    }
    anchors.sort_by_key(|a| a.ix);
    anchors
}

/// Positions that are fixed for this run, indexed by node.
///
/// Anchors of one role are stacked down their column in node order, `spacing`
/// apart; input anchors sit at x = 0 and output anchors at x = `span`.
pub fn resolve_fixed(
    state: &GraphState,
    adjacency: &Adjacency,
    anchors: &[Anchor],
    span: f64,
    spacing: f64,
) -> Vec<Option<Point>> {
    let mut fixed: Vec<Option<Point>> = adjacency
        .nodes()
        .map(|ix| {
            let pos = state.position(adjacency.id(ix))?;
            if pos.is_finite() {
                Some(pos)
            } else {
                debug!(node = adjacency.id(ix), "discarding non-finite stored position");
                None
            }
        })
        .collect();

    let mut inputs = 0usize;
    let mut outputs = 0usize;
    for anchor in anchors {
        let (x, slot) = match anchor.role {
            AnchorRole::Input => (0.0, &mut inputs),
            AnchorRole::Output => (span, &mut outputs),
        };
        let y = *slot as f64 * spacing;
        *slot += 1;

        if fixed[anchor.ix.0].is_none() {
            fixed[anchor.ix.0] = Some(Point::new(x, y));
        }
    }

    fixed
}
