// Adjacency views of the graph state for layout.
//
// Node ids are interned into dense indices in sorted-name order, so every
// downstream pass is deterministic without further sorting:
// - undirected neighbor lists: clustering, spring forces, initial guesses
// - directed successor lists: hop distances from anchors
//
// Connections are reduced to node pairs (port suffixes dropped). Duplicates
// collapse, self-loops are ignored, and connections naming an unknown node are
// skipped and counted.

use std::collections::HashMap;

use tracing::debug;

use crate::state::GraphState;

/// Dense index of a node inside an [`Adjacency`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIx(pub usize);

#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    ids: Vec<String>,
    index: HashMap<String, NodeIx>,
    /// Undirected, sorted, no duplicates.
    neighbors: Vec<Vec<NodeIx>>,
    /// Directed (source -> target), sorted, no duplicates.
    successors: Vec<Vec<NodeIx>>,
    skipped: usize,
}

impl Adjacency {
    /// Build from node names and (source, target) node pairs.
    pub fn new<'a, N, E>(node_ids: N, edges: E) -> Self
    where
        N: IntoIterator<Item = &'a str>,
        E: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut ids: Vec<String> = node_ids.into_iter().map(str::to_string).collect();
        ids.sort();
        ids.dedup();

        let index: HashMap<String, NodeIx> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), NodeIx(i)))
            .collect();

        let mut neighbors: Vec<Vec<NodeIx>> = vec![Vec::new(); ids.len()];
        let mut successors: Vec<Vec<NodeIx>> = vec![Vec::new(); ids.len()];
        let mut skipped = 0;

        for (from, to) in edges {
            let (Some(&a), Some(&b)) = (index.get(from), index.get(to)) else {
                debug!(source = from, target = to, "skipping connection to unknown node");
                skipped += 1;
                continue;
            };
            if a == b {
                debug!(node = from, "ignoring self-loop");
                continue;
            }
            successors[a.0].push(b);
            neighbors[a.0].push(b);
            neighbors[b.0].push(a);
        }

        for list in neighbors.iter_mut().chain(successors.iter_mut()) {
            list.sort();
            list.dedup();
        }

        Self { ids, index, neighbors, successors, skipped }
    }

    pub fn from_state(state: &GraphState) -> Self {
        Self::new(
            state.nodes.keys().map(String::as_str),
            state
                .connects
                .iter()
                .map(|c| (c.source.node.as_str(), c.target.node.as_str())),
        )
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeIx> + '_ {
        (0..self.ids.len()).map(NodeIx)
    }

    pub fn id(&self, ix: NodeIx) -> &str {
        &self.ids[ix.0]
    }

    pub fn index_of(&self, id: &str) -> Option<NodeIx> {
        self.index.get(id).copied()
    }

    pub fn neighbors(&self, ix: NodeIx) -> &[NodeIx] {
        &self.neighbors[ix.0]
    }

    pub fn successors(&self, ix: NodeIx) -> &[NodeIx] {
        &self.successors[ix.0]
    }

    /// True if there is a connection `from -> to`.
    pub fn has_edge(&self, from: NodeIx, to: NodeIx) -> bool {
        self.successors[from.0].binary_search(&to).is_ok()
    }

    /// Connections dropped because an endpoint is not a node.
    pub fn skipped_connections(&self) -> usize {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> Adjacency {
        // a -> b -> c
        Adjacency::new(["c", "a", "b"], [("a", "b"), ("b", "c")])
    }

    #[test]
    fn test_ids_are_sorted() {
        let adj = chain();
        assert_eq!(adj.len(), 3);
        assert_eq!(adj.id(NodeIx(0)), "a");
        assert_eq!(adj.index_of("c"), Some(NodeIx(2)));
        assert_eq!(adj.index_of("ghost"), None);
    }

    #[test]
    fn test_neighbors_and_direction() {
        let adj = chain();
        let (a, b, c) = (NodeIx(0), NodeIx(1), NodeIx(2));

        assert_eq!(adj.neighbors(a), &[b]);
        assert_eq!(adj.neighbors(b), &[a, c]);
        assert_eq!(adj.neighbors(c), &[b]);

        assert_eq!(adj.successors(a), &[b]);
        assert!(adj.successors(c).is_empty());
        assert!(adj.has_edge(a, b));
        assert!(!adj.has_edge(b, a));
    }

    #[test]
    fn test_duplicates_collapse_and_self_loops_vanish() {
        let adj = Adjacency::new(["a", "b"], [("a", "b"), ("a", "b"), ("b", "a"), ("a", "a")]);
        let (a, b) = (NodeIx(0), NodeIx(1));

        assert_eq!(adj.neighbors(a), &[b]);
        assert_eq!(adj.successors(a), &[b]);
        assert_eq!(adj.successors(b), &[a]);
        assert_eq!(adj.neighbors(b), &[a]);
        assert_eq!(adj.skipped_connections(), 0);
    }

    #[test]
    fn test_dangling_connections_are_skipped() {
        let adj = Adjacency::new(["a", "b"], [("a", "ghost"), ("ghost", "b"), ("a", "b")]);
        assert_eq!(adj.skipped_connections(), 2);
        assert_eq!(adj.neighbors(NodeIx(0)), &[NodeIx(1)]);
    }
}
