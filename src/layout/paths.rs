// Longest shortest path from each anchor.
//
// The horizontal span of the anchored region is sized by the deepest node an
// anchor reaches: the maximum, over reachable nodes, of the hop count of the
// shortest directed path. Breadth-first search gives those hop counts
// directly and visits every node at most once, so cycles cannot loop.

use std::collections::VecDeque;

use super::adjacency::{Adjacency, NodeIx};

/// Hop count of the shortest directed path from `source` to every node.
/// `None` for unreachable nodes; `Some(0)` for the source itself.
pub fn shortest_path_lengths(adjacency: &Adjacency, source: NodeIx) -> Vec<Option<usize>> {
    let mut dist: Vec<Option<usize>> = vec![None; adjacency.len()];
    let mut queue = VecDeque::new();

    dist[source.0] = Some(0);
    queue.push_back(source);

    while let Some(ix) = queue.pop_front() {
        let d = dist[ix.0].unwrap_or(0);
        for &next in adjacency.successors(ix) {
            if dist[next.0].is_none() {
                dist[next.0] = Some(d + 1);
                queue.push_back(next);
            }
        }
    }

    dist
}

/// Longest of the shortest paths from `source`; 0 when nothing is reachable.
pub fn longest_shortest_path(adjacency: &Adjacency, source: NodeIx) -> usize {
    shortest_path_lengths(adjacency, source)
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(0)
}

/// Horizontal span allocated to the anchored region.
///
/// At least one spacing unit, so left and right anchors never share a column.
pub fn estimate_span(adjacency: &Adjacency, anchors: &[NodeIx], spacing: f64) -> f64 {
    let depth = anchors
        .iter()
        .map(|&ix| longest_shortest_path(adjacency, ix))
        .max()
        .unwrap_or(0);
    depth.max(1) as f64 * spacing
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_depth() {
        // in -> a -> b -> out
        let adj = Adjacency::new(
            ["in", "a", "b", "out"],
            [("in", "a"), ("a", "b"), ("b", "out")],
        );
        let src = adj.index_of("in").unwrap();
        assert_eq!(longest_shortest_path(&adj, src), 3);
    }

    #[test]
    fn test_shortcut_wins_over_long_path() {
        // in -> out directly, and in -> a -> b -> out
        let adj = Adjacency::new(
            ["in", "a", "b", "out"],
            [("in", "out"), ("in", "a"), ("a", "b"), ("b", "out")],
        );
        let src = adj.index_of("in").unwrap();
        let dist = shortest_path_lengths(&adj, src);
        assert_eq!(dist[adj.index_of("out").unwrap().0], Some(1));
        // `b` is the deepest node
        assert_eq!(longest_shortest_path(&adj, src), 2);
    }

    #[test]
    fn test_cycles_terminate() {
        let adj = Adjacency::new(["a", "b", "c"], [("a", "b"), ("b", "c"), ("c", "a")]);
        let src = adj.index_of("a").unwrap();
        assert_eq!(longest_shortest_path(&adj, src), 2);
    }

    #[test]
    fn test_sink_anchor_reaches_nothing() {
        let adj = Adjacency::new(["in", "out"], [("in", "out")]);
        let out = adj.index_of("out").unwrap();
        let dist = shortest_path_lengths(&adj, out);
        assert_eq!(dist, vec![None, Some(0)]);
        assert_eq!(longest_shortest_path(&adj, out), 0);
    }

    #[test]
    fn test_span_is_at_least_one_unit() {
        let adj = Adjacency::new(["in", "out"], std::iter::empty::<(&str, &str)>());
        let anchors = [adj.index_of("in").unwrap(), adj.index_of("out").unwrap()];
        assert_eq!(estimate_span(&adj, &anchors, 200.0), 200.0);
        assert_eq!(estimate_span(&adj, &[], 200.0), 200.0);
    }
}
