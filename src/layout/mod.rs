// Auto-layout for node graphs.
//
// One call computes a position for every node; nothing is kept between calls
// except what the caller stores back as pins.
//
// Pipeline:
// 1. adjacency: undirected and directed views of the connections
// 2. paths: horizontal span from the deepest node any anchor reaches
// 3. clusters: fixed positions (pins, anchor column slots) and connected components
// 4. force_placement: clusters with fixed nodes relaxed around them
// 5. packing: clusters with nothing fixed relaxed alone and stacked below
//
// Spacing: a single length, `ideal_edge_length`, is the spring length, the
// column width of the span and the anchor stacking distance.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::state::{GraphState, Point};

mod adjacency;
mod clusters;
mod force_placement;
mod packing;
mod paths;
mod spatial_grid;

pub use adjacency::{Adjacency, NodeIx};
pub use paths::{longest_shortest_path, shortest_path_lengths};

use clusters::{find_clusters, resolve_anchors, resolve_fixed, Cluster};
use force_placement::layout_constrained_cluster;
use packing::pack_loose_clusters;
use paths::estimate_span;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Area covered by a node item whose origin is at `pos`.
    pub fn footprint(pos: Point, size: Size) -> Self {
        Self { x: pos.x, y: pos.y, w: size.w, h: size.h }
    }

    /// Smallest rect covering the footprints of all `points`.
    pub fn enclosing<'a>(points: impl IntoIterator<Item = &'a Point>, size: Size) -> Option<Self> {
        points
            .into_iter()
            .map(|&p| Self::footprint(p, size))
            .reduce(|a, b| a.union(&b))
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        Rect { x: x0, y: y0, w: x1 - x0, h: y1 - y0 }
    }

    /// Grow by `m` on every side.
    pub fn inflate(&self, m: f64) -> Rect {
        Rect { x: self.x - m, y: self.y - m, w: self.w + 2.0 * m, h: self.h + 2.0 * m }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Footprint of a node item; positions are its top-left corner.
    pub node_size: Size,
    /// Spring length, column width and anchor stacking distance.
    pub ideal_edge_length: f64,
    /// Vertical space above each packed loose cluster.
    pub cluster_margin: f64,
    /// Clearance kept between node footprints.
    pub overlap_gap: f64,
    /// Hard cap on relaxation iterations per cluster.
    pub max_iterations: usize,
    /// Mean step (canvas units) below which relaxation stops early.
    pub convergence_tolerance: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let node_size = Size { w: 160.0, h: 100.0 };
        Self {
            ideal_edge_length: 1.5 * node_size.w,
            node_size,
            cluster_margin: 80.0,
            overlap_gap: 20.0,
            max_iterations: 300,
            convergence_tolerance: 0.05,
        }
    }
}

impl LayoutConfig {
    /// Parse a (possibly partial) JSON object; missing fields take defaults.
    pub fn from_json(input: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(input).map_err(Error::InvalidConfig)?;
        Ok(cfg.sanitized())
    }

    /// Replace values the solver cannot work with by their defaults.
    pub fn sanitized(&self) -> Self {
        let d = Self::default();
        let positive = |v: f64, fallback: f64| if v.is_finite() && v > 0.0 { v } else { fallback };
        let non_negative = |v: f64, fallback: f64| if v.is_finite() && v >= 0.0 { v } else { fallback };

        Self {
            node_size: Size {
                w: positive(self.node_size.w, d.node_size.w),
                h: positive(self.node_size.h, d.node_size.h),
            },
            ideal_edge_length: positive(self.ideal_edge_length, d.ideal_edge_length),
            cluster_margin: non_negative(self.cluster_margin, d.cluster_margin),
            overlap_gap: non_negative(self.overlap_gap, d.overlap_gap),
            max_iterations: self.max_iterations.max(1),
            convergence_tolerance: non_negative(self.convergence_tolerance, d.convergence_tolerance),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutReport {
    pub anchored_clusters: usize,
    pub loose_clusters: usize,
    /// Nodes whose position was fixed going in (pins and anchor slots).
    pub fixed_nodes: usize,
    /// Nodes that received a computed position.
    pub placed_nodes: usize,
    /// Connections ignored because an endpoint is not a node.
    pub skipped_connections: usize,
    /// Horizontal distance between the input and output anchor columns.
    pub span: f64,
    /// Relaxation iterations over all clusters.
    pub iterations: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutResult {
    /// Exactly one entry per node of the input state.
    pub positions: BTreeMap<String, Point>,
    pub report: LayoutReport,
}

/// Compute positions for every node without touching the state.
pub fn compute_layout(state: &GraphState, cfg: &LayoutConfig) -> LayoutResult {
    let cfg = cfg.sanitized();
    let spacing = cfg.ideal_edge_length;

    let adjacency = Adjacency::from_state(state);
    if adjacency.is_empty() {
        let report = LayoutReport {
            skipped_connections: adjacency.skipped_connections(),
            ..LayoutReport::default()
        };
        return LayoutResult { positions: BTreeMap::new(), report };
    }

    let anchors = resolve_anchors(state, &adjacency);
    let mut is_anchor = vec![false; adjacency.len()];
    for a in &anchors {
        is_anchor[a.ix.0] = true;
    }

    let anchor_ixs: Vec<NodeIx> = anchors.iter().map(|a| a.ix).collect();
    let span = estimate_span(&adjacency, &anchor_ixs, spacing);
    let fixed = resolve_fixed(state, &adjacency, &anchors, span, spacing);
    let clusters = find_clusters(&adjacency, &is_anchor);

    let mut report = LayoutReport {
        anchored_clusters: clusters.iter().filter(|c| c.anchored).count(),
        loose_clusters: clusters.iter().filter(|c| !c.anchored).count(),
        fixed_nodes: fixed.iter().flatten().count(),
        skipped_connections: adjacency.skipped_connections(),
        span,
        ..LayoutReport::default()
    };

    // Loose clusters holding a pin stay where the pin is instead of being packed.
    let (constrained, loose): (Vec<&Cluster>, Vec<&Cluster>) = clusters
        .iter()
        .partition(|c| c.anchored || c.has_fixed(&fixed));

    let mut positions = fixed.clone();

    for cluster in constrained {
        if cluster.all_fixed(&fixed) {
            continue;
        }
        let obstacles: Vec<Rect> = adjacency
            .nodes()
            .filter(|ix| cluster.members.binary_search(ix).is_err())
            .filter_map(|ix| positions[ix.0])
            .map(|p| Rect::footprint(p, cfg.node_size))
            .collect();

        let (local, stats) =
            layout_constrained_cluster(&adjacency, &cluster.members, &fixed, &obstacles, &cfg);
        for (&ix, p) in cluster.members.iter().zip(local) {
            positions[ix.0] = Some(p);
        }
        report.iterations += stats.iterations;
    }

    let occupied = Rect::enclosing(positions.iter().flatten(), cfg.node_size);
    let (packed, iterations) = pack_loose_clusters(&adjacency, &loose, occupied, &cfg);
    for (ix, p) in packed {
        positions[ix.0] = Some(p);
    }
    report.iterations += iterations;
    report.placed_nodes = adjacency.len() - report.fixed_nodes;

    debug!(
        nodes = adjacency.len(),
        anchored = report.anchored_clusters,
        loose = report.loose_clusters,
        fixed = report.fixed_nodes,
        skipped = report.skipped_connections,
        span,
        iterations = report.iterations,
        "layout computed"
    );

    // Every node is covered by exactly one cluster, so every slot is filled.
    let positions = adjacency
        .nodes()
        .map(|ix| (adjacency.id(ix).to_string(), positions[ix.0].unwrap_or_default()))
        .collect();

    LayoutResult { positions, report }
}

/// Compute positions and store them in `state` as pins.
///
/// Already pinned nodes are written back unchanged, so calling this again on
/// its own output is a no-op.
pub fn apply_layout(state: &mut GraphState, cfg: &LayoutConfig) -> LayoutReport {
    let LayoutResult { positions, report } = compute_layout(state, cfg);
    for (name, pos) in positions {
        state.gui_state.entry(name).or_default().pos = Some(pos);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_union_and_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.overlaps(&b));
        assert!(a.inflate(1.0).overlaps(&b));
        assert_eq!(a.union(&b), Rect::new(0.0, 0.0, 20.0, 10.0));
    }

    #[test]
    fn test_enclosing_empty_is_none() {
        let size = Size { w: 1.0, h: 1.0 };
        assert_eq!(Rect::enclosing(std::iter::empty::<&Point>(), size), None);
        let pts = [Point::new(0.0, 0.0), Point::new(5.0, -5.0)];
        assert_eq!(Rect::enclosing(pts.iter(), size), Some(Rect::new(0.0, -5.0, 6.0, 6.0)));
    }

    #[test]
    fn test_config_partial_json() {
        let cfg = LayoutConfig::from_json(r#"{ "ideal_edge_length": 300, "max_iterations": 0 }"#).unwrap();
        assert_eq!(cfg.ideal_edge_length, 300.0);
        assert_eq!(cfg.max_iterations, 1);
        assert_eq!(cfg.node_size, LayoutConfig::default().node_size);
    }

    #[test]
    fn test_config_rejects_garbage() {
        assert!(matches!(LayoutConfig::from_json("[1, 2]"), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_sanitized_restores_bad_values() {
        let cfg = LayoutConfig {
            ideal_edge_length: -1.0,
            overlap_gap: f64::NAN,
            node_size: Size { w: 0.0, h: 50.0 },
            ..LayoutConfig::default()
        }
        .sanitized();
        let d = LayoutConfig::default();
        assert_eq!(cfg.ideal_edge_length, d.ideal_edge_length);
        assert_eq!(cfg.overlap_gap, d.overlap_gap);
        assert_eq!(cfg.node_size, Size { w: d.node_size.w, h: 50.0 });
    }

    #[test]
    fn test_empty_state_gives_empty_layout() {
        let result = compute_layout(&GraphState::default(), &LayoutConfig::default());
        assert!(result.positions.is_empty());
        assert_eq!(result.report.placed_nodes, 0);
    }

    #[test]
    fn test_connections_without_nodes_are_all_skipped() {
        let state: GraphState = serde_json::from_str(
            r#"{ "connects": [[["a", "outputs", "x"], ["b", "inputs", "x"]]], "anchors": { "a": "input" } }"#,
        )
        .unwrap();
        let result = compute_layout(&state, &LayoutConfig::default());
        assert!(result.positions.is_empty());
        assert_eq!(result.report.skipped_connections, 1);
        assert_eq!(result.report.anchored_clusters, 0);
    }
}
