// Packing of loose clusters.
//
// A loose cluster has no anchor and nothing pinned, so nothing ties it to the
// anchored region. Each one is relaxed on its own (see force_placement) and
// then stacked in a single column under everything already placed:
// left-aligned with the occupied region, `cluster_margin` below the previous
// cluster. Clusters arrive ordered by representative node, so the column
// order is stable across calls.
//
// Solver output is already in canvas units, so placement is a pure
// translation.

use tracing::trace;

use crate::state::Point;
use super::adjacency::{Adjacency, NodeIx};
use super::clusters::Cluster;
use super::force_placement::{layout_free_cluster, RelaxStats};
use super::{LayoutConfig, Rect, Size};

#[derive(Debug, Clone)]
pub struct Packer {
    x: f64,
    cursor_y: f64,
    margin: f64,
}

impl Packer {
    /// Start a column under `occupied`, or at the origin if nothing is placed yet.
    pub fn below(occupied: Option<Rect>, margin: f64) -> Self {
        match occupied {
            Some(r) => Self { x: r.x, cursor_y: r.bottom() + margin, margin },
            None => Self { x: 0.0, cursor_y: 0.0, margin },
        }
    }

    /// Translate `positions` to the cursor and advance past them.
    /// Returns the region the cluster now occupies.
    pub fn place(&mut self, positions: &mut [Point], size: Size) -> Rect {
        let Some(extent) = Rect::enclosing(positions.iter(), size) else {
            return Rect::new(self.x, self.cursor_y, 0.0, 0.0);
        };

        let dx = self.x - extent.x;
        let dy = self.cursor_y - extent.y;
        for p in positions.iter_mut() {
            p.x += dx;
            p.y += dy;
        }

        let region = Rect::new(self.x, self.cursor_y, extent.w, extent.h);
        self.cursor_y = region.bottom() + self.margin;
        region
    }
}

/// Lay out and stack every loose cluster.
/// Returns the placed positions and the total relaxation iterations spent.
pub fn pack_loose_clusters(
    adjacency: &Adjacency,
    clusters: &[&Cluster],
    occupied: Option<Rect>,
    cfg: &LayoutConfig,
) -> (Vec<(NodeIx, Point)>, usize) {
    let mut packer = Packer::below(occupied, cfg.cluster_margin);
    let mut placed = Vec::new();
    let mut iterations = 0;

    for cluster in clusters {
        let (mut local, RelaxStats { iterations: spent, .. }) =
            layout_free_cluster(adjacency, &cluster.members, cfg);
        let region = packer.place(&mut local, cfg.node_size);
        trace!(
            cluster = adjacency.id(cluster.representative()),
            nodes = cluster.members.len(),
            x = region.x,
            y = region.y,
            "packed loose cluster"
        );

        iterations += spent;
        placed.extend(cluster.members.iter().copied().zip(local));
    }

    (placed, iterations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packer_starts_at_origin_when_empty() {
        let mut packer = Packer::below(None, 50.0);
        let size = Size { w: 100.0, h: 40.0 };
        let mut a = vec![Point::new(-30.0, -30.0)];
        let mut b = vec![Point::new(500.0, 500.0), Point::new(500.0, 600.0)];

        let ra = packer.place(&mut a, size);
        let rb = packer.place(&mut b, size);

        assert_eq!(a[0], Point::new(0.0, 0.0));
        assert_eq!(ra, Rect::new(0.0, 0.0, 100.0, 40.0));
        // second region starts one margin below the first
        assert_eq!(rb.y, 90.0);
        assert_eq!(b[0], Point::new(0.0, 90.0));
        assert_eq!(b[1], Point::new(0.0, 190.0));
        assert!(!ra.overlaps(&rb));
    }

    #[test]
    fn test_packer_goes_below_occupied_region() {
        let occupied = Rect::new(-20.0, -10.0, 400.0, 300.0);
        let mut packer = Packer::below(Some(occupied), 25.0);
        let mut pts = vec![Point::new(7.0, 7.0)];
        packer.place(&mut pts, Size { w: 10.0, h: 10.0 });
        assert_eq!(pts[0], Point::new(-20.0, 315.0));
    }

    #[test]
    fn test_loose_clusters_stack_without_overlap() {
        let adj = Adjacency::new(["a", "b", "c", "d"], [("c", "d")]);
        let clusters = vec![
            Cluster { members: vec![NodeIx(0)], anchored: false },
            Cluster { members: vec![NodeIx(1)], anchored: false },
            Cluster { members: vec![NodeIx(2), NodeIx(3)], anchored: false },
        ];
        let refs: Vec<&Cluster> = clusters.iter().collect();
        let cfg = LayoutConfig::default();

        let (placed, _) = pack_loose_clusters(&adj, &refs, None, &cfg);
        assert_eq!(placed.len(), 4);

        let rect = |ix: usize| Rect::footprint(placed[ix].1, cfg.node_size);
        assert_eq!(placed[0], (NodeIx(0), Point::new(0.0, 0.0)));
        assert!(placed[1].1.y >= rect(0).bottom() + cfg.cluster_margin);
        assert!(placed[2].1.y.min(placed[3].1.y) >= rect(1).bottom() + cfg.cluster_margin);
        for i in 0..4 {
            for j in (i + 1)..4 {
                assert!(!rect(i).overlaps(&rect(j)));
            }
        }
    }
}
