// Force-directed relaxation under fixed-position constraints.
//
// Spring model with a single length scale k (the ideal edge length):
// - every pair of nodes repels with k² / d
// - every edge attracts with d² / k
// - a free node moves along its net force by at most the current temperature,
//   which cools linearly over the iteration budget
// - fixed nodes exert forces but never move
//
// Relaxation stops after `max_iterations` or once the mean step of the free
// nodes drops below `convergence_tolerance`. A separation pass afterwards
// nudges free nodes until their footprints clear every other footprint.
//
// Initial guesses are deterministic: a breadth-first walk out of the fixed
// nodes puts each newly reached node one column to the right of its
// predecessor (left, if the connection runs the other way), fanning siblings
// up and down. The whole solver therefore has no randomness.

use std::collections::VecDeque;

use tracing::{trace, warn};

use crate::state::Point;
use super::adjacency::{Adjacency, NodeIx};
use super::spatial_grid::SpatialGrid;
use super::{LayoutConfig, Rect};

const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Upper bound on separation sweeps.
const SEPARATION_PASSES: usize = 50;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct RelaxStats {
    pub iterations: usize,
    pub converged: bool,
}

/// Lay out a cluster that has fixed nodes (anchors or pins).
///
/// Returns one position per member, in member order; fixed members come back
/// unchanged. `obstacles` are footprints of nodes outside the cluster that
/// free members must not overlap.
pub fn layout_constrained_cluster(
    adjacency: &Adjacency,
    members: &[NodeIx],
    fixed: &[Option<Point>],
    obstacles: &[Rect],
    cfg: &LayoutConfig,
) -> (Vec<Point>, RelaxStats) {
    let fixed_local: Vec<Option<Point>> = members.iter().map(|ix| fixed[ix.0]).collect();
    let movable: Vec<bool> = fixed_local.iter().map(Option::is_none).collect();

    let mut positions = seed_positions(adjacency, members, &fixed_local, cfg.ideal_edge_length);
    let edges = local_edges(adjacency, members);

    let stats = relax(&mut positions, &movable, &edges, cfg);
    if !stats.converged {
        warn!(
            cluster = adjacency.id(members[0]),
            nodes = members.len(),
            iterations = stats.iterations,
            "relaxation stopped at its iteration budget"
        );
    }
    separate(&mut positions, &movable, obstacles, cfg);

    (positions, stats)
}

/// Lay out a cluster with nothing fixed. Coordinates are relative; the caller
/// translates them into place.
pub fn layout_free_cluster(
    adjacency: &Adjacency,
    members: &[NodeIx],
    cfg: &LayoutConfig,
) -> (Vec<Point>, RelaxStats) {
    let movable = vec![true; members.len()];
    let no_fixed = vec![None; members.len()];

    let mut positions = seed_positions(adjacency, members, &no_fixed, cfg.ideal_edge_length);
    let edges = local_edges(adjacency, members);

    let stats = relax(&mut positions, &movable, &edges, cfg);
    separate(&mut positions, &movable, &[], cfg);

    (positions, stats)
}

/// Cluster edges in member-local indices.
fn local_edges(adjacency: &Adjacency, members: &[NodeIx]) -> Vec<(usize, usize)> {
    let mut edges = Vec::new();
    for (i, &ix) in members.iter().enumerate() {
        for nb in adjacency.neighbors(ix) {
            if let Ok(j) = members.binary_search(nb) {
                if i < j {
                    edges.push((i, j));
                }
            }
        }
    }
    edges
}

/// Sibling offset sequence 0, +1, -1, +2, -2, ...
fn fan(rank: usize) -> f64 {
    if rank == 0 {
        0.0
    } else if rank % 2 == 1 {
        rank.div_ceil(2) as f64
    } else {
        -((rank / 2) as f64)
    }
}

/// Deterministic starting positions.
///
/// Fixed members keep their position. The rest are reached breadth-first from
/// the fixed members (or from the first member, placed at the origin, when
/// nothing is fixed).
fn seed_positions(
    adjacency: &Adjacency,
    members: &[NodeIx],
    fixed_local: &[Option<Point>],
    k: f64,
) -> Vec<Point> {
    let n = members.len();
    let mut seeded: Vec<Option<Point>> = fixed_local.to_vec();
    let mut children = vec![0usize; n];
    let mut queue: VecDeque<usize> = (0..n).filter(|&i| seeded[i].is_some()).collect();

    if queue.is_empty() && n > 0 {
        seeded[0] = Some(Point::new(0.0, 0.0));
        queue.push_back(0);
    }

    while let Some(u) = queue.pop_front() {
        let Some(origin) = seeded[u] else { continue };
        for nb in adjacency.neighbors(members[u]) {
            let Ok(v) = members.binary_search(nb) else { continue };
            if seeded[v].is_some() {
                continue;
            }
            let dir = if adjacency.has_edge(members[u], members[v]) {
                1.0
            } else if adjacency.has_edge(members[v], members[u]) {
                -1.0
            } else {
                1.0
            };
            let offset = fan(children[u]) * k * 0.5;
            children[u] += 1;

            seeded[v] = Some(Point::new(origin.x + dir * k, origin.y + offset));
            queue.push_back(v);
        }
    }

    // Only reachable when the member list is not connected; keep those nodes
    // on a spiral around the origin rather than failing.
    seeded
        .into_iter()
        .enumerate()
        .map(|(i, p)| {
            p.unwrap_or_else(|| {
                let r = k * 0.5 * ((i + 1) as f64).sqrt();
                let a = i as f64 * GOLDEN_ANGLE;
                Point::new(r * a.cos(), r * a.sin())
            })
        })
        .collect()
}

/// Unit vector from `b` to `a` and their distance, clamped to `min_dist`.
/// Coincident nodes get a deterministic direction derived from their indices.
fn direction(a: Point, b: Point, i: usize, j: usize, min_dist: f64) -> (f64, f64, f64) {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let d = dx.hypot(dy);
    if d > 1e-9 {
        (dx / d, dy / d, d.max(min_dist))
    } else {
        let angle = (i * 31 + j * 17) as f64 * GOLDEN_ANGLE;
        (angle.cos(), angle.sin(), min_dist)
    }
}

/// Run the spring relaxation in place.
pub fn relax(
    positions: &mut [Point],
    movable: &[bool],
    edges: &[(usize, usize)],
    cfg: &LayoutConfig,
) -> RelaxStats {
    let n = positions.len();
    let free = movable.iter().filter(|&&m| m).count();
    if free == 0 {
        return RelaxStats { iterations: 0, converged: true };
    }

    let k = cfg.ideal_edge_length;
    let min_dist = k * 0.01;
    let mut temperature = k;
    let cooling = k / (cfg.max_iterations as f64 + 1.0);
    let mut disp = vec![(0.0f64, 0.0f64); n];

    for iteration in 0..cfg.max_iterations {
        disp.fill((0.0, 0.0));

        for i in 0..n {
            for j in (i + 1)..n {
                if !movable[i] && !movable[j] {
                    continue;
                }
                let (ux, uy, d) = direction(positions[i], positions[j], i, j, min_dist);
                let f = k * k / d;
                disp[i].0 += ux * f;
                disp[i].1 += uy * f;
                disp[j].0 -= ux * f;
                disp[j].1 -= uy * f;
            }
        }

        for &(i, j) in edges {
            let (ux, uy, d) = direction(positions[i], positions[j], i, j, min_dist);
            let f = d * d / k;
            disp[i].0 -= ux * f;
            disp[i].1 -= uy * f;
            disp[j].0 += ux * f;
            disp[j].1 += uy * f;
        }

        let mut moved = 0.0;
        for i in 0..n {
            if !movable[i] {
                continue;
            }
            let (dx, dy) = disp[i];
            let len = dx.hypot(dy);
            if !len.is_finite() || len <= f64::EPSILON {
                continue;
            }
            let step = len.min(temperature);
            positions[i].x += dx / len * step;
            positions[i].y += dy / len * step;
            moved += step;
        }
        temperature = (temperature - cooling).max(0.0);

        let mean_step = moved / free as f64;
        if mean_step < cfg.convergence_tolerance {
            trace!(iteration, mean_step, "relaxation converged");
            return RelaxStats { iterations: iteration + 1, converged: true };
        }
    }

    RelaxStats { iterations: cfg.max_iterations, converged: false }
}

/// Push free nodes off anything they overlap (footprint plus `overlap_gap`).
///
/// Each overlapping node jumps to the nearest side of the footprint it hits,
/// along the axis where the two centers are furthest apart.
pub fn separate(positions: &mut [Point], movable: &[bool], obstacles: &[Rect], cfg: &LayoutConfig) {
    let size = cfg.node_size;
    let gap = cfg.overlap_gap;
    let n = positions.len();

    for _pass in 0..SEPARATION_PASSES {
        let mut grid = SpatialGrid::new(size.w.max(size.h) + gap);
        for (i, &p) in positions.iter().enumerate() {
            grid.insert(i, Rect::footprint(p, size));
        }
        for (j, &r) in obstacles.iter().enumerate() {
            grid.insert(n + j, r);
        }

        let mut any_moved = false;
        for i in 0..n {
            if !movable[i] {
                continue;
            }
            let rect = Rect::footprint(positions[i], size).inflate(gap);
            let Some((_, other)) = grid.first_overlap(&rect, i) else { continue };

            let (cx, cy) = Rect::footprint(positions[i], size).center();
            let (ox, oy) = other.center();
            let (dx, dy) = (cx - ox, cy - oy);

            if dx.abs() > dy.abs() {
                positions[i].x = if dx >= 0.0 { other.right() + gap } else { other.x - size.w - gap };
            } else {
                positions[i].y = if dy >= 0.0 { other.bottom() + gap } else { other.y - size.h - gap };
            }
            any_moved = true;
        }

        if !any_moved {
            break;
        }
    }
}
