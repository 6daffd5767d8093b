// Spatial hash grid for overlap queries during separation.
//
// Items are node footprints tagged with a caller-chosen id, so a node can
// ask for its neighbours without finding itself.

use std::collections::{HashMap, HashSet};

use super::Rect;

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    /// Edge length of a square cell.
    cell_size: f64,
    cells: HashMap<(i64, i64), Vec<(usize, Rect)>>,
}

impl SpatialGrid {
    /// Cell size should be roughly the size of the largest item.
    pub fn new(cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 1.0 { cell_size } else { 1.0 };
        Self { cell_size, cells: HashMap::new() }
    }

    fn cell_range(&self, rect: &Rect) -> Vec<(i64, i64)> {
        let min_x = (rect.x / self.cell_size).floor() as i64;
        let max_x = (rect.right() / self.cell_size).floor() as i64;
        let min_y = (rect.y / self.cell_size).floor() as i64;
        let max_y = (rect.bottom() / self.cell_size).floor() as i64;

        let mut cells = Vec::new();
        for cx in min_x..=max_x {
            for cy in min_y..=max_y {
                cells.push((cx, cy));
            }
        }
        cells
    }

    pub fn insert(&mut self, id: usize, rect: Rect) {
        for cell in self.cell_range(&rect) {
            self.cells.entry(cell).or_default().push((id, rect));
        }
    }

    /// Items sharing a cell with `rect`, excluding `except`.
    /// May include items that do not actually overlap.
    pub fn query(&self, rect: &Rect, except: usize) -> Vec<(usize, Rect)> {
        let mut result = Vec::new();
        let mut seen = HashSet::new();

        for cell in self.cell_range(rect) {
            let Some(items) = self.cells.get(&cell) else { continue };
            for &(id, r) in items {
                if id != except && seen.insert(id) {
                    result.push((id, r));
                }
            }
        }
        result.sort_by_key(|&(id, _)| id);
        result
    }

    /// First item (lowest id) that really overlaps `rect`.
    pub fn first_overlap(&self, rect: &Rect, except: usize) -> Option<(usize, Rect)> {
        self.query(rect, except)
            .into_iter()
            .find(|(_, candidate)| rect.overlaps(candidate))
    }
}
