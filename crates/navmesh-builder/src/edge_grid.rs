//! Uniform grid on the XZ plane used to find edges close to each other.

use glam::Vec3;
use std::collections::HashMap;

/// Grid cell coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct GridCoord {
    x: i32,
    z: i32,
}

impl GridCoord {
    fn from_world_pos(pos: Vec3, cell_size: f32) -> Self {
        Self {
            x: (pos.x / cell_size).floor() as i32,
            z: (pos.z / cell_size).floor() as i32,
        }
    }
}

/// Buckets items by the cells their (padded) bounds cover
#[derive(Debug)]
pub struct EdgeGrid {
    cells: HashMap<GridCoord, Vec<usize>>,
    cell_size: f32,
    padding: f32,
}

impl EdgeGrid {
    /// `padding` enlarges every inserted and queried bounds
    pub fn new(cell_size: f32, padding: f32) -> Self {
        Self {
            cells: HashMap::new(),
            cell_size: cell_size.max(0.1),
            padding: padding.max(0.0),
        }
    }

    fn covered_cells(&self, a: Vec3, b: Vec3) -> impl Iterator<Item = GridCoord> {
        let min = a.min(b) - Vec3::splat(self.padding);
        let max = a.max(b) + Vec3::splat(self.padding);
        let min = GridCoord::from_world_pos(min, self.cell_size);
        let max = GridCoord::from_world_pos(max, self.cell_size);
        (min.x..=max.x).flat_map(move |x| (min.z..=max.z).map(move |z| GridCoord { x, z }))
    }

    /// Registers the segment `a-b` under `id`
    pub fn insert(&mut self, id: usize, a: Vec3, b: Vec3) {
        let coords: Vec<GridCoord> = self.covered_cells(a, b).collect();
        for coord in coords {
            self.cells.entry(coord).or_default().push(id);
        }
    }

    /// Ids of the segments sharing at least one cell with `a-b`, sorted and unique
    pub fn query(&self, a: Vec3, b: Vec3) -> Vec<usize> {
        let mut result: Vec<usize> = self
            .covered_cells(a, b)
            .filter_map(|coord| self.cells.get(&coord))
            .flatten()
            .copied()
            .collect();
        result.sort_unstable();
        result.dedup();
        result
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_finds_nearby_segments() {
        let mut grid = EdgeGrid::new(4.0, 1.0);
        grid.insert(0, Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        grid.insert(1, Vec3::new(0.0, 0.0, 1.0), Vec3::new(2.0, 0.0, 1.0));
        grid.insert(2, Vec3::new(50.0, 0.0, 50.0), Vec3::new(52.0, 0.0, 50.0));

        let near = grid.query(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(near, vec![0, 1]);

        let far = grid.query(Vec3::new(51.0, 0.0, 51.0), Vec3::new(51.0, 0.0, 52.0));
        assert_eq!(far, vec![2]);
    }

    #[test]
    fn test_segment_spanning_cells() {
        let mut grid = EdgeGrid::new(1.0, 0.0);
        grid.insert(7, Vec3::new(0.5, 0.0, 0.5), Vec3::new(3.5, 0.0, 0.5));
        assert_eq!(grid.cell_count(), 4);
        assert_eq!(grid.query(Vec3::new(2.5, 0.0, 0.5), Vec3::new(2.6, 0.0, 0.6)), vec![7]);
    }
}
