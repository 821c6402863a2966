//! Uniform grid on the XZ plane bucketing mesh triangles for point location.

use glam::Vec3;
use navmesh_common::{NavMesh, TriangleRef};
use std::collections::HashMap;

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

/// Triangles of a mesh snapshot bucketed by the cells their bounds cover
#[derive(Debug)]
pub struct TriangleGrid {
    cells: HashMap<GridCoord, Vec<TriangleRef>>,
    cell_size: f32,
}

impl TriangleGrid {
    pub fn build(nav_mesh: &NavMesh, cell_size: f32) -> Self {
        let mut grid = Self {
            cells: HashMap::new(),
            cell_size: cell_size.max(0.1),
        };
        for polygon in nav_mesh.polygons() {
            for index in 0..polygon.triangles().len() {
                let [a, b, c] = polygon.triangle_points(index);
                let min = GridCoord::from_world_pos(a.min(b).min(c), grid.cell_size);
                let max = GridCoord::from_world_pos(a.max(b).max(c), grid.cell_size);
                let reference = TriangleRef::new(polygon.id(), index);
                for x in min.x..=max.x {
                    for z in min.z..=max.z {
                        grid.cells.entry(GridCoord { x, z }).or_default().push(reference);
                    }
                }
            }
        }
        log::trace!(
            "Triangle grid: {} cells of size {}",
            grid.cells.len(),
            grid.cell_size
        );
        grid
    }

    /// Triangles whose bounds cover the cell of `point`
    pub fn candidates(&self, point: Vec3) -> &[TriangleRef] {
        self.cells
            .get(&GridCoord::from_world_pos(point, self.cell_size))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}
