//! Triangulation of polygons with holes.
//!
//! The polygon is first split into Y-monotone polygons, then each monotone
//! polygon is triangulated with the stack based sweep of "Computational
//! Geometry: Algorithms and Applications", chapter 3. Triangles are
//! counter-clockwise on the walking plane.

use glam::{DVec2, Vec2, Vec3};
use navmesh_common::{NavLink, NavPolygonId, NavTriangle, TriangleRef};
use std::collections::HashMap;

use crate::monotone_polygon::{is_above, MonotonePolygon, MonotonePolygonAlgorithm};

/// Triangles with a doubled area below this are considered flat
const DEGENERATE_AREA: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
struct SidedPoint {
    index: usize,
    on_left: bool,
}

/// Triangulates a counter-clockwise outline and its clockwise holes
#[derive(Debug, Clone)]
pub struct TriangulationAlgorithm {
    points: Vec<Vec2>,
    end_contour_indices: Vec<usize>,
    contour_names: Vec<String>,
}

impl TriangulationAlgorithm {
    /// `ccw_points` must be unique and counter-clockwise
    pub fn new(ccw_points: Vec<Vec2>, name: impl Into<String>) -> Self {
        let end = ccw_points.len();
        Self {
            points: ccw_points,
            end_contour_indices: vec![end],
            contour_names: vec![name.into()],
        }
    }

    /// Adds a clockwise hole fully inside the outline, returns the hole index
    pub fn add_hole_points(&mut self, cw_hole_points: &[Vec2], name: impl Into<String>) -> usize {
        self.points.extend_from_slice(cw_hole_points);
        self.end_contour_indices.push(self.points.len());
        self.contour_names.push(name.into());
        self.end_contour_indices.len() - 2
    }

    pub fn hole_count(&self) -> usize {
        self.end_contour_indices.len() - 1
    }

    /// Outline points followed by the points of every hole
    pub fn all_points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn polygon_points(&self) -> &[Vec2] {
        &self.points[..self.end_contour_indices[0]]
    }

    pub fn hole_points(&self, hole: usize) -> &[Vec2] {
        &self.points[self.end_contour_indices[hole]..self.end_contour_indices[hole + 1]]
    }

    /// Counter-clockwise triangles indexing [`Self::all_points`]
    pub fn triangulate(&self) -> Vec<[usize; 3]> {
        let monotone_polygons =
            MonotonePolygonAlgorithm::new(&self.points, &self.end_contour_indices, &self.contour_names)
                .create_y_monotone_polygons();

        let mut triangles =
            Vec::with_capacity((self.points.len().saturating_sub(2)) + 2 * self.hole_count());
        for monotone_polygon in &monotone_polygons {
            self.triangulate_monotone_polygon(monotone_polygon, &mut triangles);
        }

        self.check_shared_edges(&monotone_polygons, &triangles);
        triangles
    }

    fn triangulate_monotone_polygon(&self, polygon: &MonotonePolygon, triangles: &mut Vec<[usize; 3]>) {
        let sorted = self.sorted_sided_points(polygon.ccw_points());
        if sorted.len() < 3 {
            return;
        }

        let mut stack: Vec<SidedPoint> = vec![sorted[0], sorted[1]];
        for j in 2..sorted.len() - 1 {
            let current = sorted[j];
            let top_on_left = stack.last().map_or(current.on_left, |p| p.on_left);

            if current.on_left != top_on_left {
                while stack.len() > 1 {
                    if let Some(top) = stack.pop() {
                        let top2 = stack[stack.len() - 1];
                        self.push_ccw_triangle(current.index, top.index, top2.index, triangles);
                    }
                }
                stack.clear();
                stack.push(sorted[j - 1]);
                stack.push(current);
            } else {
                while stack.len() > 1 {
                    let top = stack[stack.len() - 1];
                    let top2 = stack[stack.len() - 2];

                    let diagonal = self.point(top2.index) - self.point(current.index);
                    let stack_edge = self.point(top2.index) - self.point(top.index);
                    let orientation = diagonal.perp_dot(stack_edge);

                    if (orientation <= 0.0 && top.on_left) || (orientation >= 0.0 && !top.on_left) {
                        self.push_ccw_triangle(current.index, top2.index, top.index, triangles);
                        stack.pop();
                    } else {
                        break;
                    }
                }
                stack.push(current);
            }
        }

        let last = sorted[sorted.len() - 1];
        while stack.len() > 1 {
            if let Some(top) = stack.pop() {
                let top2 = stack[stack.len() - 1];
                self.push_ccw_triangle(last.index, top2.index, top.index, triangles);
            }
        }
    }

    fn sorted_sided_points(&self, ccw_points: &[usize]) -> Vec<SidedPoint> {
        let mut sided: Vec<SidedPoint> = ccw_points
            .iter()
            .enumerate()
            .map(|(i, &index)| {
                let next = ccw_points[(i + 1) % ccw_points.len()];
                SidedPoint {
                    index,
                    on_left: is_above(self.points[index], self.points[next]),
                }
            })
            .collect();
        sided.sort_by(|l, r| {
            if l.index == r.index {
                std::cmp::Ordering::Equal
            } else if is_above(self.points[l.index], self.points[r.index]) {
                std::cmp::Ordering::Less
            } else {
                std::cmp::Ordering::Greater
            }
        });
        sided
    }

    fn point(&self, index: usize) -> DVec2 {
        self.points[index].as_dvec2()
    }

    fn push_ccw_triangle(&self, i1: usize, i2: usize, i3: usize, triangles: &mut Vec<[usize; 3]>) {
        let v1 = self.point(i2) - self.point(i1);
        let v2 = self.point(i3) - self.point(i2);
        let cross = v1.perp_dot(v2);
        if cross.abs() <= DEGENERATE_AREA {
            log::warn!(
                "Triangulation of {}: skipped flat triangle ({:?}, {:?}, {:?})",
                self.contour_names[0],
                self.points[i1],
                self.points[i2],
                self.points[i3]
            );
            return;
        }
        if cross > 0.0 {
            triangles.push([i1, i2, i3]);
        } else {
            triangles.push([i2, i1, i3]);
        }
    }

    fn check_shared_edges(&self, monotone_polygons: &[MonotonePolygon], triangles: &[[usize; 3]]) {
        if monotone_polygons.len() < 2 {
            return;
        }
        let counts = edge_counts(triangles);
        let missing = monotone_polygons
            .iter()
            .flat_map(|p| p.shared_edges().iter())
            .filter(|edge| counts.get(edge).copied().unwrap_or(0) < 2)
            .count();
        if missing > 0 {
            log::warn!(
                "Triangulation of {}: {} missing neighbors between monotone polygons",
                self.contour_names[0],
                missing
            );
        }
    }
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

fn edge_counts(triangles: &[[usize; 3]]) -> HashMap<(usize, usize), usize> {
    let mut counts = HashMap::new();
    for triangle in triangles {
        for edge in 0..3 {
            *counts
                .entry(edge_key(triangle[edge], triangle[(edge + 1) % 3]))
                .or_insert(0) += 1;
        }
    }
    counts
}

/// Builds navigation triangles and links every pair of triangles sharing an
/// edge with a direct link.
pub fn build_nav_triangles(
    polygon: NavPolygonId,
    triangles: &[[usize; 3]],
    points: &[Vec3],
) -> Vec<NavTriangle> {
    let mut nav_triangles: Vec<NavTriangle> = triangles
        .iter()
        .map(|&indices| NavTriangle::new(indices, points))
        .collect();

    let mut open_edges: HashMap<(usize, usize), (usize, usize)> = HashMap::new();
    for (triangle_index, triangle) in triangles.iter().enumerate() {
        for edge in 0..3 {
            let key = edge_key(triangle[edge], triangle[(edge + 1) % 3]);
            match open_edges.remove(&key) {
                Some((other_triangle, other_edge)) => {
                    nav_triangles[triangle_index].set_link(NavLink::direct(
                        edge,
                        TriangleRef::new(polygon, other_triangle),
                        other_edge,
                    ));
                    nav_triangles[other_triangle].set_link(NavLink::direct(
                        other_edge,
                        TriangleRef::new(polygon, triangle_index),
                        edge,
                    ));
                }
                None => {
                    open_edges.insert(key, (triangle_index, edge));
                }
            }
        }
    }
    nav_triangles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_ccw(points: &[Vec2], triangles: &[[usize; 3]]) {
        for t in triangles {
            let area = navmesh_common::tri_area_2d(points[t[0]], points[t[1]], points[t[2]]);
            assert!(area > 0.0, "triangle {:?} is not counter-clockwise", t);
        }
    }

    #[test]
    fn test_triangulate_square() {
        let algorithm = TriangulationAlgorithm::new(
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.0, 1.0),
            ],
            "square",
        );
        let triangles = algorithm.triangulate();
        assert_eq!(triangles.len(), 2);
        assert_ccw(algorithm.all_points(), &triangles);
    }

    #[test]
    fn test_triangulate_concave() {
        let algorithm = TriangulationAlgorithm::new(
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(4.0, 0.0),
                Vec2::new(4.0, 4.0),
                Vec2::new(2.0, 3.0),
                Vec2::new(0.0, 4.0),
            ],
            "m",
        );
        let triangles = algorithm.triangulate();
        assert_eq!(triangles.len(), 3);
        assert_ccw(algorithm.all_points(), &triangles);
    }

    #[test]
    fn test_triangulate_with_hole() {
        let mut algorithm = TriangulationAlgorithm::new(
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(4.0, 0.0),
                Vec2::new(4.0, 4.0),
                Vec2::new(0.0, 4.0),
            ],
            "square",
        );
        let hole = algorithm.add_hole_points(
            &[
                Vec2::new(1.0, 1.0),
                Vec2::new(1.0, 3.0),
                Vec2::new(3.0, 3.0),
                Vec2::new(3.0, 1.0),
            ],
            "hole",
        );
        assert_eq!(hole, 0);
        assert_eq!(algorithm.hole_count(), 1);
        assert_eq!(algorithm.hole_points(0)[0], Vec2::new(1.0, 1.0));

        let triangles = algorithm.triangulate();
        assert_eq!(triangles.len(), 8 - 2 + 2);
        assert_ccw(algorithm.all_points(), &triangles);

        let area: f32 = triangles
            .iter()
            .map(|t| {
                let p = algorithm.all_points();
                navmesh_common::tri_area_2d(p[t[0]], p[t[1]], p[t[2]]) * 0.5
            })
            .sum();
        assert!((area - 12.0).abs() < 1e-4);
    }

    #[test]
    fn test_build_nav_triangles_links_shared_edges() {
        let points2d = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(0.0, 4.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 3.0),
            Vec2::new(3.0, 3.0),
            Vec2::new(3.0, 1.0),
        ];
        let mut algorithm = TriangulationAlgorithm::new(points2d[..4].to_vec(), "square");
        algorithm.add_hole_points(&points2d[4..], "hole");
        let triangles = algorithm.triangulate();

        let points: Vec<Vec3> = points2d.iter().map(|p| navmesh_common::from_plane(*p, 0.0)).collect();
        let nav_triangles = build_nav_triangles(NavPolygonId(1), &triangles, &points);

        // a ring of 8 triangles: each one has exactly two neighbours
        for triangle in &nav_triangles {
            assert_eq!(triangle.links().count(), 2);
        }
        for (index, triangle) in nav_triangles.iter().enumerate() {
            for link in triangle.links() {
                let target = &nav_triangles[link.target.triangle];
                let back = target.link(link.target_edge).unwrap();
                assert_eq!(back.target.triangle, index);
                assert_eq!(back.target_edge, link.source_edge);
            }
        }
    }

    #[test]
    fn test_flat_triangle_is_skipped() {
        let algorithm = TriangulationAlgorithm::new(
            vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0)],
            "flat",
        );
        assert!(algorithm.triangulate().is_empty());
    }
}
