//! Detection of a link between two boundary edges.
//!
//! Both edges must belong to polygons wound counter-clockwise seen from
//! above, so an edge `(A, B)` has the outside of its polygon on the
//! `(-ab.z, ab.x)` side.

use glam::{Vec2, Vec3};
use navmesh_common::{closest_point_on_segment, v_equal, NavLinkConstraint};

use crate::config::EdgeLinkConfig;

/// Squared distance under which two points or a point and a line coincide
const COINCIDENT_EPSILON_SQ: f32 = 0.0001;

/// Margin on per-axis overlap of collinear edges
const OVERLAP_EPSILON: f32 = 0.0001;

/// Outcome of comparing a start edge with an end edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeLinkResult {
    None,
    /// The edges overlap: walking from the start edge enters the end polygon
    Direct(NavLinkConstraint),
    /// The edges face each other across a gap the agent can jump
    Jump(NavLinkConstraint),
}

impl EdgeLinkResult {
    pub fn has_link(&self) -> bool {
        !matches!(self, EdgeLinkResult::None)
    }

    pub fn constraint(&self) -> Option<NavLinkConstraint> {
        match self {
            EdgeLinkResult::None => None,
            EdgeLinkResult::Direct(constraint) | EdgeLinkResult::Jump(constraint) => {
                Some(*constraint)
            }
        }
    }
}

/// Detects direct and jump links between pairs of edges
#[derive(Debug, Clone)]
pub struct EdgeLinkDetection {
    config: EdgeLinkConfig,
}

impl EdgeLinkDetection {
    pub fn new(config: EdgeLinkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EdgeLinkConfig {
        &self.config
    }

    /// Detects a link usable to move from `start` into the polygon of `end`.
    ///
    /// The constraint ranges of the result are expressed on the start edge.
    pub fn detect_link(&self, start: (Vec3, Vec3), end: (Vec3, Vec3)) -> EdgeLinkResult {
        let (start_a, start_b) = start;
        let (end_a, end_b) = end;
        if v_equal(start_a, start_b, COINCIDENT_EPSILON_SQ) {
            return EdgeLinkResult::None;
        }

        let max_distance = self.config.jump_max_distance.max(OVERLAP_EPSILON);
        if line_distance(start_a, start_b, end_a, end_b) > max_distance {
            return EdgeLinkResult::None;
        }

        if v_equal(start_a, end_b, COINCIDENT_EPSILON_SQ) && v_equal(start_b, end_a, COINCIDENT_EPSILON_SQ) {
            return EdgeLinkResult::Direct(NavLinkConstraint::full());
        }

        if is_collinear(start, end) {
            return match self.collinear_overlap(start, end) {
                Some(constraint) if (start_b - start_a).dot(end_b - end_a) < 0.0 => {
                    EdgeLinkResult::Direct(constraint)
                }
                _ => EdgeLinkResult::None,
            };
        }

        self.detect_jump(start, end)
    }

    /// Overlap of two collinear edges as a range on the start edge
    fn collinear_overlap(&self, start: (Vec3, Vec3), end: (Vec3, Vec3)) -> Option<NavLinkConstraint> {
        let (a, b) = start;
        let min = a.min(b).max(end.0.min(end.1));
        let max = a.max(b).min(end.0.max(end.1));
        if (0..3).any(|axis| min[axis] > max[axis] + OVERLAP_EPSILON) {
            return None;
        }

        let axis = (0..3).find(|&axis| (a[axis] - b[axis]).abs() > f32::EPSILON)?;
        let denominator = a[axis] - b[axis];
        let mut start_range = (min[axis] - b[axis]) / denominator;
        let mut end_range = (max[axis] - b[axis]) / denominator;
        if start_range < end_range {
            std::mem::swap(&mut start_range, &mut end_range);
        }

        if self.is_range_too_small(start_range, end_range, start) {
            return None;
        }
        debug_assert!(start_range > -OVERLAP_EPSILON && start_range < 1.0 + OVERLAP_EPSILON);
        debug_assert!(end_range > -OVERLAP_EPSILON && end_range < 1.0 + OVERLAP_EPSILON);
        Some(NavLinkConstraint::new(
            start_range.clamp(0.0, 1.0),
            end_range.clamp(0.0, 1.0),
        ))
    }

    fn detect_jump(&self, start: (Vec3, Vec3), end: (Vec3, Vec3)) -> EdgeLinkResult {
        if self.config.jump_max_distance <= 0.0 {
            return EdgeLinkResult::None;
        }

        let start_xz = xz(start.1 - start.0);
        let end_xz = xz(end.1 - end.0);
        let (Some(start_dir), Some(end_dir)) = (start_xz.try_normalize(), end_xz.try_normalize()) else {
            return EdgeLinkResult::None;
        };
        if start_dir.dot(end_dir).abs() < self.config.parallel_tolerance_cos {
            return EdgeLinkResult::None;
        }
        let start_normal = Vec2::new(-start_dir.y, start_dir.x);
        let end_normal = Vec2::new(-end_dir.y, end_dir.x);

        let edge_length = (start.1 - start.0).length();
        let samples = 1 + (edge_length / self.config.sample_spacing).ceil() as usize;
        let max_distance_sq = self.config.jump_max_distance * self.config.jump_max_distance;

        let mut range: Option<(f32, f32)> = None;
        for i in 0..samples {
            let alpha = i as f32 / (samples - 1) as f32;
            let sample = NavLinkConstraint::point_at(alpha, start.0, start.1);
            let landing = closest_point_on_segment(sample, end.0, end.1);

            let jump = xz(landing - sample);
            let distance_sq = jump.length_squared();
            if distance_sq >= max_distance_sq
                || distance_sq <= f32::EPSILON
                || (landing.y - sample.y).abs() > self.config.jump_max_height
            {
                continue;
            }

            let direction = jump / distance_sq.sqrt();
            let leaves_start = start_normal.dot(direction) >= self.config.field_of_view_cos;
            let enters_end = end_normal.dot(direction) < -self.config.field_of_view_cos;
            if leaves_start && enters_end {
                range = Some(match range {
                    Some((max_alpha, min_alpha)) => (max_alpha.max(alpha), min_alpha.min(alpha)),
                    None => (alpha, alpha),
                });
            }
        }

        match range {
            Some((start_range, end_range)) if !self.is_range_too_small(start_range, end_range, start) => {
                EdgeLinkResult::Jump(NavLinkConstraint::new(start_range, end_range))
            }
            _ => EdgeLinkResult::None,
        }
    }

    fn is_range_too_small(&self, start_range: f32, end_range: f32, start: (Vec3, Vec3)) -> bool {
        let from = NavLinkConstraint::point_at(start_range, start.0, start.1);
        let to = NavLinkConstraint::point_at(end_range, start.0, start.1);
        from.distance_squared(to) < self.config.min_link_length_sq
    }
}

#[inline]
fn xz(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

/// Squared distance from `p` to the infinite line through `a` with direction `dir`
fn point_line_distance_sq(p: Vec3, a: Vec3, dir: Vec3) -> f32 {
    let len_sq = dir.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance_squared(a);
    }
    let t = (p - a).dot(dir) / len_sq;
    p.distance_squared(a + dir * t)
}

/// Minimum distance between the infinite lines through both edges
fn line_distance(a0: Vec3, a1: Vec3, b0: Vec3, b1: Vec3) -> f32 {
    let d1 = a1 - a0;
    let d2 = b1 - b0;
    let normal = d1.cross(d2);
    let normal_len_sq = normal.length_squared();
    if normal_len_sq <= 1e-12 * d1.length_squared() * d2.length_squared() {
        return point_line_distance_sq(b0, a0, d1).sqrt();
    }
    (b0 - a0).dot(normal).abs() / normal_len_sq.sqrt()
}

fn is_collinear(start: (Vec3, Vec3), end: (Vec3, Vec3)) -> bool {
    let dir = start.1 - start.0;
    point_line_distance_sq(end.0, start.0, dir) < COINCIDENT_EPSILON_SQ
        && point_line_distance_sq(end.1, start.0, dir) < COINCIDENT_EPSILON_SQ
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection() -> EdgeLinkDetection {
        EdgeLinkDetection::new(EdgeLinkConfig::new(1.5, 0.5))
    }

    fn edge(a: (f32, f32, f32), b: (f32, f32, f32)) -> (Vec3, Vec3) {
        (Vec3::new(a.0, a.1, a.2), Vec3::new(b.0, b.1, b.2))
    }

    fn assert_range(result: EdgeLinkResult, start_range: f32, end_range: f32) {
        let constraint = result.constraint().expect("expected a link");
        assert!((constraint.start_range - start_range).abs() < 1e-3, "{:?}", constraint);
        assert!((constraint.end_range - end_range).abs() < 1e-3, "{:?}", constraint);
    }

    #[test]
    fn test_jump_between_parallel_edges() {
        let result = detection().detect_link(
            edge((-5.0, 0.0, 0.0), (5.0, 0.0, 0.0)),
            edge((20.0, 0.0, 1.0), (-20.0, 0.0, 1.0)),
        );
        assert!(matches!(result, EdgeLinkResult::Jump(_)));
        assert_range(result, 1.0, 0.0);
    }

    #[test]
    fn test_jump_too_far() {
        let result = detection().detect_link(
            edge((-5.0, 0.0, 0.0), (5.0, 0.0, 0.0)),
            edge((20.0, 0.0, 50.0), (-20.0, 0.0, 50.0)),
        );
        assert_eq!(result, EdgeLinkResult::None);
    }

    #[test]
    fn test_jump_too_high() {
        let result = detection().detect_link(
            edge((-5.0, 0.0, 0.0), (5.0, 0.0, 0.0)),
            edge((20.0, 1.0, 1.0), (-20.0, 1.0, 1.0)),
        );
        assert_eq!(result, EdgeLinkResult::None);
    }

    #[test]
    fn test_jump_partial_overlap() {
        // Samples past x = 3 are out of reach of the end edge
        let result = detection().detect_link(
            edge((0.0, 0.0, 0.0), (4.0, 0.0, 0.0)),
            edge((2.0, 0.0, 1.0), (-5.0, 0.0, 1.0)),
        );
        assert!(matches!(result, EdgeLinkResult::Jump(_)));
        assert_range(result, 1.0, 0.25);
    }

    #[test]
    fn test_jump_between_nearly_parallel_edges() {
        // About 14 degrees apart, within the parallel tolerance
        let result = detection().detect_link(
            edge((-5.0, 0.0, 0.0), (5.0, 0.0, 0.0)),
            edge((1.0, 0.0, 1.0), (-1.0, 0.0, 0.5)),
        );
        assert!(matches!(result, EdgeLinkResult::Jump(_)));
    }

    #[test]
    fn test_jump_rejects_non_parallel_edges() {
        let result = detection().detect_link(
            edge((-5.0, 0.0, 0.0), (5.0, 0.0, 0.0)),
            edge((0.5, 0.0, 1.0), (0.0, 0.0, 0.2)),
        );
        assert_eq!(result, EdgeLinkResult::None);
    }

    #[test]
    fn test_jump_wrong_start_direction() {
        let result = detection().detect_link(
            edge((5.0, 0.0, 0.0), (-5.0, 0.0, 0.0)),
            edge((20.0, 0.0, 1.0), (-20.0, 0.0, 1.0)),
        );
        assert_eq!(result, EdgeLinkResult::None);
    }

    #[test]
    fn test_jump_wrong_end_direction() {
        let result = detection().detect_link(
            edge((-5.0, 0.0, 0.0), (5.0, 0.0, 0.0)),
            edge((-20.0, 0.0, 1.0), (20.0, 0.0, 1.0)),
        );
        assert_eq!(result, EdgeLinkResult::None);
    }

    #[test]
    fn test_jump_both_directions_wrong() {
        let result = detection().detect_link(
            edge((5.0, 0.0, 0.0), (-5.0, 0.0, 0.0)),
            edge((-20.0, 0.0, 1.0), (20.0, 0.0, 1.0)),
        );
        assert_eq!(result, EdgeLinkResult::None);
    }

    #[test]
    fn test_jump_disabled() {
        let detection = EdgeLinkDetection::new(EdgeLinkConfig::new(0.0, 0.0));
        let jump = detection.detect_link(
            edge((-5.0, 0.0, 0.0), (5.0, 0.0, 0.0)),
            edge((20.0, 0.0, 1.0), (-20.0, 0.0, 1.0)),
        );
        assert_eq!(jump, EdgeLinkResult::None);

        let direct = detection.detect_link(
            edge((0.0, 0.0, 0.0), (3.0, 0.0, 0.0)),
            edge((3.0, 0.0, 0.0), (0.0, 0.0, 0.0)),
        );
        assert_eq!(direct, EdgeLinkResult::Direct(NavLinkConstraint::full()));
    }

    #[test]
    fn test_identical_edges() {
        let result = detection().detect_link(
            edge((0.0, 0.0, 0.0), (3.0, 0.0, 0.0)),
            edge((3.0, 0.0, 0.0), (0.0, 0.0, 0.0)),
        );
        assert_eq!(result, EdgeLinkResult::Direct(NavLinkConstraint::full()));

        let same_direction = detection().detect_link(
            edge((0.0, 0.0, 0.0), (3.0, 0.0, 0.0)),
            edge((0.0, 0.0, 0.0), (3.0, 0.0, 0.0)),
        );
        assert_eq!(same_direction, EdgeLinkResult::None);
    }

    #[test]
    fn test_collinear_edge_inside() {
        let result = detection().detect_link(
            edge((0.0, 0.0, 0.0), (3.0, 0.0, 0.0)),
            edge((2.0, 0.0, 0.0), (1.0, 0.0, 0.0)),
        );
        assert!(matches!(result, EdgeLinkResult::Direct(_)));
        assert_range(result, 2.0 / 3.0, 1.0 / 3.0);
    }

    #[test]
    fn test_collinear_diagonal_edges() {
        let result = detection().detect_link(
            edge((0.0, 0.0, 0.0), (3.0, 0.0, -1.0)),
            edge((6.0, 0.0, -2.0), (1.5, 0.0, -0.5)),
        );
        assert!(matches!(result, EdgeLinkResult::Direct(_)));
        assert_range(result, 0.5, 0.0);
    }

    #[test]
    fn test_collinear_edges_partially_overlapping() {
        let result = detection().detect_link(
            edge((-50.0, 0.0, 0.0), (-100.0, 0.0, 0.0)),
            edge((-150.0, 0.0, 0.0), (-99.0, 0.0, 0.0)),
        );
        assert!(matches!(result, EdgeLinkResult::Direct(_)));
        assert_range(result, 0.02, 0.0);
    }

    #[test]
    fn test_collinear_edges_apart() {
        let result = detection().detect_link(
            edge((0.0, 0.0, 0.0), (1.0, 0.0, 0.0)),
            edge((5.0, 0.0, 0.0), (4.0, 0.0, 0.0)),
        );
        assert_eq!(result, EdgeLinkResult::None);
    }

    #[test]
    fn test_collinear_edges_touching_at_one_point() {
        let result = detection().detect_link(
            edge((-50.0, 0.0, 0.0), (-100.0, 0.0, 0.0)),
            edge((-150.0, 0.0, 0.0), (-100.0, 0.0, 0.0)),
        );
        assert_eq!(result, EdgeLinkResult::None);
    }

    #[test]
    fn test_collinear_edges_same_direction() {
        let result = detection().detect_link(
            edge((0.0, 0.0, 0.0), (3.0, 0.0, 0.0)),
            edge((1.0, 0.0, 0.0), (2.0, 0.0, 0.0)),
        );
        assert_eq!(result, EdgeLinkResult::None);
    }
}
