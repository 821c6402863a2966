//! Named 2D polygon with holes, the operand type of the boolean operations.

use glam::Vec2;
use navmesh_common::{
    bounds_2d, is_clockwise, point_in_polygon_2d, signed_area, Error, PolygonSimplifier, Result,
};

/// Closed polygon on the walking plane.
///
/// The outline and every hole ring are clockwise. Holes must lie inside the
/// outline and must not overlap each other.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct CsgPolygon {
    name: String,
    points: Vec<Vec2>,
    holes: Vec<Vec<Vec2>>,
}

impl CsgPolygon {
    /// Creates a polygon from a clockwise outline
    pub fn new(name: impl Into<String>, points: Vec<Vec2>) -> Self {
        Self {
            name: name.into(),
            points,
            holes: Vec::new(),
        }
    }

    pub fn with_holes(name: impl Into<String>, points: Vec<Vec2>, holes: Vec<Vec<Vec2>>) -> Self {
        Self {
            name: name.into(),
            points,
            holes,
        }
    }

    /// Creates a polygon from an outline of any winding, fixing it to clockwise
    pub fn from_any_winding(name: impl Into<String>, mut points: Vec<Vec2>) -> Self {
        if !is_clockwise(&points) {
            points.reverse();
        }
        Self::new(name, points)
    }

    /// Axis-aligned rectangle spanning `min` to `max`
    pub fn rectangle(name: impl Into<String>, min: Vec2, max: Vec2) -> Self {
        Self::new(
            name,
            vec![
                Vec2::new(min.x, min.y),
                Vec2::new(min.x, max.y),
                Vec2::new(max.x, max.y),
                Vec2::new(max.x, min.y),
            ],
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Clockwise outline
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Clockwise hole rings
    pub fn holes(&self) -> &[Vec<Vec2>] {
        &self.holes
    }

    pub fn add_hole(&mut self, hole: Vec<Vec2>) {
        self.holes.push(hole);
    }

    pub fn is_empty(&self) -> bool {
        self.points.len() < 3
    }

    pub fn validate(&self) -> Result<()> {
        if self.points.len() < 3 {
            return Err(Error::InvalidInput(format!(
                "polygon '{}' has fewer than 3 points",
                self.name
            )));
        }
        if self.points.iter().any(|p| !p.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "polygon '{}' has non-finite points",
                self.name
            )));
        }
        if !is_clockwise(&self.points) {
            return Err(Error::InvalidInput(format!(
                "polygon '{}' outline is not clockwise",
                self.name
            )));
        }
        Ok(())
    }

    /// Enclosed area, holes excluded
    pub fn area(&self) -> f32 {
        let holes: f32 = self.holes.iter().map(|h| signed_area(h).abs()).sum();
        signed_area(&self.points).abs() - holes
    }

    /// Point strictly inside the outline and outside every hole (boundary is undefined)
    pub fn contains_point(&self, point: Vec2) -> bool {
        point_in_polygon_2d(point, &self.points)
            && !self.holes.iter().any(|h| point_in_polygon_2d(point, h))
    }

    pub fn bounding_box(&self) -> Option<(Vec2, Vec2)> {
        bounds_2d(&self.points)
    }

    /// Offsets the outline outwards by `distance` and shrinks the holes by the
    /// same amount. Corners use a miter join limited to twice the distance.
    pub fn expand(&self, distance: f32) -> CsgPolygon {
        if distance == 0.0 {
            return self.clone();
        }
        CsgPolygon {
            name: self.name.clone(),
            points: offset_ring(&self.points, distance),
            holes: self
                .holes
                .iter()
                .map(|hole| offset_ring(hole, -distance))
                .collect(),
        }
    }

    /// Simplifies the outline and the holes. A hole collapsing to nothing is
    /// dropped, an outline collapsing to nothing empties the polygon.
    pub fn simplify(&mut self, simplifier: &PolygonSimplifier) {
        self.points = simplifier.simplify(&self.points);
        if self.points.is_empty() {
            self.holes.clear();
            return;
        }
        self.holes = self
            .holes
            .iter()
            .map(|hole| simplifier.simplify(hole))
            .filter(|hole| !hole.is_empty())
            .collect();
    }

    /// Number of points over the outline and every hole
    pub fn total_points(&self) -> usize {
        self.points.len() + self.holes.iter().map(Vec::len).sum::<usize>()
    }
}

impl std::fmt::Display for CsgPolygon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} points, {} holes)",
            self.name,
            self.points.len(),
            self.holes.len()
        )
    }
}

/// Moves every point of a clockwise ring to its left (outwards) by `distance`.
fn offset_ring(ring: &[Vec2], distance: f32) -> Vec<Vec2> {
    let n = ring.len();
    if n < 3 {
        return ring.to_vec();
    }
    let max_miter = 2.0 * distance.abs();
    (0..n)
        .map(|i| {
            let prev = ring[(i + n - 1) % n];
            let current = ring[i];
            let next = ring[(i + 1) % n];
            let n1 = left_normal(current - prev);
            let n2 = left_normal(next - current);
            let sum = n1 + n2;
            let denom = 1.0 + n1.dot(n2);
            if denom <= 1e-6 || sum == Vec2::ZERO {
                return current + n1 * distance;
            }
            let offset = sum * (distance / denom);
            current + offset.clamp_length_max(max_miter)
        })
        .collect()
}

fn left_normal(direction: Vec2) -> Vec2 {
    Vec2::new(-direction.y, direction.x).normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use navmesh_common::SimplificationConfig;

    fn unit_square() -> CsgPolygon {
        CsgPolygon::rectangle("square", Vec2::ZERO, Vec2::ONE)
    }

    #[test]
    fn test_rectangle_is_clockwise() {
        let square = unit_square();
        assert!(square.validate().is_ok());
        assert!((square.area() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_from_any_winding() {
        let ccw = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
        ];
        let polygon = CsgPolygon::from_any_winding("tri", ccw);
        assert!(polygon.validate().is_ok());
        assert_eq!(polygon.points()[0], Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_contains_point_with_hole() {
        let mut polygon = CsgPolygon::rectangle("outer", Vec2::ZERO, Vec2::splat(4.0));
        polygon.add_hole(CsgPolygon::rectangle("hole", Vec2::ONE, Vec2::splat(3.0)).points().to_vec());

        assert!(polygon.contains_point(Vec2::new(0.5, 0.5)));
        assert!(!polygon.contains_point(Vec2::new(2.0, 2.0)));
        assert!(!polygon.contains_point(Vec2::new(5.0, 2.0)));
        assert!((polygon.area() - 12.0).abs() < 1e-5);
    }

    #[test]
    fn test_expand_square() {
        let expanded = unit_square().expand(0.5);
        let (min, max) = expanded.bounding_box().unwrap();
        assert!((min - Vec2::splat(-0.5)).length() < 1e-5);
        assert!((max - Vec2::splat(1.5)).length() < 1e-5);
        assert!(expanded.validate().is_ok());
    }

    #[test]
    fn test_expand_shrinks_holes() {
        let mut polygon = CsgPolygon::rectangle("outer", Vec2::ZERO, Vec2::splat(4.0));
        polygon.add_hole(CsgPolygon::rectangle("hole", Vec2::ONE, Vec2::splat(3.0)).points().to_vec());
        let expanded = polygon.expand(0.25);
        assert!((signed_area(&expanded.holes()[0]).abs() - 2.25).abs() < 1e-4);
    }

    #[test]
    fn test_simplify_drops_degenerate_hole() {
        let mut polygon = CsgPolygon::rectangle("outer", Vec2::ZERO, Vec2::splat(4.0));
        polygon.add_hole(vec![
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 1.001),
            Vec2::new(1.001, 1.0),
        ]);
        polygon.simplify(&PolygonSimplifier::new(SimplificationConfig::default()));
        assert_eq!(polygon.points().len(), 4);
        assert!(polygon.holes().is_empty());
    }

    #[test]
    fn test_validate_rejects_counter_clockwise() {
        let mut points = unit_square().points().to_vec();
        points.reverse();
        assert!(CsgPolygon::new("ccw", points).validate().is_err());
        assert!(CsgPolygon::new("line", vec![Vec2::ZERO, Vec2::ONE]).validate().is_err());
    }
}
