//! 2D geometry operations on the walking plane.
//!
//! The world is Y-up. Points are flattened onto the walking plane with
//! [`to_plane`], which maps `(x, y, z)` to `(x, -z)` so that counter-clockwise
//! on the plane is counter-clockwise when looking down the Y axis.

use glam::{DVec2, Vec2, Vec3};

/// Flattens a 3D point onto the walking plane.
#[inline]
pub fn to_plane(p: Vec3) -> Vec2 {
    Vec2::new(p.x, -p.z)
}

/// Lifts a plane point back to 3D at the given height.
#[inline]
pub fn from_plane(p: Vec2, height: f32) -> Vec3 {
    Vec3::new(p.x, height, -p.y)
}

/// Twice the signed area of the triangle `abc` on the plane.
///
/// - Positive: counter-clockwise
/// - Negative: clockwise
/// - Zero: degenerate (collinear points)
#[inline]
pub fn tri_area_2d(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a)
}

/// Signed area of a closed ring (positive when counter-clockwise).
pub fn signed_area(ring: &[Vec2]) -> f32 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut area = 0.0f64;
    let mut prev = ring[ring.len() - 1];
    for &p in ring {
        area += prev.x as f64 * p.y as f64 - p.x as f64 * prev.y as f64;
        prev = p;
    }
    (area * 0.5) as f32
}

/// Check if a ring is wound clockwise on the plane.
#[inline]
pub fn is_clockwise(ring: &[Vec2]) -> bool {
    signed_area(ring) < 0.0
}

/// Even-odd point in polygon test on the plane.
///
/// Points exactly on the boundary may be reported either way, use
/// [`dist_point_segment_sqr_2d`] when the boundary matters.
pub fn point_in_polygon_2d(point: Vec2, ring: &[Vec2]) -> bool {
    let mut inside = false;
    let n = ring.len();
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let pi = ring[i];
        let pj = ring[j];
        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Squared distance from a point to the segment `ab` on the plane.
pub fn dist_point_segment_sqr_2d(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    p.distance_squared(closest_point_on_segment_2d(p, a, b))
}

/// Closest point to `p` on the segment `ab` on the plane.
pub fn closest_point_on_segment_2d(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Closest point to `p` on the 3D segment `ab`.
pub fn closest_point_on_segment(p: Vec3, a: Vec3, b: Vec3) -> Vec3 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Result of intersecting two segments in double precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentIntersection {
    None,
    /// Proper or endpoint crossing at parameter `t` of the first segment and `u` of the second
    Point { point: DVec2, t: f64, u: f64 },
    /// Segments lie on the same line
    Collinear,
}

/// Intersects `p -> p2` with `q -> q2`.
///
/// Parameters within `eps` outside `[0, 1]` are still reported so that
/// touching endpoints are not lost to rounding.
pub fn intersect_segments_2d(p: DVec2, p2: DVec2, q: DVec2, q2: DVec2, eps: f64) -> SegmentIntersection {
    let r = p2 - p;
    let s = q2 - q;
    let denom = r.perp_dot(s);
    let qp = q - p;

    let scale = r.length() * s.length();
    if denom.abs() <= eps * scale.max(f64::MIN_POSITIVE) {
        if qp.perp_dot(r).abs() <= eps * r.length().max(f64::MIN_POSITIVE) {
            return SegmentIntersection::Collinear;
        }
        return SegmentIntersection::None;
    }

    let t = qp.perp_dot(s) / denom;
    let u = qp.perp_dot(r) / denom;
    if t < -eps || t > 1.0 + eps || u < -eps || u > 1.0 + eps {
        return SegmentIntersection::None;
    }
    SegmentIntersection::Point {
        point: p + r * t.clamp(0.0, 1.0),
        t: t.clamp(0.0, 1.0),
        u: u.clamp(0.0, 1.0),
    }
}

/// Sign-based point in triangle test on the XZ plane (boundary counts as inside).
pub fn point_in_triangle_xz(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> bool {
    fn sign(p1: Vec3, p2: Vec3, p3: Vec3) -> f32 {
        (p1.x - p3.x) * (p2.z - p3.z) - (p2.x - p3.x) * (p1.z - p3.z)
    }
    let d1 = sign(p, a, b);
    let d2 = sign(p, b, c);
    let d3 = sign(p, c, a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Interpolates the height of the triangle `abc` at the XZ location of `p`.
pub fn triangle_height_at(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> f32 {
    let v0 = Vec2::new(b.x - a.x, b.z - a.z);
    let v1 = Vec2::new(c.x - a.x, c.z - a.z);
    let v2 = Vec2::new(p.x - a.x, p.z - a.z);
    let denom = v0.perp_dot(v1);
    if denom.abs() <= f32::EPSILON {
        return (a.y + b.y + c.y) / 3.0;
    }
    let v = v2.perp_dot(v1) / denom;
    let w = v0.perp_dot(v2) / denom;
    a.y + v * (b.y - a.y) + w * (c.y - a.y)
}

/// Axis-aligned bounds of a set of plane points, `None` when empty.
pub fn bounds_2d(points: &[Vec2]) -> Option<(Vec2, Vec2)> {
    let first = *points.first()?;
    Some(
        points
            .iter()
            .fold((first, first), |(min, max), &p| (min.min(p), max.max(p))),
    )
}

/// Check if two 2D axis-aligned bounding boxes overlap.
#[inline]
pub fn overlap_bounds_2d(amin: Vec2, amax: Vec2, bmin: Vec2, bmax: Vec2) -> bool {
    amin.x <= bmax.x && amax.x >= bmin.x && amin.y <= bmax.y && amax.y >= bmin.y
}

/// Squared distance between two points on the XZ plane.
#[inline]
pub fn dist_sqr_2d_vec3(a: Vec3, b: Vec3) -> f32 {
    let dx = b.x - a.x;
    let dz = b.z - a.z;
    dx * dx + dz * dz
}

/// Check if two 3D points are equal within a squared tolerance.
#[inline]
pub fn v_equal(a: Vec3, b: Vec3, eps_sq: f32) -> bool {
    a.distance_squared(b) < eps_sq
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
        ]
    }

    #[test]
    fn test_plane_mapping() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(to_plane(p), Vec2::new(1.0, -3.0));
        assert_eq!(from_plane(to_plane(p), 2.0), p);
    }

    #[test]
    fn test_tri_area_2d() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(1.0, 0.0);
        let c = Vec2::new(0.0, 1.0);
        assert!(tri_area_2d(a, b, c) > 0.0);
        assert!(tri_area_2d(a, c, b) < 0.0);
        assert_eq!(tri_area_2d(a, b, Vec2::new(2.0, 0.0)), 0.0);
    }

    #[test]
    fn test_signed_area_orientation() {
        let cw = square();
        assert!(is_clockwise(&cw));
        assert!((signed_area(&cw) + 1.0).abs() < 1e-6);

        let ccw: Vec<Vec2> = cw.iter().rev().copied().collect();
        assert!(!is_clockwise(&ccw));
    }

    #[test]
    fn test_point_in_polygon_2d() {
        let ring = square();
        assert!(point_in_polygon_2d(Vec2::new(0.5, 0.5), &ring));
        assert!(!point_in_polygon_2d(Vec2::new(1.5, 0.5), &ring));
        assert!(!point_in_polygon_2d(Vec2::new(0.5, -0.1), &ring));
    }

    #[test]
    fn test_dist_point_segment() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(2.0, 0.0);
        assert!((dist_point_segment_sqr_2d(Vec2::new(1.0, 1.0), a, b) - 1.0).abs() < 1e-6);
        assert!((dist_point_segment_sqr_2d(Vec2::new(3.0, 0.0), a, b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_intersect_segments_crossing() {
        let result = intersect_segments_2d(
            DVec2::new(0.0, 0.0),
            DVec2::new(2.0, 2.0),
            DVec2::new(0.0, 2.0),
            DVec2::new(2.0, 0.0),
            1e-9,
        );
        match result {
            SegmentIntersection::Point { point, t, u } => {
                assert!((point - DVec2::new(1.0, 1.0)).length() < 1e-9);
                assert!((t - 0.5).abs() < 1e-9);
                assert!((u - 0.5).abs() < 1e-9);
            }
            other => panic!("unexpected intersection: {:?}", other),
        }
    }

    #[test]
    fn test_intersect_segments_parallel_and_collinear() {
        let parallel = intersect_segments_2d(
            DVec2::new(0.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(2.0, 1.0),
            1e-9,
        );
        assert_eq!(parallel, SegmentIntersection::None);

        let collinear = intersect_segments_2d(
            DVec2::new(0.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(3.0, 0.0),
            1e-9,
        );
        assert_eq!(collinear, SegmentIntersection::Collinear);
    }

    #[test]
    fn test_point_in_triangle_and_height() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(2.0, 2.0, 0.0);
        let c = Vec3::new(0.0, 0.0, 2.0);
        let p = Vec3::new(0.5, 10.0, 0.5);
        assert!(point_in_triangle_xz(p, a, b, c));
        assert!(!point_in_triangle_xz(Vec3::new(2.0, 0.0, 2.0), a, b, c));
        assert!((triangle_height_at(p, a, b, c) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_bounds_2d() {
        assert!(bounds_2d(&[]).is_none());
        let (min, max) = bounds_2d(&square()).unwrap();
        assert_eq!(min, Vec2::new(0.0, 0.0));
        assert_eq!(max, Vec2::new(1.0, 1.0));
        assert!(overlap_bounds_2d(min, max, Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0)));
        assert!(!overlap_bounds_2d(min, max, Vec2::new(1.1, 1.1), Vec2::new(2.0, 2.0)));
    }
}
