//! Funnel algorithm (string pulling) over a corridor of walk portals.
//!
//! The funnel is kept as an apex with a left and a right side. Each portal
//! narrows one side when its point lies inside the funnel; when a side would
//! cross the other one, the other side's point becomes a new apex and is
//! emitted, and the scan restarts just after it. Turn tests run on the
//! walking plane, where a positive [`tri_area_2d`] means "on the left".

use glam::{Vec2, Vec3};
use navmesh_common::{to_plane, tri_area_2d};

use crate::path_portal::PathPortal;

/// Squared plane distance under which two funnel points are the same
const FUNNEL_EPSILON_SQ: f32 = 1e-6;

fn same_point(a: Vec2, b: Vec2) -> bool {
    a.distance_squared(b) < FUNNEL_EPSILON_SQ
}

/// Appends a point unless it repeats the last one
pub(crate) fn push_point(path: &mut Vec<Vec3>, point: Vec3) {
    match path.last() {
        Some(last) if same_point(to_plane(*last), to_plane(point)) && (last.y - point.y).abs() < 1e-3 => {}
        _ => path.push(point),
    }
}

/// Computes the taut polyline through `portals`.
///
/// The first and last portals are the degenerate start and end points.
/// Jump portals are not expected here: callers split the corridor at them.
pub fn funnel(portals: &[PathPortal]) -> Vec<Vec3> {
    let (Some(first), Some(last)) = (portals.first(), portals.last()) else {
        return Vec::new();
    };
    debug_assert!(first.is_degenerate() && last.is_degenerate());

    let mut path = vec![first.left()];
    let mut apex = to_plane(first.left());
    let mut left = apex;
    let mut right = apex;
    let mut left_index = 0;
    let mut right_index = 0;

    let mut i = 1;
    while i < portals.len() {
        let new_left = to_plane(portals[i].left());
        let new_right = to_plane(portals[i].right());

        // Right side
        if tri_area_2d(apex, right, new_right) >= 0.0 {
            if same_point(apex, right) || tri_area_2d(apex, left, new_right) < 0.0 {
                right = new_right;
                right_index = i;
            } else {
                push_point(&mut path, portals[left_index].left());
                apex = left;
                right = apex;
                right_index = left_index;
                i = left_index + 1;
                continue;
            }
        }

        // Left side
        if tri_area_2d(apex, left, new_left) <= 0.0 {
            if same_point(apex, left) || tri_area_2d(apex, right, new_left) > 0.0 {
                left = new_left;
                left_index = i;
            } else {
                push_point(&mut path, portals[right_index].right());
                apex = right;
                left = apex;
                left_index = right_index;
                i = right_index + 1;
                continue;
            }
        }

        i += 1;
    }

    push_point(&mut path, last.left());
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use navmesh_common::{NavPolygonId, TriangleRef};

    fn portal(left: Vec3, right: Vec3) -> PathPortal {
        let reference = TriangleRef::new(NavPolygonId(1), 0);
        PathPortal::walk(left, right, reference, reference)
    }

    fn assert_path(actual: &[Vec3], expected: &[Vec3]) {
        assert_eq!(actual.len(), expected.len(), "path {:?}", actual);
        for (a, e) in actual.iter().zip(expected) {
            assert!(a.distance(*e) < 1e-5, "expected {:?}, got {:?}", e, a);
        }
    }

    #[test]
    fn test_straight_path() {
        let path = funnel(&[
            PathPortal::point(Vec3::new(1.0, 0.0, -1.0)),
            portal(Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 0.0)),
            PathPortal::point(Vec3::new(1.0, 0.0, 1.0)),
        ]);
        assert_path(&path, &[Vec3::new(1.0, 0.0, -1.0), Vec3::new(1.0, 0.0, 1.0)]);
    }

    #[test]
    fn test_corner_path_on_left() {
        let path = funnel(&[
            PathPortal::point(Vec3::new(1.0, 0.0, -1.0)),
            portal(Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 0.0)),
            PathPortal::point(Vec3::new(4.0, 0.0, 1.0)),
        ]);
        assert_path(
            &path,
            &[
                Vec3::new(1.0, 0.0, -1.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(4.0, 0.0, 1.0),
            ],
        );
    }

    #[test]
    fn test_corner_path_reversed() {
        let path = funnel(&[
            PathPortal::point(Vec3::new(4.0, 0.0, 1.0)),
            portal(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)),
            PathPortal::point(Vec3::new(1.0, 0.0, -1.0)),
        ]);
        assert_path(
            &path,
            &[
                Vec3::new(4.0, 0.0, 1.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, -1.0),
            ],
        );
    }

    #[test]
    fn test_corner_path_on_right() {
        let path = funnel(&[
            PathPortal::point(Vec3::new(1.0, 0.0, -1.0)),
            portal(Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 0.0)),
            PathPortal::point(Vec3::new(-2.0, 0.0, 1.0)),
        ]);
        assert_path(
            &path,
            &[
                Vec3::new(1.0, 0.0, -1.0),
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(-2.0, 0.0, 1.0),
            ],
        );
    }

    #[test]
    fn test_corner_path_on_right_reversed() {
        let path = funnel(&[
            PathPortal::point(Vec3::new(-2.0, 0.0, 1.0)),
            portal(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)),
            PathPortal::point(Vec3::new(1.0, 0.0, -1.0)),
        ]);
        assert_path(
            &path,
            &[
                Vec3::new(-2.0, 0.0, 1.0),
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, -1.0),
            ],
        );
    }

    #[test]
    fn test_single_point_corridor() {
        let point = Vec3::new(3.0, 1.0, 3.0);
        let path = funnel(&[PathPortal::point(point), PathPortal::point(point)]);
        assert_path(&path, &[point]);
        assert!(funnel(&[]).is_empty());
    }

    #[test]
    fn test_corridor_around_two_corners() {
        // Corridor bending right then left: x in [0, 1] for z in [0, 2],
        // then x in [0, 3] for z in [2, 3], then x in [2, 3] for z in [3, 5]
        let path = funnel(&[
            PathPortal::point(Vec3::new(0.5, 0.0, 0.5)),
            portal(Vec3::new(1.0, 0.0, 2.0), Vec3::new(0.0, 0.0, 2.0)),
            portal(Vec3::new(3.0, 0.0, 3.0), Vec3::new(2.0, 0.0, 3.0)),
            PathPortal::point(Vec3::new(2.5, 0.0, 4.5)),
        ]);
        assert_path(
            &path,
            &[
                Vec3::new(0.5, 0.0, 0.5),
                Vec3::new(1.0, 0.0, 2.0),
                Vec3::new(2.0, 0.0, 3.0),
                Vec3::new(2.5, 0.0, 4.5),
            ],
        );
    }
}
