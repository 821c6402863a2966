//! Path queries over a navigation mesh snapshot.
//!
//! A query locates the triangles under the start and end points, runs an A*
//! search over the triangle graph (nodes are triangles, edges are
//! [`NavLink`]s), turns the crossed links into [`PathPortal`]s and pulls the
//! path taut with the funnel algorithm. Jumps split the corridor: the walking
//! sections on either side are pulled independently and the take-off and
//! landing points are kept as they are.

use std::collections::BinaryHeap;

use glam::Vec3;
use navmesh_common::{
    closest_point_on_segment, dist_sqr_2d_vec3, point_in_triangle_xz, triangle_height_at, NavLink,
    NavMesh, Result, TriangleRef,
};

use crate::config::PathfindingConfig;
use crate::funnel::{funnel, push_point};
use crate::node_pool::{HeapNode, NodePool, NodeState, RouteStep};
use crate::path_portal::PathPortal;
use crate::triangle_grid::TriangleGrid;

/// Point of a computed path
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct PathPoint {
    pub point: Vec3,
    /// The agent jumps from this point to the next one
    pub jump: bool,
}

impl PathPoint {
    pub fn new(point: Vec3, jump: bool) -> Self {
        Self { point, jump }
    }
}

/// Navigation mesh query structure
#[derive(Debug)]
pub struct NavMeshQuery<'a> {
    nav_mesh: &'a NavMesh,
    config: PathfindingConfig,
    grid: TriangleGrid,
}

impl<'a> NavMeshQuery<'a> {
    pub fn new(nav_mesh: &'a NavMesh, config: PathfindingConfig) -> Result<Self> {
        config.validate()?;
        let grid = TriangleGrid::build(nav_mesh, config.locate_cell_size);
        Ok(Self {
            nav_mesh,
            config,
            grid,
        })
    }

    pub fn nav_mesh(&self) -> &NavMesh {
        self.nav_mesh
    }

    pub fn config(&self) -> &PathfindingConfig {
        &self.config
    }

    /// Finds the triangle under a point.
    ///
    /// When several triangles contain the point on the walking plane, the
    /// one whose surface is vertically closest to the point wins.
    pub fn find_triangle(&self, point: Vec3) -> Option<TriangleRef> {
        self.locate(point).map(|(reference, _)| reference)
    }

    /// Triangle under a point and the surface height there
    fn locate(&self, point: Vec3) -> Option<(TriangleRef, f32)> {
        let mut best: Option<(TriangleRef, f32)> = None;
        for &reference in self.grid.candidates(point) {
            let Some(polygon) = self.nav_mesh.polygon(reference.polygon) else {
                continue;
            };
            let [a, b, c] = polygon.triangle_points(reference.triangle);
            if !point_in_triangle_xz(point, a, b, c) {
                continue;
            }
            let height = triangle_height_at(point, a, b, c);
            let closer = best.map_or(true, |(_, h)| (height - point.y).abs() < (h - point.y).abs());
            if closer {
                best = Some((reference, height));
            }
        }
        best
    }

    /// Finds a path between two points. An empty path means there is none.
    pub fn find_path(&self, start: Vec3, end: Vec3) -> Vec<Vec3> {
        self.find_path_points(start, end)
            .into_iter()
            .map(|p| p.point)
            .collect()
    }

    /// Finds a path between two points, flagging the jump take-off points
    pub fn find_path_points(&self, start: Vec3, end: Vec3) -> Vec<PathPoint> {
        let portals = self.find_portals(start, end);
        if portals.is_empty() {
            return Vec::new();
        }
        pull_path(&portals)
    }

    /// Portals crossed between two points, starting and ending with the
    /// degenerate portals of the end points. Empty when there is no path.
    pub fn find_portals(&self, start: Vec3, end: Vec3) -> Vec<PathPortal> {
        let Some((start_ref, start_height)) = self.locate(start) else {
            log::debug!("No triangle under path start {:?}", start);
            return Vec::new();
        };
        let Some((end_ref, end_height)) = self.locate(end) else {
            log::debug!("No triangle under path end {:?}", end);
            return Vec::new();
        };
        let Some(route) = self.search(start_ref, end_ref) else {
            log::debug!("No route from {:?} to {:?}", start, end);
            return Vec::new();
        };

        let mut portals = Vec::with_capacity(route.len() + 2);
        portals.push(PathPortal::point(Vec3::new(start.x, start_height, start.z)));
        for step in &route {
            match self.portal(step) {
                Some(portal) => portals.push(portal),
                None => {
                    log::warn!("Route goes through a missing triangle, path dropped");
                    return Vec::new();
                }
            }
        }
        portals.push(PathPortal::point(Vec3::new(end.x, end_height, end.z)));
        portals
    }

    /// Portal of a route step, `None` when a referenced triangle is missing
    fn portal(&self, step: &RouteStep) -> Option<PathPortal> {
        let link = &step.link;
        let (a, b) = self.nav_mesh.edge_points(step.triangle, link.source_edge)?;
        let (a, b) = match link.constraint {
            Some(constraint) => constraint.clip(a, b),
            None => (a, b),
        };
        if link.is_jump() {
            let take_off = (a + b) * 0.5;
            let (ta, tb) = self.nav_mesh.edge_points(link.target, link.target_edge)?;
            let landing = closest_point_on_segment(take_off, ta, tb);
            Some(PathPortal::jump(take_off, landing, step.triangle, link.target))
        } else {
            // Triangles are counter-clockwise: leaving through edge (a, b),
            // `b` is on the left
            Some(PathPortal::walk(b, a, step.triangle, link.target))
        }
    }

    /// Traversal cost of a link between two triangle centers
    fn link_cost(&self, link: &NavLink, from: Vec3, to: Vec3) -> f32 {
        let distance = dist_sqr_2d_vec3(from, to).sqrt();
        if link.is_jump() {
            distance * self.config.jump_cost_factor
        } else {
            distance
        }
    }

    /// A* search over the triangle graph
    fn search(&self, start: TriangleRef, goal: TriangleRef) -> Option<Vec<RouteStep>> {
        let goal_center = self.nav_mesh.triangle(goal)?.center();
        let heuristic = |center: Vec3| dist_sqr_2d_vec3(center, goal_center).sqrt();

        let mut pool = NodePool::new();
        let mut open_list = BinaryHeap::new();

        let start_index = pool.get_or_insert(start);
        let start_f = heuristic(self.nav_mesh.triangle(start)?.center());
        {
            let node = pool.node_mut(start_index);
            node.g = 0.0;
            node.f = start_f;
        }
        open_list.push(HeapNode {
            index: start_index,
            f: start_f,
        });

        while let Some(HeapNode { index, f }) = open_list.pop() {
            let (current, current_g) = {
                let node = pool.node_mut(index);
                if node.state == NodeState::Closed || f > node.f {
                    // Stale entry
                    continue;
                }
                node.state = NodeState::Closed;
                (node.triangle, node.g)
            };

            if current == goal {
                let route = pool.route(index);
                log::trace!("Route found: {} step(s), {} node(s) visited", route.len(), pool.len());
                return Some(route);
            }

            let Some(triangle) = self.nav_mesh.triangle(current) else {
                continue;
            };
            let center = triangle.center();
            for link in triangle.links() {
                let Some(neighbor) = self.nav_mesh.triangle(link.target) else {
                    debug_assert!(false, "link to missing triangle {:?}", link.target);
                    log::warn!("Dropping link to missing triangle {:?}", link.target);
                    continue;
                };
                let neighbor_center = neighbor.center();
                let g = current_g + self.link_cost(link, center, neighbor_center);

                if let Some(existing) = pool.find(link.target) {
                    let node = pool.node(existing);
                    if node.state == NodeState::Closed || g >= node.g {
                        continue;
                    }
                }

                let neighbor_index = pool.get_or_insert(link.target);
                let f = g + heuristic(neighbor_center);
                let node = pool.node_mut(neighbor_index);
                node.parent = Some(index);
                node.via = Some(*link);
                node.g = g;
                node.f = f;
                node.state = NodeState::Open;
                open_list.push(HeapNode {
                    index: neighbor_index,
                    f,
                });
            }
        }

        None
    }
}

/// Pulls the walking sections of a portal corridor taut, splitting it at
/// jump portals
fn pull_path(portals: &[PathPortal]) -> Vec<PathPoint> {
    let mut result: Vec<PathPoint> = Vec::new();
    let mut append = |section: &[PathPortal], ends_with_jump: bool| {
        let mut points = Vec::new();
        if let Some(last) = result.last() {
            points.push(last.point);
        }
        let skip = points.len();
        for point in funnel(section) {
            push_point(&mut points, point);
        }
        let count = points.len().saturating_sub(skip);
        for (i, point) in points.into_iter().skip(skip).enumerate() {
            result.push(PathPoint::new(point, ends_with_jump && i + 1 == count));
        }
    };

    let mut section: Vec<PathPortal> = Vec::new();
    for portal in portals {
        match (portal.take_off(), portal.landing()) {
            (Some(take_off), Some(landing)) => {
                section.push(PathPortal::point(take_off));
                append(&section, true);
                section.clear();
                section.push(PathPortal::point(landing));
            }
            _ => section.push(*portal),
        }
    }
    append(&section, false);
    result
}
