use glam::Vec3;
use navmesh_common::{
    closest_point_on_segment, NavLink, NavLinkConstraint, NavPolygon, NavPolygonId, TriangleRef,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::{EdgeLinkDetection, EdgeLinkResult};
use crate::edge_grid::EdgeGrid;

/// Padding added to the grid lookup so that touching edges share a cell
const GRID_PADDING_EPSILON: f32 = 0.01;

/// Triangle edge without a link inside its own polygon
#[derive(Debug, Clone, Copy)]
struct BoundaryEdge {
    triangle: TriangleRef,
    edge: usize,
    a: Vec3,
    b: Vec3,
}

/// Jump proposed for a boundary edge
#[derive(Debug, Clone, Copy)]
struct JumpCandidate {
    link: NavLink,
    gap: f32,
}

impl JumpCandidate {
    fn new(link: NavLink, source: (Vec3, Vec3), target: (Vec3, Vec3)) -> Self {
        let constraint = link.constraint.unwrap_or_else(NavLinkConstraint::full);
        let (from, to) = constraint.clip(source.0, source.1);
        let take_off = (from + to) * 0.5;
        let gap = take_off.distance(closest_point_on_segment(take_off, target.0, target.1));
        Self { link, gap }
    }
}

/// Links to store on one boundary edge
#[derive(Debug)]
struct EdgeUpdate {
    triangle: TriangleRef,
    edge: usize,
    links: Vec<NavLink>,
}

/// Links boundary edges of different polygons together.
///
/// A boundary edge keeps a direct link to every polygon it overlaps. An edge
/// without any direct link keeps at most one jump, the one with the shortest
/// gap.
#[derive(Debug, Clone)]
pub struct EdgeLinker {
    detection: EdgeLinkDetection,
    cell_size: f32,
}

impl EdgeLinker {
    pub fn new(detection: EdgeLinkDetection, cell_size: f32) -> Self {
        Self {
            detection,
            cell_size,
        }
    }

    pub fn detection(&self) -> &EdgeLinkDetection {
        &self.detection
    }

    /// Creates links between `targets` and every polygon around them, in both
    /// directions. Pairs of polygons outside `targets` are left untouched.
    ///
    /// Returns the number of links created or replaced.
    pub fn link_polygons(
        &self,
        polygons: &mut BTreeMap<NavPolygonId, Arc<NavPolygon>>,
        targets: &BTreeSet<NavPolygonId>,
    ) -> usize {
        if targets.is_empty() || polygons.len() < 2 {
            return 0;
        }

        let edges = collect_boundary_edges(polygons);
        let padding = self.detection.config().jump_max_distance.max(0.0) + GRID_PADDING_EPSILON;
        let mut grid = EdgeGrid::new(self.cell_size, padding);
        for (i, edge) in edges.iter().enumerate() {
            grid.insert(i, edge.a, edge.b);
        }
        log::debug!(
            "Linking {} boundary edges over {} grid cells",
            edges.len(),
            grid.cell_count()
        );

        let mut updates: Vec<EdgeUpdate> = Vec::new();
        for start in &edges {
            let start_is_target = targets.contains(&start.triangle.polygon);
            let mut direct_links = Vec::new();
            let mut best_jump: Option<JumpCandidate> = None;

            for j in grid.query(start.a, start.b) {
                let end = &edges[j];
                if end.triangle.polygon == start.triangle.polygon {
                    continue;
                }
                if !start_is_target && !targets.contains(&end.triangle.polygon) {
                    continue;
                }

                match self.detection.detect_link((start.a, start.b), (end.a, end.b)) {
                    EdgeLinkResult::None => {}
                    EdgeLinkResult::Direct(constraint) => direct_links.push(
                        NavLink::direct(start.edge, end.triangle, end.edge).with_constraint(constraint),
                    ),
                    EdgeLinkResult::Jump(constraint) => {
                        let link = NavLink::jump(start.edge, end.triangle, end.edge, constraint);
                        let candidate = JumpCandidate::new(link, (start.a, start.b), (end.a, end.b));
                        if best_jump.map_or(true, |best| candidate.gap < best.gap) {
                            best_jump = Some(candidate);
                        }
                    }
                }
            }

            let links = if !direct_links.is_empty() {
                direct_links
            } else if has_external_direct_link(polygons, start) {
                continue;
            } else {
                match best_jump {
                    Some(jump) if existing_jump(polygons, start).map_or(true, |e| jump.gap < e.gap) => {
                        vec![jump.link]
                    }
                    _ => continue,
                }
            };
            updates.push(EdgeUpdate {
                triangle: start.triangle,
                edge: start.edge,
                links,
            });
        }

        let mut created = 0;
        for update in updates {
            let Some(polygon) = polygons.get_mut(&update.triangle.polygon) else {
                debug_assert!(false, "link source {} disappeared", update.triangle.polygon);
                continue;
            };
            let triangle = &mut Arc::make_mut(polygon).triangles_mut()[update.triangle.triangle];
            // A new direct link or a shorter jump replaces the jumps of the edge
            triangle.retain_links(|link| {
                link.source_edge != update.edge || !link.is_jump() || update.links.contains(link)
            });
            for link in update.links {
                if triangle.add_link(link) {
                    created += 1;
                }
            }
        }
        log::debug!("Created {} edge links for {} polygons", created, targets.len());
        created
    }
}

fn collect_boundary_edges(polygons: &BTreeMap<NavPolygonId, Arc<NavPolygon>>) -> Vec<BoundaryEdge> {
    let mut edges = Vec::new();
    for (&id, polygon) in polygons {
        for (t, triangle) in polygon.triangles().iter().enumerate() {
            for edge in 0..3 {
                let internal = triangle
                    .edge_links(edge)
                    .any(|link| link.target.polygon == id);
                if internal {
                    continue;
                }
                let (a, b) = polygon.edge_points(t, edge);
                edges.push(BoundaryEdge {
                    triangle: TriangleRef::new(id, t),
                    edge,
                    a,
                    b,
                });
            }
        }
    }
    edges
}

fn stored_links<'a>(
    polygons: &'a BTreeMap<NavPolygonId, Arc<NavPolygon>>,
    start: &BoundaryEdge,
) -> impl Iterator<Item = &'a NavLink> {
    let edge = start.edge;
    polygons
        .get(&start.triangle.polygon)
        .and_then(|polygon| polygon.triangle(start.triangle.triangle))
        .into_iter()
        .flat_map(move |triangle| triangle.edge_links(edge))
}

/// Whether the edge already walks into another polygon
fn has_external_direct_link(
    polygons: &BTreeMap<NavPolygonId, Arc<NavPolygon>>,
    start: &BoundaryEdge,
) -> bool {
    stored_links(polygons, start).any(|link| {
        !link.is_jump()
            && link.target.polygon != start.triangle.polygon
            && polygons.contains_key(&link.target.polygon)
    })
}

/// Jump already stored on the edge, if its target still exists
fn existing_jump(
    polygons: &BTreeMap<NavPolygonId, Arc<NavPolygon>>,
    start: &BoundaryEdge,
) -> Option<JumpCandidate> {
    let link = *stored_links(polygons, start).find(|link| link.is_jump())?;
    let target = polygons.get(&link.target.polygon)?;
    target.triangle(link.target.triangle)?;
    let target_edge = target.edge_points(link.target.triangle, link.target_edge);
    Some(JumpCandidate::new(link, (start.a, start.b), target_edge))
}
