//! Navigation mesh generation.
//!
//! A pass goes through obstacle collection, subtraction of the obstacle
//! footprints from every walkable surface, simplification, triangulation and
//! finally edge linking. Incremental passes only rebuild the polygons lying
//! under the changed obstacles and relink them with their neighbours; every
//! other polygon is shared with the previous snapshot.

use glam::{Vec2, Vec3};
use navmesh_common::{
    from_plane, overlap_bounds_2d, NavMesh, NavPolygon, NavPolygonId, PolygonSimplifier, Result,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::config::NavMeshConfig;
use crate::csg::{try_subtract, union_polygons, CsgPolygon};
use crate::edge_link::{EdgeLinkDetection, EdgeLinker};
use crate::surface::{Obstacle, ObstacleId, WalkableSurface};
use crate::triangulation::{build_nav_triangles, TriangulationAlgorithm};

/// Change of the obstacle set applied by [`NavMeshGenerator::regenerate`]
#[derive(Debug, Clone, PartialEq)]
pub enum ObstacleChange {
    Added(Obstacle),
    Changed(Obstacle),
    Removed(ObstacleId),
}

impl ObstacleChange {
    pub fn id(&self) -> ObstacleId {
        match self {
            ObstacleChange::Added(obstacle) | ObstacleChange::Changed(obstacle) => obstacle.id(),
            ObstacleChange::Removed(id) => *id,
        }
    }
}

/// Builds navigation meshes from walkable surfaces and obstacles
#[derive(Debug)]
pub struct NavMeshGenerator {
    config: NavMeshConfig,
    simplifier: PolygonSimplifier,
    linker: EdgeLinker,
    surfaces: Vec<WalkableSurface>,
    obstacles: BTreeMap<ObstacleId, Obstacle>,
    /// Polygons built from each surface, by surface index
    surface_polygons: Vec<Vec<NavPolygonId>>,
    next_polygon_id: u32,
    update_id: u64,
}

impl NavMeshGenerator {
    pub fn new(config: NavMeshConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            simplifier: PolygonSimplifier::new(config.simplification),
            linker: EdgeLinker::new(EdgeLinkDetection::new(config.link), config.grid_cell_size),
            surfaces: Vec::new(),
            obstacles: BTreeMap::new(),
            surface_polygons: Vec::new(),
            next_polygon_id: 1,
            update_id: 0,
        })
    }

    pub fn config(&self) -> &NavMeshConfig {
        &self.config
    }

    pub fn surfaces(&self) -> &[WalkableSurface] {
        &self.surfaces
    }

    pub fn obstacle(&self, id: ObstacleId) -> Option<&Obstacle> {
        self.obstacles.get(&id)
    }

    pub fn obstacles(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.values()
    }

    /// Update id of the last mesh produced
    pub fn update_id(&self) -> u64 {
        self.update_id
    }

    /// Runs a full pass over the given surfaces and obstacles, which replace
    /// the ones of any previous pass.
    pub fn generate(&mut self, surfaces: Vec<WalkableSurface>, obstacles: Vec<Obstacle>) -> NavMesh {
        log::debug!(
            "Generating navigation mesh: {} surface(s), {} obstacle(s)",
            surfaces.len(),
            obstacles.len()
        );
        self.surfaces = surfaces;
        self.obstacles = obstacles.into_iter().map(|o| (o.id(), o)).collect();
        self.surface_polygons = vec![Vec::new(); self.surfaces.len()];

        let mut polygons = BTreeMap::new();
        let mut targets = BTreeSet::new();
        for index in 0..self.surfaces.len() {
            self.rebuild_surface(index, None, &mut polygons, &mut targets);
        }
        self.link(&mut polygons, &targets);
        self.publish(self.update_id + 1, polygons)
    }

    /// Applies obstacle changes on top of `previous`, the last mesh returned
    /// by this generator.
    ///
    /// Only the polygons of a touched surface whose bounds overlap the old or
    /// the new footprint of a changed obstacle are rebuilt and relinked. The
    /// other polygons keep their id and are shared with `previous`.
    pub fn regenerate(
        &mut self,
        previous: &NavMesh,
        changes: impl IntoIterator<Item = ObstacleChange>,
    ) -> NavMesh {
        let agent = self.config.agent;
        let margin = Vec2::splat(self.config.csg.tolerance + self.config.simplification.distance_tolerance);
        let mut dirty: BTreeMap<usize, Vec<(Vec2, Vec2)>> = BTreeMap::new();
        for change in changes {
            let id = change.id();
            let old = match change {
                ObstacleChange::Added(obstacle) | ObstacleChange::Changed(obstacle) => {
                    self.obstacles.insert(id, obstacle)
                }
                ObstacleChange::Removed(id) => self.obstacles.remove(&id),
            };
            let new = self.obstacles.get(&id);
            for (index, surface) in self.surfaces.iter().enumerate() {
                for obstacle in [old.as_ref(), new].into_iter().flatten() {
                    if !obstacle.affects(surface, &agent) {
                        continue;
                    }
                    if let Some((min, max)) = obstacle.inflated_bounds(&agent) {
                        dirty.entry(index).or_default().push((min - margin, max + margin));
                    }
                }
            }
        }

        let mut polygons = previous.polygon_map().clone();
        let mut removed: BTreeSet<NavPolygonId> = BTreeSet::new();
        for (&index, areas) in &dirty {
            let (stale, kept): (Vec<NavPolygonId>, Vec<NavPolygonId>) =
                std::mem::take(&mut self.surface_polygons[index])
                    .into_iter()
                    .partition(|id| {
                        polygons
                            .get(id)
                            .map_or(true, |polygon| overlaps_any(plane_bounds(polygon), areas))
                    });
            self.surface_polygons[index] = kept;
            removed.extend(stale);
        }
        log::debug!(
            "Regenerating {} polygon(s) on {} surface(s)",
            removed.len(),
            dirty.len()
        );

        for id in &removed {
            polygons.remove(id);
        }
        for polygon in polygons.values_mut() {
            let linked_to_removed = polygon
                .triangles()
                .iter()
                .flat_map(|t| t.links())
                .any(|link| removed.contains(&link.target.polygon));
            if linked_to_removed {
                let polygon = Arc::make_mut(polygon);
                let dropped: usize = removed.iter().map(|&id| polygon.remove_links_to(id)).sum();
                log::debug!("Dropped {} link(s) of {} to rebuilt polygons", dropped, polygon.name());
            }
        }

        let mut targets = BTreeSet::new();
        for (index, areas) in &dirty {
            self.rebuild_surface(*index, Some(areas.as_slice()), &mut polygons, &mut targets);
        }
        self.link(&mut polygons, &targets);
        self.publish(previous.update_id().max(self.update_id) + 1, polygons)
    }

    fn publish(&mut self, update_id: u64, polygons: BTreeMap<NavPolygonId, Arc<NavPolygon>>) -> NavMesh {
        self.update_id = update_id;
        let nav_mesh = NavMesh::from_polygons(update_id, polygons);
        let stats = nav_mesh.statistics();
        log::info!(
            "Navigation mesh {} ready: {} polygons, {} triangles, {} links ({} jumps)",
            update_id,
            stats.polygon_count,
            stats.triangle_count,
            stats.link_count,
            stats.jump_link_count
        );
        nav_mesh
    }

    fn link(&self, polygons: &mut BTreeMap<NavPolygonId, Arc<NavPolygon>>, targets: &BTreeSet<NavPolygonId>) {
        let created = self.linker.link_polygons(polygons, targets);
        log::debug!("Linked {} polygon(s) with {} new link(s)", targets.len(), created);
    }

    fn allocate_polygon_id(&mut self) -> NavPolygonId {
        let id = NavPolygonId(self.next_polygon_id);
        self.next_polygon_id += 1;
        id
    }

    /// Builds the polygons of a surface and records them as its polygons.
    /// With `areas`, only the polygons overlapping one of them are built.
    fn rebuild_surface(
        &mut self,
        index: usize,
        areas: Option<&[(Vec2, Vec2)]>,
        polygons: &mut BTreeMap<NavPolygonId, Arc<NavPolygon>>,
        targets: &mut BTreeSet<NavPolygonId>,
    ) {
        let walkable: Vec<CsgPolygon> = self
            .walkable_polygons(&self.surfaces[index])
            .into_iter()
            .filter(|polygon| {
                areas.map_or(true, |areas| {
                    polygon
                        .bounding_box()
                        .is_some_and(|bounds| overlaps_any(bounds, areas))
                })
            })
            .collect();
        for polygon in walkable {
            let id = self.allocate_polygon_id();
            if let Some(nav_polygon) = triangulate_polygon(id, &polygon, &self.surfaces[index]) {
                self.surface_polygons[index].push(id);
                targets.insert(id);
                polygons.insert(id, Arc::new(nav_polygon));
            }
        }
    }

    /// Walkable parts of a surface once every obstacle standing on it is
    /// removed, simplified and named after the surface and those obstacles.
    fn walkable_polygons(&self, surface: &WalkableSurface) -> Vec<CsgPolygon> {
        let agent = &self.config.agent;
        let csg = self.config.csg;
        let tolerance = csg.tolerance;

        let mut footprints: Vec<CsgPolygon> = surface
            .self_obstacles(agent)
            .iter()
            .map(|polygon| polygon.expand(agent.radius))
            .collect();
        for obstacle in self.obstacles.values() {
            if !obstacle.affects(surface, agent) {
                continue;
            }
            let inflated = obstacle.inflated(agent);
            if let Err(err) = inflated.validate() {
                log::warn!(
                    "Ignoring {} ({}) on surface {}: {}",
                    obstacle.id(),
                    obstacle.name(),
                    surface.name(),
                    err
                );
                continue;
            }
            footprints.push(inflated);
        }
        let footprints = union_polygons(&footprints, csg);

        let mut pieces: Vec<(CsgPolygon, Vec<String>)> = vec![(surface.outline(), Vec::new())];
        for footprint in &footprints {
            let mut next = Vec::with_capacity(pieces.len());
            for (piece, mut names) in pieces {
                let outcome = try_subtract(&piece, footprint, csg);
                if !outcome.complete {
                    log::warn!(
                        "Subtracting {} from {} hit the walk limit, obstacle ignored",
                        footprint.name(),
                        piece.name()
                    );
                    next.push((piece, names));
                    continue;
                }
                let result = outcome.polygons;
                let unchanged = result.len() == 1 && (result[0].area() - piece.area()).abs() <= tolerance;
                if unchanged {
                    next.push((piece, names));
                    continue;
                }
                if let Some(invalid) = result.iter().find(|p| p.validate().is_err()) {
                    log::warn!(
                        "Subtracting {} from {} produced an invalid polygon ({}), obstacle ignored",
                        footprint.name(),
                        piece.name(),
                        invalid
                    );
                    next.push((piece, names));
                    continue;
                }
                names.push(footprint.name().to_string());
                next.extend(result.into_iter().map(|p| (p, names.clone())));
            }
            pieces = next;
        }

        pieces
            .into_iter()
            .filter_map(|(mut piece, names)| {
                piece.simplify(&self.simplifier);
                if piece.is_empty() {
                    log::warn!("Walkable part of {} collapsed while simplifying", surface.name());
                    return None;
                }
                let name = if names.is_empty() {
                    surface.name().to_string()
                } else {
                    format!("{} - {}", surface.name(), names.join(", "))
                };
                piece.set_name(name);
                Some(piece)
            })
            .collect()
    }
}

/// Bounds of a navigation polygon on the walking plane
fn plane_bounds(polygon: &NavPolygon) -> (Vec2, Vec2) {
    let (min, max) = polygon.bounds();
    (Vec2::new(min.x, -max.z), Vec2::new(max.x, -min.z))
}

fn overlaps_any((min, max): (Vec2, Vec2), areas: &[(Vec2, Vec2)]) -> bool {
    areas
        .iter()
        .any(|&(area_min, area_max)| overlap_bounds_2d(min, max, area_min, area_max))
}

/// Triangulates a walkable polygon and lifts its points onto the surface
fn triangulate_polygon(id: NavPolygonId, polygon: &CsgPolygon, surface: &WalkableSurface) -> Option<NavPolygon> {
    let mut ccw_points = polygon.points().to_vec();
    ccw_points.reverse();
    let mut triangulation = TriangulationAlgorithm::new(ccw_points, polygon.name());
    for (i, hole) in polygon.holes().iter().enumerate() {
        triangulation.add_hole_points(hole, format!("{}#hole{}", polygon.name(), i));
    }

    let triangles = triangulation.triangulate();
    if triangles.is_empty() {
        log::warn!("Polygon {} produced no triangle, skipped", polygon);
        return None;
    }

    let points: Vec<Vec3> = triangulation
        .all_points()
        .iter()
        .map(|&p| from_plane(p, surface.height_at(p)))
        .collect();
    let nav_triangles = build_nav_triangles(id, &triangles, &points);
    Some(NavPolygon::new(id, polygon.name().to_string(), points, nav_triangles))
}
