//! Generator inputs: walkable surfaces and the obstacles standing on them.

use glam::Vec2;
use navmesh_common::{overlap_bounds_2d, NavMeshAgent};

use crate::csg::CsgPolygon;
use crate::terrain::TerrainSurface;

/// Identifier of an obstacle, stable across updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct ObstacleId(pub u32);

impl std::fmt::Display for ObstacleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "obstacle#{}", self.0)
    }
}

/// Ground the agent can walk on
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum WalkableSurface {
    /// Horizontal polygon at a fixed height
    Flat { outline: CsgPolygon, height: f32 },
    /// Heightfield whose steep squares become obstacles
    Terrain(TerrainSurface),
}

impl WalkableSurface {
    pub fn flat(outline: CsgPolygon, height: f32) -> Self {
        WalkableSurface::Flat { outline, height }
    }

    pub fn name(&self) -> &str {
        match self {
            WalkableSurface::Flat { outline, .. } => outline.name(),
            WalkableSurface::Terrain(terrain) => terrain.name(),
        }
    }

    /// Clockwise outline on the walking plane
    pub fn outline(&self) -> CsgPolygon {
        match self {
            WalkableSurface::Flat { outline, .. } => outline.clone(),
            WalkableSurface::Terrain(terrain) => terrain.outline(),
        }
    }

    /// Height of the surface at a plane point
    pub fn height_at(&self, point: Vec2) -> f32 {
        match self {
            WalkableSurface::Flat { height, .. } => *height,
            WalkableSurface::Terrain(terrain) => terrain.height_at(point),
        }
    }

    /// Vertical range in which an obstacle blocks the agent on this surface
    pub fn clearance_range(&self, agent: &NavMeshAgent) -> (f32, f32) {
        match self {
            WalkableSurface::Flat { height, .. } => (*height, *height + agent.height),
            WalkableSurface::Terrain(terrain) => {
                let (min, max) = terrain.height_range();
                (min, max + agent.height)
            }
        }
    }

    /// Obstacles produced by the surface itself
    pub fn self_obstacles(&self, agent: &NavMeshAgent) -> Vec<CsgPolygon> {
        match self {
            WalkableSurface::Flat { .. } => Vec::new(),
            WalkableSurface::Terrain(terrain) => terrain.self_obstacles(agent.max_slope_radians()),
        }
    }

    pub fn bounding_box(&self) -> Option<(Vec2, Vec2)> {
        self.outline().bounding_box()
    }
}

/// Footprint of something blocking the way, with its vertical extent
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Obstacle {
    id: ObstacleId,
    footprint: CsgPolygon,
    bottom: f32,
    top: f32,
}

impl Obstacle {
    /// The obstacle name is the name of its footprint
    pub fn new(id: ObstacleId, footprint: CsgPolygon, bottom: f32, top: f32) -> Self {
        Self {
            id,
            footprint,
            bottom: bottom.min(top),
            top: bottom.max(top),
        }
    }

    pub fn id(&self) -> ObstacleId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.footprint.name()
    }

    pub fn footprint(&self) -> &CsgPolygon {
        &self.footprint
    }

    pub fn bottom(&self) -> f32 {
        self.bottom
    }

    pub fn top(&self) -> f32 {
        self.top
    }

    /// Footprint grown by the agent radius
    pub fn inflated(&self, agent: &NavMeshAgent) -> CsgPolygon {
        self.footprint.expand(agent.radius)
    }

    /// Plane bounds of the inflated footprint
    pub fn inflated_bounds(&self, agent: &NavMeshAgent) -> Option<(Vec2, Vec2)> {
        self.footprint
            .bounding_box()
            .map(|(min, max)| (min - Vec2::splat(agent.radius * 2.0), max + Vec2::splat(agent.radius * 2.0)))
    }

    /// Whether the obstacle blocks the agent somewhere on the surface
    pub fn affects(&self, surface: &WalkableSurface, agent: &NavMeshAgent) -> bool {
        let (bottom, top) = surface.clearance_range(agent);
        if self.top < bottom || self.bottom > top {
            return false;
        }
        match (self.inflated_bounds(agent), surface.bounding_box()) {
            (Some((amin, amax)), Some((bmin, bmax))) => overlap_bounds_2d(amin, amax, bmin, bmax),
            _ => false,
        }
    }
}
