//! Navigation mesh builder
//!
//! Turns walkable surfaces and obstacle footprints into a linked navigation
//! mesh: obstacles are subtracted from the surfaces with polygon boolean
//! operations, the remaining polygons are split into monotone pieces and
//! triangulated, then boundary edges of different polygons are linked with
//! direct or jump links.

mod config;
pub mod csg;
mod edge_grid;
mod edge_link;
mod generator;
mod monotone_polygon;
mod surface;
mod terrain;
mod triangulation;

pub use config::{EdgeLinkConfig, NavMeshConfig, DEFAULT_JUMP_FIELD_OF_VIEW_COS};
pub use csg::{CsgOptions, CsgPolygon};
pub use edge_grid::EdgeGrid;
pub use edge_link::{EdgeLinkDetection, EdgeLinkResult, EdgeLinker};
pub use generator::{NavMeshGenerator, ObstacleChange};
pub use monotone_polygon::{MonotonePolygon, MonotonePolygonAlgorithm};
pub use surface::{Obstacle, ObstacleId, WalkableSurface};
pub use terrain::TerrainSurface;
pub use triangulation::{build_nav_triangles, TriangulationAlgorithm};
