//! Path queries over navigation meshes
//!
//! Paths are searched with A* over the triangles of a [`NavMesh`] snapshot,
//! following direct and jump links, then pulled taut through the crossed
//! portals with the funnel algorithm.
//!
//! # Example
//!
//! ```rust,no_run
//! use glam::Vec3;
//! use navmesh_common::NavMesh;
//! use navmesh_query::{NavMeshQuery, PathfindingConfig};
//!
//! # fn example(nav_mesh: &NavMesh) -> navmesh_common::Result<()> {
//! let query = NavMeshQuery::new(nav_mesh, PathfindingConfig::default())?;
//! let path = query.find_path(Vec3::new(0.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 3.0));
//! if path.is_empty() {
//!     println!("no path");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`NavMesh`]: navmesh_common::NavMesh

mod config;
mod funnel;
mod nav_mesh_query;
mod node_pool;
mod path_portal;
mod triangle_grid;

pub use config::{PathfindingConfig, DEFAULT_JUMP_COST_FACTOR, DEFAULT_LOCATE_CELL_SIZE};
pub use funnel::funnel;
pub use nav_mesh_query::{NavMeshQuery, PathPoint};
pub use node_pool::{HeapNode, NodePool, NodeState, RouteStep, SearchNode};
pub use path_portal::{PathPortal, PortalKind};
pub use triangle_grid::TriangleGrid;
