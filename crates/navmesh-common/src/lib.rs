//! Common utilities and data structures shared by the navigation mesh builder,
//! the path query layer and the dynamic worker.

mod agent;
mod geometry;
mod nav_mesh;
mod polygon_simplification;

pub use agent::*;
pub use geometry::*;
pub use nav_mesh::*;
pub use polygon_simplification::*;

/// Represents a 3D position (Y-up)
pub type Vec3 = glam::Vec3;

/// Represents a point on the walking plane, see [`to_plane`]
pub type Vec2 = glam::Vec2;

/// Error types for the library
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("navigation mesh generation failed: {0}")]
    Generation(String),

    #[error("pathfinding failed: {0}")]
    Pathfinding(String),

    #[error("navigation mesh worker error: {0}")]
    Worker(String),
}

/// Result type for navigation mesh operations
pub type Result<T> = std::result::Result<T, Error>;
