//! Background navigation mesh generation
//!
//! This crate runs the navigation mesh generator on a dedicated worker
//! thread. The worker ticks at a fixed interval, folds the scene change
//! notifications received during a tick into one incremental regeneration
//! and publishes every result as an immutable snapshot.
//!
//! # Example
//!
//! ```rust,no_run
//! use glam::{Vec2, Vec3};
//! use navmesh_builder::{CsgPolygon, Obstacle, ObstacleId, WalkableSurface};
//! use navmesh_dynamic::{NavMeshWorker, NavMeshWorkerConfig};
//!
//! # fn example() -> navmesh_common::Result<()> {
//! let mut worker = NavMeshWorker::new(NavMeshWorkerConfig::default())?;
//! let floor = CsgPolygon::rectangle("floor", Vec2::new(-10.0, -10.0), Vec2::new(10.0, 10.0));
//! worker.start(vec![WalkableSurface::flat(floor, 0.0)], Vec::new())?;
//!
//! // Fire-and-forget: the worker picks the change up on its next tick
//! let footprint = CsgPolygon::rectangle("crate", Vec2::new(-1.0, -1.0), Vec2::new(1.0, 1.0));
//! worker.notify_obstacle_added(Obstacle::new(ObstacleId(1), footprint, 0.0, 1.0));
//!
//! let path = worker.find_path(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0));
//! println!("{} waypoint(s) on mesh {}", path.len(), worker.update_id());
//! worker.stop();
//! # Ok(())
//! # }
//! ```

mod config;
mod notification;
mod worker;

pub use config::{NavMeshWorkerConfig, DEFAULT_TICK_INTERVAL};
pub use notification::{CoalescedChanges, Notification, PendingChanges};
pub use worker::{NavMeshWorker, WorkerStatistics};
