//! Background navigation mesh worker
//!
//! The worker thread owns the [`NavMeshGenerator`] and every piece of mutable
//! build state. Callers talk to it through fire-and-forget notifications and
//! only ever receive shared, immutable [`NavMesh`] snapshots: publishing a
//! new snapshot is a pointer swap under a short write lock, so a reader
//! holding an older snapshot is never affected by a concurrent generation.

use glam::Vec3;
use navmesh_builder::{NavMeshGenerator, Obstacle, ObstacleChange, ObstacleId, WalkableSurface};
use navmesh_common::{Error, NavMesh, NavMeshStatistics, Result};
use navmesh_query::NavMeshQuery;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread;
use std::time::Duration;
use web_time::Instant;

use crate::config::NavMeshWorkerConfig;
use crate::notification::{Notification, PendingChanges};

/// Counters of the worker
#[derive(Debug, Clone, Default)]
pub struct WorkerStatistics {
    /// Number of navigation meshes published
    pub generation_count: u64,
    /// Duration of the last generation
    pub last_generation_duration: Option<Duration>,
    /// When the last navigation mesh was published
    pub last_generation_at: Option<Instant>,
    /// Notifications received by the worker thread
    pub notification_count: u64,
    /// Notifications dropped because a later one replaced them
    pub coalesced_notification_count: u64,
    /// Content of the last published navigation mesh
    pub nav_mesh: NavMeshStatistics,
}

/// State shared between the handle and the worker thread
#[derive(Debug, Default)]
struct SharedState {
    nav_mesh: RwLock<Arc<NavMesh>>,
    keep_running: AtomicBool,
    paused: AtomicBool,
    statistics: Mutex<WorkerStatistics>,
}

impl SharedState {
    fn snapshot(&self) -> Arc<NavMesh> {
        self.nav_mesh
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Statistics are updated before the swap so that a reader seeing the new
    /// update id also sees its statistics
    fn publish(&self, nav_mesh: NavMesh, duration: Duration) {
        {
            let mut statistics = self.statistics.lock().unwrap_or_else(PoisonError::into_inner);
            statistics.generation_count += 1;
            statistics.last_generation_duration = Some(duration);
            statistics.last_generation_at = Some(Instant::now());
            statistics.nav_mesh = nav_mesh.statistics();
        }
        *self.nav_mesh.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(nav_mesh);
    }

    fn record_notifications(&self, pending: &PendingChanges) {
        let mut statistics = self.statistics.lock().unwrap_or_else(PoisonError::into_inner);
        statistics.notification_count += pending.received();
        statistics.coalesced_notification_count += pending.coalesced();
    }
}

/// Handle on the background navigation mesh worker
#[derive(Debug)]
pub struct NavMeshWorker {
    config: NavMeshWorkerConfig,
    shared: Arc<SharedState>,
    /// Generator handed back by the worker thread when it stops
    generator: Option<NavMeshGenerator>,
    sender: Option<Sender<Notification>>,
    thread: Option<thread::JoinHandle<NavMeshGenerator>>,
}

impl NavMeshWorker {
    pub fn new(config: NavMeshWorkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            shared: Arc::new(SharedState::default()),
            generator: None,
            sender: None,
            thread: None,
        })
    }

    pub fn config(&self) -> &NavMeshWorkerConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Starts the worker thread, which first runs a full generation over the
    /// given surfaces and obstacles. Update ids keep increasing across a
    /// stop and a restart.
    pub fn start(&mut self, surfaces: Vec<WalkableSurface>, obstacles: Vec<Obstacle>) -> Result<()> {
        if self.thread.is_some() {
            return Err(Error::Worker("worker already started".to_string()));
        }
        let generator = match self.generator.take() {
            Some(generator) => generator,
            None => NavMeshGenerator::new(self.config.navmesh)?,
        };
        let (sender, receiver) = mpsc::channel();
        self.shared.keep_running.store(true, Ordering::SeqCst);

        let shared = Arc::clone(&self.shared);
        let tick_interval = self.config.tick_interval;
        let handle = thread::Builder::new()
            .name("navmesh-worker".to_string())
            .spawn(move || {
                let worker = WorkerLoop {
                    generator,
                    receiver,
                    shared,
                    tick_interval,
                };
                worker.run(surfaces, obstacles)
            })
            .map_err(|err| Error::Worker(format!("failed to spawn worker thread: {}", err)))?;

        log::debug!("Navigation mesh worker started");
        self.sender = Some(sender);
        self.thread = Some(handle);
        Ok(())
    }

    /// Stops the worker thread and waits for it. The last published
    /// navigation mesh stays available.
    pub fn stop(&mut self) {
        self.shared.keep_running.store(false, Ordering::SeqCst);
        self.sender = None;
        if let Some(handle) = self.thread.take() {
            match handle.join() {
                Ok(generator) => {
                    self.generator = Some(generator);
                    log::debug!("Navigation mesh worker stopped");
                }
                Err(_) => log::error!("Navigation mesh worker thread panicked"),
            }
        }
    }

    /// Suspends generation; notifications keep accumulating
    pub fn pause(&self) {
        self.shared.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.shared.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::SeqCst)
    }

    pub fn notify_obstacle_added(&self, obstacle: Obstacle) {
        self.notify(Notification::Obstacle(ObstacleChange::Added(obstacle)));
    }

    pub fn notify_obstacle_changed(&self, obstacle: Obstacle) {
        self.notify(Notification::Obstacle(ObstacleChange::Changed(obstacle)));
    }

    pub fn notify_obstacle_removed(&self, id: ObstacleId) {
        self.notify(Notification::Obstacle(ObstacleChange::Removed(id)));
    }

    /// Replaces the walkable surfaces, which triggers a full generation
    pub fn notify_surfaces_changed(&self, surfaces: Vec<WalkableSurface>) {
        self.notify(Notification::Surfaces(surfaces));
    }

    fn notify(&self, notification: Notification) {
        let Some(sender) = &self.sender else {
            log::warn!("Navigation mesh worker not running, notification dropped");
            return;
        };
        if sender.send(notification).is_err() {
            log::error!("Navigation mesh worker is gone, notification dropped");
        }
    }

    /// Update id of the last published navigation mesh, 0 before the first one
    pub fn update_id(&self) -> u64 {
        self.shared.snapshot().update_id()
    }

    pub fn statistics(&self) -> WorkerStatistics {
        self.shared
            .statistics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Shared handle on the last published navigation mesh
    pub fn copy_last_generated_nav_mesh(&self) -> Arc<NavMesh> {
        self.shared.snapshot()
    }

    /// Finds a path on the last published navigation mesh. An empty path
    /// means there is none.
    pub fn find_path(&self, start: Vec3, end: Vec3) -> Vec<Vec3> {
        let nav_mesh = self.shared.snapshot();
        match NavMeshQuery::new(&nav_mesh, self.config.pathfinding) {
            Ok(query) => query.find_path(start, end),
            Err(err) => {
                log::error!("Cannot query navigation mesh: {}", err);
                Vec::new()
            }
        }
    }
}

impl Drop for NavMeshWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Body of the worker thread
struct WorkerLoop {
    generator: NavMeshGenerator,
    receiver: Receiver<Notification>,
    shared: Arc<SharedState>,
    tick_interval: Duration,
}

impl WorkerLoop {
    /// Runs until stopped, then gives the generator back
    fn run(mut self, surfaces: Vec<WalkableSurface>, obstacles: Vec<Obstacle>) -> NavMeshGenerator {
        let start = Instant::now();
        let nav_mesh = self.generator.generate(surfaces, obstacles);
        self.shared.publish(nav_mesh, start.elapsed());

        let mut pending = PendingChanges::new();
        while self.shared.keep_running.load(Ordering::SeqCst) {
            let tick_start = Instant::now();

            loop {
                match self.receiver.try_recv() {
                    Ok(notification) => pending.push(notification),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        log::debug!("Navigation mesh worker handle dropped, exiting");
                        return self.generator;
                    }
                }
            }

            if !pending.is_empty() && !self.shared.paused.load(Ordering::SeqCst) {
                self.shared.record_notifications(&pending);
                self.apply(&mut pending);
            }

            let elapsed = tick_start.elapsed();
            if elapsed < self.tick_interval {
                thread::sleep(self.tick_interval - elapsed);
            }
        }
        self.generator
    }

    fn apply(&mut self, pending: &mut PendingChanges) {
        let mut changes = pending.take();
        let start = Instant::now();
        let nav_mesh = match changes.surfaces.take() {
            Some(surfaces) => {
                let mut obstacles: BTreeMap<ObstacleId, Obstacle> =
                    self.generator.obstacles().map(|o| (o.id(), o.clone())).collect();
                changes.apply_to(&mut obstacles);
                self.generator.generate(surfaces, obstacles.into_values().collect())
            }
            None => {
                let previous = self.shared.snapshot();
                self.generator.regenerate(&previous, changes.obstacles)
            }
        };
        self.shared.publish(nav_mesh, start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_not_started() {
        let worker = NavMeshWorker::new(NavMeshWorkerConfig::default()).unwrap();
        assert!(!worker.is_running());
        assert!(!worker.is_paused());
        assert_eq!(worker.update_id(), 0);
        assert!(worker.copy_last_generated_nav_mesh().is_empty());
        assert!(worker.find_path(Vec3::ZERO, Vec3::X).is_empty());
        assert_eq!(worker.statistics().generation_count, 0);
        // Dropped with a warning
        worker.notify_obstacle_removed(ObstacleId(1));
    }

    #[test]
    fn test_pause_and_resume() {
        let worker = NavMeshWorker::new(NavMeshWorkerConfig::default()).unwrap();
        worker.pause();
        assert!(worker.is_paused());
        worker.resume();
        assert!(!worker.is_paused());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = NavMeshWorkerConfig::default().with_tick_interval(Duration::ZERO);
        assert!(NavMeshWorker::new(config).is_err());
    }
}
