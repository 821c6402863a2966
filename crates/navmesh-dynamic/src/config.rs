use navmesh_builder::NavMeshConfig;
use navmesh_common::{Error, NavMeshAgent, Result};
use navmesh_query::PathfindingConfig;
use std::time::Duration;

/// Default period of the worker loop
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NavMeshWorkerConfig {
    /// Period of the worker loop; notifications received during one tick
    /// are applied together
    pub tick_interval: Duration,
    pub navmesh: NavMeshConfig,
    pub pathfinding: PathfindingConfig,
}

impl Default for NavMeshWorkerConfig {
    fn default() -> Self {
        Self::new(NavMeshAgent::default())
    }
}

impl NavMeshWorkerConfig {
    pub fn new(agent: NavMeshAgent) -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            navmesh: NavMeshConfig::new(agent),
            pathfinding: PathfindingConfig::default(),
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn with_navmesh(mut self, navmesh: NavMeshConfig) -> Self {
        self.navmesh = navmesh;
        self
    }

    pub fn with_pathfinding(mut self, pathfinding: PathfindingConfig) -> Self {
        self.pathfinding = pathfinding;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval.is_zero() {
            return Err(Error::InvalidConfig(
                "worker tick interval must be greater than zero".to_string(),
            ));
        }
        self.navmesh.validate()?;
        self.pathfinding.validate()
    }
}
