//! Scene change notifications sent to the worker, and their coalescing.
//!
//! Notifications received during one tick are folded into a
//! [`PendingChanges`]: only the latest state of each obstacle is kept, and a
//! new set of walkable surfaces replaces any previous one.

use navmesh_builder::{Obstacle, ObstacleChange, ObstacleId, WalkableSurface};
use std::collections::BTreeMap;

/// Message sent from the worker handle to the worker thread
#[derive(Debug, Clone)]
pub enum Notification {
    Obstacle(ObstacleChange),
    Surfaces(Vec<WalkableSurface>),
}

/// Changes waiting for the next generation
#[derive(Debug, Default)]
pub struct PendingChanges {
    surfaces: Option<Vec<WalkableSurface>>,
    obstacles: BTreeMap<ObstacleId, ObstacleChange>,
    received: u64,
    coalesced: u64,
}

impl PendingChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_none() && self.obstacles.is_empty()
    }

    /// Notifications received since the last [`take`](Self::take)
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Notifications overridden by a later one since the last
    /// [`take`](Self::take)
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }

    pub fn push(&mut self, notification: Notification) {
        self.received += 1;
        let replaced = match notification {
            Notification::Obstacle(change) => self.obstacles.insert(change.id(), change).is_some(),
            Notification::Surfaces(surfaces) => self.surfaces.replace(surfaces).is_some(),
        };
        if replaced {
            self.coalesced += 1;
        }
    }

    /// Takes the pending changes, leaving this set empty
    pub fn take(&mut self) -> CoalescedChanges {
        let taken = std::mem::take(self);
        CoalescedChanges {
            surfaces: taken.surfaces,
            obstacles: taken.obstacles.into_values().collect(),
        }
    }
}

/// Latest state of every notified object
#[derive(Debug, Default)]
pub struct CoalescedChanges {
    pub surfaces: Option<Vec<WalkableSurface>>,
    pub obstacles: Vec<ObstacleChange>,
}

impl CoalescedChanges {
    /// Applies the obstacle changes to a full obstacle set
    pub fn apply_to(&self, obstacles: &mut BTreeMap<ObstacleId, Obstacle>) {
        for change in &self.obstacles {
            match change {
                ObstacleChange::Added(obstacle) | ObstacleChange::Changed(obstacle) => {
                    obstacles.insert(obstacle.id(), obstacle.clone());
                }
                ObstacleChange::Removed(id) => {
                    obstacles.remove(id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use navmesh_builder::CsgPolygon;

    fn obstacle(id: u32, x: f32) -> Obstacle {
        Obstacle::new(
            ObstacleId(id),
            CsgPolygon::rectangle("crate", Vec2::new(x, 0.0), Vec2::new(x + 1.0, 1.0)),
            0.0,
            1.0,
        )
    }

    #[test]
    fn test_latest_obstacle_state_wins() {
        let mut pending = PendingChanges::new();
        assert!(pending.is_empty());
        pending.push(Notification::Obstacle(ObstacleChange::Added(obstacle(1, 0.0))));
        pending.push(Notification::Obstacle(ObstacleChange::Changed(obstacle(1, 2.0))));
        pending.push(Notification::Obstacle(ObstacleChange::Changed(obstacle(1, 4.0))));
        pending.push(Notification::Obstacle(ObstacleChange::Added(obstacle(2, 0.0))));

        assert_eq!(pending.received(), 4);
        assert_eq!(pending.coalesced(), 2);

        let changes = pending.take();
        assert!(pending.is_empty());
        assert_eq!(pending.received(), 0);
        assert_eq!(changes.obstacles.len(), 2);
        assert_eq!(changes.obstacles[0], ObstacleChange::Changed(obstacle(1, 4.0)));
        assert!(changes.surfaces.is_none());
    }

    #[test]
    fn test_removal_overrides_addition() {
        let mut pending = PendingChanges::new();
        pending.push(Notification::Obstacle(ObstacleChange::Added(obstacle(3, 0.0))));
        pending.push(Notification::Obstacle(ObstacleChange::Removed(ObstacleId(3))));

        let changes = pending.take();
        assert_eq!(changes.obstacles, vec![ObstacleChange::Removed(ObstacleId(3))]);
    }

    #[test]
    fn test_apply_changes_to_obstacle_set() {
        let mut obstacles: BTreeMap<ObstacleId, Obstacle> =
            [obstacle(1, 0.0), obstacle(2, 0.0)].into_iter().map(|o| (o.id(), o)).collect();

        let mut pending = PendingChanges::new();
        pending.push(Notification::Obstacle(ObstacleChange::Removed(ObstacleId(1))));
        pending.push(Notification::Obstacle(ObstacleChange::Changed(obstacle(2, 5.0))));
        pending.push(Notification::Surfaces(Vec::new()));
        let changes = pending.take();
        changes.apply_to(&mut obstacles);

        assert_eq!(obstacles.len(), 1);
        assert_eq!(obstacles[&ObstacleId(2)], obstacle(2, 5.0));
        assert_eq!(changes.surfaces, Some(Vec::new()));
    }
}
