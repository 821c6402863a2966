//! Pathfinding configuration

use navmesh_common::{Error, Result};

/// Default multiplier applied to the traversal cost of jump links
pub const DEFAULT_JUMP_COST_FACTOR: f32 = 2.0;

/// Default cell size of the grid locating the triangle under a point
pub const DEFAULT_LOCATE_CELL_SIZE: f32 = 4.0;

/// Parameters of the A* search
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct PathfindingConfig {
    /// Multiplier of the centroid distance when crossing a jump link.
    /// Must be greater than 1 so walking is preferred over an equivalent jump.
    pub jump_cost_factor: f32,
    /// Cell size of the grid used to find the triangle under a point
    pub locate_cell_size: f32,
}

impl Default for PathfindingConfig {
    fn default() -> Self {
        Self {
            jump_cost_factor: DEFAULT_JUMP_COST_FACTOR,
            locate_cell_size: DEFAULT_LOCATE_CELL_SIZE,
        }
    }
}

impl PathfindingConfig {
    pub fn with_jump_cost_factor(mut self, jump_cost_factor: f32) -> Self {
        self.jump_cost_factor = jump_cost_factor;
        self
    }

    pub fn with_locate_cell_size(mut self, locate_cell_size: f32) -> Self {
        self.locate_cell_size = locate_cell_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.jump_cost_factor.is_finite() || self.jump_cost_factor <= 1.0 {
            return Err(Error::InvalidConfig(format!(
                "jump cost factor must be greater than 1, got {}",
                self.jump_cost_factor
            )));
        }
        if !(self.locate_cell_size > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "locate cell size must be positive, got {}",
                self.locate_cell_size
            )));
        }
        Ok(())
    }
}
