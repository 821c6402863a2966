use crate::{Error, Result};

/// Movement parameters of the agent the navigation mesh is built for.
///
/// Changing any of these values invalidates every generated mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NavMeshAgent {
    /// Radius used to inflate obstacle footprints
    pub radius: f32,
    /// Height of the agent, obstacles above this clearance are ignored
    pub height: f32,
    /// Maximum walkable slope in degrees
    pub max_slope_degrees: f32,
    /// Maximum horizontal jump distance (0 disables jump links)
    pub jump_distance: f32,
    /// Maximum height difference a jump can cover
    pub jump_height: f32,
}

impl Default for NavMeshAgent {
    fn default() -> Self {
        Self {
            radius: 0.25,
            height: 2.0,
            max_slope_degrees: 45.0,
            jump_distance: 1.5,
            jump_height: 0.5,
        }
    }
}

impl NavMeshAgent {
    pub fn new(radius: f32, height: f32) -> Self {
        Self {
            radius,
            height,
            ..Default::default()
        }
    }

    pub fn with_max_slope_degrees(mut self, max_slope_degrees: f32) -> Self {
        self.max_slope_degrees = max_slope_degrees;
        self
    }

    pub fn with_jump(mut self, jump_distance: f32, jump_height: f32) -> Self {
        self.jump_distance = jump_distance;
        self.jump_height = jump_height;
        self
    }

    pub fn max_slope_radians(&self) -> f32 {
        self.max_slope_degrees.to_radians()
    }

    pub fn can_jump(&self) -> bool {
        self.jump_distance > 0.0
    }

    /// Validate the agent parameters
    pub fn validate(&self) -> Result<()> {
        if !(self.radius >= 0.0) {
            return Err(Error::InvalidConfig(
                "agent radius must be non-negative".to_string(),
            ));
        }
        if !(self.height > 0.0) {
            return Err(Error::InvalidConfig(
                "agent height must be positive".to_string(),
            ));
        }
        if !(self.max_slope_degrees > 0.0 && self.max_slope_degrees < 90.0) {
            return Err(Error::InvalidConfig(
                "agent max slope must be in (0, 90) degrees".to_string(),
            ));
        }
        if !(self.jump_distance >= 0.0) || !(self.jump_height >= 0.0) {
            return Err(Error::InvalidConfig(
                "agent jump parameters must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_agent_is_valid() {
        assert!(NavMeshAgent::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_agents() {
        assert!(NavMeshAgent::new(-1.0, 2.0).validate().is_err());
        assert!(NavMeshAgent::new(0.0, 0.0).validate().is_err());
        assert!(NavMeshAgent::default()
            .with_max_slope_degrees(95.0)
            .validate()
            .is_err());
        assert!(NavMeshAgent::default()
            .with_jump(f32::NAN, 1.0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_jump_disabled() {
        let agent = NavMeshAgent::new(0.0, 2.0).with_jump(0.0, 0.0);
        assert!(agent.validate().is_ok());
        assert!(!agent.can_jump());
    }
}
