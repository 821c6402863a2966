//! Configuration for navigation mesh generation

use navmesh_common::{Error, NavMeshAgent, Result, SimplificationConfig};

use crate::csg::CsgOptions;

/// Cosine of 80 degrees: a jump must leave and enter the linked edges within
/// 80 degrees of their normals
pub const DEFAULT_JUMP_FIELD_OF_VIEW_COS: f32 = 0.173_648_18;

/// Parameters of edge link detection
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct EdgeLinkConfig {
    /// Maximum horizontal jump length (0 disables jump links)
    pub jump_max_distance: f32,
    /// Maximum height difference covered by a jump
    pub jump_max_height: f32,
    /// Distance between two samples along a start edge
    pub sample_spacing: f32,
    /// Cosine of the half field of view a jump direction must stay within
    pub field_of_view_cos: f32,
    /// Minimum absolute cosine between two edges to consider them parallel
    pub parallel_tolerance_cos: f32,
    /// Links covering less than this squared length of the start edge are ignored
    pub min_link_length_sq: f32,
}

impl Default for EdgeLinkConfig {
    fn default() -> Self {
        Self {
            jump_max_distance: 1.5,
            jump_max_height: 0.5,
            sample_spacing: 1.0,
            field_of_view_cos: DEFAULT_JUMP_FIELD_OF_VIEW_COS,
            parallel_tolerance_cos: 0.866_025_4, // 30 degrees
            min_link_length_sq: 0.02,
        }
    }
}

impl EdgeLinkConfig {
    pub fn new(jump_max_distance: f32, jump_max_height: f32) -> Self {
        Self {
            jump_max_distance,
            jump_max_height,
            ..Default::default()
        }
    }

    /// Jump limits taken from the agent
    pub fn from_agent(agent: &NavMeshAgent) -> Self {
        Self::new(agent.jump_distance, agent.jump_height)
    }

    pub fn with_sample_spacing(mut self, sample_spacing: f32) -> Self {
        self.sample_spacing = sample_spacing;
        self
    }

    pub fn with_parallel_tolerance_cos(mut self, parallel_tolerance_cos: f32) -> Self {
        self.parallel_tolerance_cos = parallel_tolerance_cos;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.jump_max_distance >= 0.0) || !(self.jump_max_height >= 0.0) {
            return Err(Error::InvalidConfig(
                "jump limits must be non-negative".to_string(),
            ));
        }
        if !(self.sample_spacing > 0.0) {
            return Err(Error::InvalidConfig(
                "sample spacing must be positive".to_string(),
            ));
        }
        if !(self.field_of_view_cos >= 0.0 && self.field_of_view_cos < 1.0) {
            return Err(Error::InvalidConfig(
                "field of view cosine must be in [0, 1)".to_string(),
            ));
        }
        if !(self.parallel_tolerance_cos >= 0.0 && self.parallel_tolerance_cos <= 1.0) {
            return Err(Error::InvalidConfig(
                "parallel tolerance cosine must be in [0, 1]".to_string(),
            ));
        }
        if !(self.min_link_length_sq >= 0.0) {
            return Err(Error::InvalidConfig(
                "minimum link length must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration of the navigation mesh generator
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NavMeshConfig {
    pub agent: NavMeshAgent,
    pub simplification: SimplificationConfig,
    /// Welding tolerance and walk limit of the polygon boolean operations
    pub csg: CsgOptions,
    pub link: EdgeLinkConfig,
    /// Cell size of the spatial grid used to find nearby edges
    pub grid_cell_size: f32,
}

impl Default for NavMeshConfig {
    fn default() -> Self {
        Self::new(NavMeshAgent::default())
    }
}

impl NavMeshConfig {
    /// Creates a configuration whose jump limits follow the agent
    pub fn new(agent: NavMeshAgent) -> Self {
        Self {
            agent,
            simplification: SimplificationConfig::default(),
            csg: CsgOptions::default(),
            link: EdgeLinkConfig::from_agent(&agent),
            grid_cell_size: 4.0,
        }
    }

    pub fn with_simplification(mut self, simplification: SimplificationConfig) -> Self {
        self.simplification = simplification;
        self
    }

    pub fn with_csg(mut self, csg: CsgOptions) -> Self {
        self.csg = csg;
        self
    }

    pub fn with_link(mut self, link: EdgeLinkConfig) -> Self {
        self.link = link;
        self
    }

    pub fn with_grid_cell_size(mut self, grid_cell_size: f32) -> Self {
        self.grid_cell_size = grid_cell_size;
        self
    }

    /// Validates the configuration parameters
    pub fn validate(&self) -> Result<()> {
        self.agent.validate()?;
        self.simplification.validate()?;
        self.link.validate()?;
        if !(self.csg.tolerance > 0.0) {
            return Err(Error::InvalidConfig(
                "CSG tolerance must be positive".to_string(),
            ));
        }
        if self.csg.max_walk_steps == 0 {
            return Err(Error::InvalidConfig(
                "CSG walk step limit must be at least 1".to_string(),
            ));
        }
        if !(self.grid_cell_size > 0.0) {
            return Err(Error::InvalidConfig(
                "grid cell size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
