//! Startup configuration for a simulation run.
//!
//! Every field has a default, so a JSON file only needs to name what it changes:
//!
//! ```json
//! { "substeps": 4, "spawn": { "batch": 3, "trigger": { "every_frames": { "frames": 2 } } } }
//! ```

use crate::error::ConfigError;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Defaults for the falling-particles demo.
pub mod consts {
    /// Fixed integration timestep (8 sub-steps of a 60 Hz frame)
    pub const DEFAULT_DT: f32 = 1.0 / 480.0;
    pub const DEFAULT_SUBSTEPS: u32 = 8;
    pub const DEFAULT_RADIUS: f32 = 0.05;
    pub const DEFAULT_DAMPING: f32 = 0.8;
    pub const DEFAULT_GRAVITY: f32 = -9.8;
    pub const DEFAULT_MAX_PARTICLES: usize = 300;
    pub const DEFAULT_INITIAL_PARTICLES: usize = 5;
    pub const DEFAULT_SPAWN_INTERVAL: f32 = 0.1;
    /// Spawn catch-up limit so one long frame cannot flood the world
    pub const DEFAULT_MAX_BATCHES_PER_FRAME: u32 = 4;
}

/// When the spawner fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnTrigger {
    /// Every `seconds` of accumulated frame time
    Interval { seconds: f32 },
    /// Every `frames` rendered frames
    EveryFrames { frames: u32 },
}

impl Default for SpawnTrigger {
    fn default() -> Self {
        SpawnTrigger::Interval {
            seconds: consts::DEFAULT_SPAWN_INTERVAL,
        }
    }
}

/// Initial kinematic state and cadence of spawned particles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub trigger: SpawnTrigger,
    /// Particles appended per trigger
    pub batch: usize,
    /// Particles appended when the simulation is built
    pub initial: usize,
    /// Centre of the spawn region
    pub position: Vec2,
    /// Half-width of the uniform square around `position`
    pub position_jitter: f32,
    /// Initial velocity in world units per second
    pub velocity: Vec2,
    /// Half-width of the uniform velocity perturbation per axis
    pub velocity_jitter: f32,
    pub radius: f32,
    pub max_batches_per_frame: u32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            trigger: SpawnTrigger::default(),
            batch: 1,
            initial: consts::DEFAULT_INITIAL_PARTICLES,
            position: Vec2::new(0.0, 0.5),
            position_jitter: 0.3,
            velocity: Vec2::ZERO,
            velocity_jitter: 2.0,
            radius: consts::DEFAULT_RADIUS,
            max_batches_per_frame: consts::DEFAULT_MAX_BATCHES_PER_FRAME,
        }
    }
}

/// Configuration fixed for the lifetime of a [`crate::Simulation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub world_min: Vec2,
    pub world_max: Vec2,
    /// Fraction of implicit velocity kept on a wall bounce, in `[0, 1]`
    pub damping: f32,
    /// Spatial grid cell edge; `None` means `2 × spawn.radius`
    pub cell_size: Option<f32>,
    /// Fixed integration timestep
    pub dt: f32,
    pub substeps: u32,
    pub max_particles: usize,
    /// Acceleration given to every particle at spawn
    pub gravity: Vec2,
    pub seed: u64,
    pub spawn: SpawnConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            world_min: Vec2::splat(-1.0),
            world_max: Vec2::splat(1.0),
            damping: consts::DEFAULT_DAMPING,
            cell_size: None,
            dt: consts::DEFAULT_DT,
            substeps: consts::DEFAULT_SUBSTEPS,
            max_particles: consts::DEFAULT_MAX_PARTICLES,
            gravity: Vec2::new(0.0, consts::DEFAULT_GRAVITY),
            seed: 0,
            spawn: SpawnConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json_str(&source)
    }

    /// Grid cell size after applying the default.
    pub fn resolved_cell_size(&self) -> f32 {
        self.cell_size.unwrap_or(2.0 * self.spawn.radius)
    }

    /// Reject any configuration the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite_bounds = self.world_min.is_finite() && self.world_max.is_finite();
        if !finite_bounds
            || self.world_max.x <= self.world_min.x
            || self.world_max.y <= self.world_min.y
        {
            return Err(ConfigError::InvalidBounds {
                min_x: self.world_min.x,
                min_y: self.world_min.y,
                max_x: self.world_max.x,
                max_y: self.world_max.y,
            });
        }
        if !(0.0..=1.0).contains(&self.damping) {
            return Err(ConfigError::parameter(format!(
                "damping must lie in [0, 1], got {}",
                self.damping
            )));
        }
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(ConfigError::parameter(format!(
                "dt must be finite and > 0, got {}",
                self.dt
            )));
        }
        if self.substeps == 0 {
            return Err(ConfigError::parameter("substeps must be at least 1"));
        }
        if !self.gravity.is_finite() {
            return Err(ConfigError::parameter("gravity must be finite"));
        }

        let radius = self.spawn.radius;
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ConfigError::InvalidRadius(radius));
        }
        let extent = self.world_max - self.world_min;
        if 2.0 * radius >= extent.min_element() {
            return Err(ConfigError::parameter(format!(
                "spawn radius {} does not fit inside the world",
                radius
            )));
        }

        let cell_size = self.resolved_cell_size();
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(ConfigError::InvalidCellSize(cell_size));
        }
        if cell_size < 2.0 * radius {
            log::warn!(
                "cell size {} is below 2 × radius ({}); broad phase may miss contacts",
                cell_size,
                2.0 * radius
            );
        }

        match self.spawn.trigger {
            SpawnTrigger::Interval { seconds } if !seconds.is_finite() || seconds <= 0.0 => {
                return Err(ConfigError::parameter(format!(
                    "spawn interval must be finite and > 0, got {}",
                    seconds
                )));
            }
            SpawnTrigger::EveryFrames { frames: 0 } => {
                return Err(ConfigError::parameter("spawn frame period must be at least 1"));
            }
            _ => {}
        }
        if self.spawn.max_batches_per_frame == 0 {
            return Err(ConfigError::parameter(
                "spawn max_batches_per_frame must be at least 1",
            ));
        }
        let spawn = &self.spawn;
        if !spawn.position.is_finite() || !spawn.velocity.is_finite() {
            return Err(ConfigError::parameter(
                "spawn position and velocity must be finite",
            ));
        }
        let jitter_ok = |j: f32| j.is_finite() && j >= 0.0;
        if !jitter_ok(spawn.position_jitter) || !jitter_ok(spawn.velocity_jitter) {
            return Err(ConfigError::parameter("spawn jitter must be >= 0"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.resolved_cell_size(), 0.1);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = SimConfig::from_json_str(
            r#"{ "substeps": 4, "spawn": { "batch": 3, "trigger": { "every_frames": { "frames": 2 } } } }"#,
        )
        .unwrap();
        assert_eq!(config.substeps, 4);
        assert_eq!(config.spawn.batch, 3);
        assert_eq!(config.spawn.trigger, SpawnTrigger::EveryFrames { frames: 2 });
        assert_eq!(config.spawn.radius, consts::DEFAULT_RADIUS);
        assert_eq!(config.world_max, Vec2::splat(1.0));
    }

    #[test]
    fn vectors_parse_as_pairs() {
        let config =
            SimConfig::from_json_str(r#"{ "world_min": [-2.0, -1.0], "gravity": [1.0, 0.0] }"#)
                .unwrap();
        assert_eq!(config.world_min, Vec2::new(-2.0, -1.0));
        assert_eq!(config.gravity, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn inverted_bounds_rejected() {
        let config = SimConfig {
            world_min: Vec2::new(1.0, -1.0),
            world_max: Vec2::new(-1.0, 1.0),
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn non_positive_cell_size_rejected() {
        let config = SimConfig {
            cell_size: Some(0.0),
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCellSize(_))
        ));
    }

    #[test]
    fn zero_batches_per_frame_rejected() {
        let mut config = SimConfig::default();
        config.spawn.max_batches_per_frame = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_batches_per_frame"));
    }

    #[test]
    fn non_positive_radius_rejected() {
        let mut config = SimConfig::default();
        config.spawn.radius = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRadius(_))));
    }

    #[test]
    fn damping_out_of_range_rejected() {
        let config = SimConfig {
            damping: 1.5,
            ..SimConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("damping"));
    }

    #[test]
    fn zero_substeps_rejected() {
        let config = SimConfig {
            substeps: 0,
            ..SimConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = SimConfig::from_json_str("{ \"dt\": ").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
