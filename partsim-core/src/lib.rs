//! 2D particle engine: position-Verlet integration, wall containment, and
//! grid-accelerated circle collisions over a struct-of-arrays particle store.

pub mod boundary;
pub mod collision;
pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod integrator;
pub mod profiler;
pub mod runtime;
pub mod spawner;

pub use boundary::WorldBounds;
pub use collision::CollisionResolver;
pub use config::{SimConfig, SpawnConfig, SpawnTrigger};
pub use engine::{Particle, ParticleSet, RenderAttributes};
pub use error::ConfigError;
pub use grid::SpatialGrid;
pub use profiler::{CollisionStats, Profiler, ScopedTimer, TimingSummary};
pub use runtime::{AccelCommand, FrameReport, Simulation};
pub use spawner::ParticleSpawner;
