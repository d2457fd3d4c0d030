use crate::boundary::{self, WorldBounds};
use crate::collision::CollisionResolver;
use crate::config::SimConfig;
use crate::engine::{Particle, ParticleSet, RenderAttributes};
use crate::error::ConfigError;
use crate::grid::SpatialGrid;
use crate::integrator;
use crate::profiler::Profiler;
use crate::spawner::ParticleSpawner;
use glam::Vec2;

/// Upper bound on the particle storage reserved at construction; the store
/// grows past it on demand up to `max_particles`
const INITIAL_RESERVE: usize = 4096;

/// Lateral acceleration added per [`AccelCommand::AddLateral`] from the viewer keys
pub const LATERAL_STEP: f32 = 2.0;

/// Discrete input that changes particle accelerations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AccelCommand {
    /// Flip the vertical component
    ReverseGravity,
    /// Add to the horizontal component
    AddLateral(f32),
    /// Replace the acceleration outright
    Set(Vec2),
}

impl AccelCommand {
    pub fn apply(self, accel: Vec2) -> Vec2 {
        match self {
            AccelCommand::ReverseGravity => Vec2::new(accel.x, -accel.y),
            AccelCommand::AddLateral(ax) => Vec2::new(accel.x + ax, accel.y),
            AccelCommand::Set(a) => a,
        }
    }
}

/// What happened during one [`Simulation::step_frame`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub spawned: usize,
    pub substeps: u32,
}

/// The engine: owns the configuration, the particle store, and every
/// per-sub-step component, and threads them through each frame.
///
/// Frame: spawn check, then `substeps` × (integrate, walls, grid rebuild, collide).
#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    bounds: WorldBounds,
    particles: ParticleSet,
    grid: SpatialGrid,
    spawner: ParticleSpawner,
    resolver: CollisionResolver,
    profiler: Profiler,
    /// Acceleration handed to new spawns; follows `AccelCommand`s
    accel: Vec2,
    frame: u64,
}

impl Simulation {
    /// Validate `config`, build every component, and spawn the initial particles.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let grid = SpatialGrid::new(
            config.resolved_cell_size(),
            config.world_min,
            config.world_max,
        )?;
        let spawner = ParticleSpawner::new(&config)?;

        let mut sim = Self {
            bounds: WorldBounds::new(config.world_min, config.world_max),
            particles: ParticleSet::with_capacity(config.max_particles.min(INITIAL_RESERVE)),
            grid,
            spawner,
            resolver: CollisionResolver::new(),
            profiler: Profiler::new(),
            accel: config.gravity,
            frame: 0,
            config,
        };

        let initial = sim.config.spawn.initial;
        sim.spawner.spawn(&mut sim.particles, initial, sim.accel);
        sim.grid.rebuild(&sim.particles);
        log::debug!(
            "simulation ready: {} particles, dt {}, {} sub-steps per frame",
            sim.particles.len(),
            sim.config.dt,
            sim.config.substeps
        );
        Ok(sim)
    }

    /// Advance one rendered frame. `frame_dt` only drives the spawn schedule;
    /// physics always advances `substeps × dt`.
    pub fn step_frame(&mut self, frame_dt: f32) -> FrameReport {
        let spawned = {
            let _timer = self.profiler.scoped("spawn");
            self.spawner
                .tick(&mut self.particles, frame_dt, self.accel)
        };

        let substeps = self.config.substeps;
        for _ in 0..substeps {
            self.substep();
        }
        self.frame += 1;

        FrameReport { spawned, substeps }
    }

    /// One fixed-`dt` physics update. Exposed so a caller can throttle the
    /// number of sub-steps under a frame budget.
    pub fn substep(&mut self) {
        let dt = self.config.dt;
        let damping = self.config.damping;

        self.profiler
            .time("integrate", || integrator::step(&mut self.particles, dt));
        self.profiler.time("boundary", || {
            boundary::resolve(&mut self.particles, &self.bounds, damping)
        });
        self.profiler
            .time("grid_rebuild", || self.grid.rebuild(&self.particles));

        let Self {
            particles,
            grid,
            resolver,
            profiler,
            bounds,
            ..
        } = self;
        let mut stats = profiler.collisions;
        profiler.time("collide", || {
            resolver.resolve(particles, grid, bounds, &mut stats)
        });
        profiler.collisions = stats;
    }

    /// Apply an input command to every live particle and to future spawns.
    pub fn apply_command(&mut self, command: AccelCommand) {
        self.accel = command.apply(self.accel);
        self.particles.map_accelerations(|a| command.apply(a));
        log::debug!("{:?}: spawn acceleration now {}", command, self.accel);
    }

    /// Override one particle's acceleration. Unknown ids are ignored and
    /// reported as `false`.
    pub fn set_acceleration(&mut self, id: usize, accel: Vec2) -> bool {
        let applied = self.particles.set_acceleration(id, accel);
        if !applied {
            log::debug!("set_acceleration: no particle {}", id);
        }
        applied
    }

    /// Spawn `count` particles from the configured region now, ignoring the schedule.
    pub fn spawn(&mut self, count: usize) -> usize {
        self.spawner.spawn(&mut self.particles, count, self.accel)
    }

    /// Append one explicit particle; `Ok(None)` at the cap. A particle too
    /// wide to fit between the walls is rejected.
    pub fn spawn_particle(&mut self, particle: Particle) -> Result<Option<usize>, ConfigError> {
        let extent = self.bounds.max - self.bounds.min;
        if 2.0 * particle.radius >= extent.min_element() {
            return Err(ConfigError::InvalidRadius(particle.radius));
        }
        self.spawner.spawn_particle(&mut self.particles, particle)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn bounds(&self) -> &WorldBounds {
        &self.bounds
    }

    pub fn particles(&self) -> &ParticleSet {
        &self.particles
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Acceleration the next spawned particle will get.
    pub fn spawn_acceleration(&self) -> Vec2 {
        self.accel
    }

    /// Position buffer for the renderer: `x0, y0, x1, y1, ...`.
    pub fn positions_flat(&self) -> &[f32] {
        self.particles.positions_flat()
    }

    pub fn render_attributes(&self) -> &[RenderAttributes] {
        self.particles.render_attributes()
    }

    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }

    pub fn profiler_mut(&mut self) -> &mut Profiler {
        &mut self.profiler
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_compose() {
        let a = Vec2::new(0.0, -9.8);
        assert_eq!(AccelCommand::ReverseGravity.apply(a), Vec2::new(0.0, 9.8));
        assert_eq!(AccelCommand::AddLateral(2.0).apply(a), Vec2::new(2.0, -9.8));
        assert_eq!(AccelCommand::Set(Vec2::ONE).apply(a), Vec2::ONE);
    }

    #[test]
    fn new_spawns_initial_particles() {
        let sim = Simulation::new(SimConfig::default()).unwrap();
        assert_eq!(sim.len(), SimConfig::default().spawn.initial);
        assert_eq!(sim.positions_flat().len(), 2 * sim.len());
        assert_eq!(sim.render_attributes().len(), sim.len());
    }

    #[test]
    fn huge_particle_cap_does_not_reserve_up_front() {
        let config = SimConfig {
            max_particles: usize::MAX / 2,
            ..SimConfig::default()
        };
        let mut sim = Simulation::new(config).unwrap();
        assert_eq!(sim.len(), SimConfig::default().spawn.initial);
        assert_eq!(sim.spawn(3), 3);
    }

    #[test]
    fn particle_wider_than_world_rejected() {
        let mut config = SimConfig::default();
        config.spawn.initial = 0;
        let mut sim = Simulation::new(config).unwrap();

        let err = sim
            .spawn_particle(Particle::at_rest(Vec2::ZERO, 1.5))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRadius(r) if r == 1.5));
        assert!(sim
            .spawn_particle(Particle::at_rest(Vec2::ZERO, 1.0))
            .is_err());
        assert!(sim.is_empty());
    }

    #[test]
    fn invalid_config_fails_fast() {
        let config = SimConfig {
            world_max: Vec2::splat(-2.0),
            ..SimConfig::default()
        };
        assert!(Simulation::new(config).is_err());
    }

    #[test]
    fn step_frame_runs_every_substep() {
        let mut sim = Simulation::new(SimConfig::default()).unwrap();
        let report = sim.step_frame(1.0 / 60.0);
        assert_eq!(report.substeps, SimConfig::default().substeps);
        assert_eq!(sim.frame(), 1);
        let integrate = sim.profiler().summary("integrate").unwrap();
        assert_eq!(integrate.calls, report.substeps as usize);
        assert!(sim.profiler().summary("collide").is_some());
        assert_eq!(sim.profiler().summary("spawn").unwrap().calls, 1);
    }

    #[test]
    fn command_updates_live_and_future_particles() {
        let mut sim = Simulation::new(SimConfig::default()).unwrap();
        sim.apply_command(AccelCommand::ReverseGravity);

        assert!(sim
            .particles()
            .accelerations()
            .iter()
            .all(|a| *a == Vec2::new(0.0, 9.8)));
        assert_eq!(sim.spawn_acceleration(), Vec2::new(0.0, 9.8));

        sim.spawn(1);
        let last = sim.len() - 1;
        assert_eq!(sim.particles().accelerations()[last], Vec2::new(0.0, 9.8));
    }
}
