use crate::config::{SimConfig, SpawnConfig, SpawnTrigger};
use crate::engine::{Particle, ParticleSet};
use crate::error::ConfigError;
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Appends particles on a time or frame schedule, never past `max_particles`.
///
/// Jitter and colours come from a seeded PCG stream, so two spawners built
/// from the same config produce the same particles.
#[derive(Debug, Clone)]
pub struct ParticleSpawner {
    config: SpawnConfig,
    max_particles: usize,
    dt: f32,
    rng: Pcg32,
    elapsed: f32,
    frames: u32,
    cap_reported: bool,
}

impl ParticleSpawner {
    pub fn new(config: &SimConfig) -> Result<Self, ConfigError> {
        let radius = config.spawn.radius;
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ConfigError::InvalidRadius(radius));
        }
        Ok(Self {
            config: config.spawn.clone(),
            max_particles: config.max_particles,
            dt: config.dt,
            rng: Pcg32::seed_from_u64(config.seed),
            elapsed: 0.0,
            frames: 0,
            cap_reported: false,
        })
    }

    pub fn max_particles(&self) -> usize {
        self.max_particles
    }

    pub fn is_full(&self, particles: &ParticleSet) -> bool {
        particles.len() >= self.max_particles
    }

    /// Advance the trigger by one rendered frame and spawn any batches due.
    /// Returns the number of particles added.
    pub fn tick(&mut self, particles: &mut ParticleSet, frame_dt: f32, accel: Vec2) -> usize {
        let mut added = 0;
        match self.config.trigger {
            SpawnTrigger::Interval { seconds } => {
                self.elapsed += frame_dt.max(0.0);
                let mut batches = 0;
                while self.elapsed >= seconds && batches < self.config.max_batches_per_frame {
                    self.elapsed -= seconds;
                    batches += 1;
                    added += self.spawn(particles, self.config.batch, accel);
                }
                if batches == self.config.max_batches_per_frame {
                    // Drop the backlog of a stalled frame
                    self.elapsed %= seconds;
                }
            }
            SpawnTrigger::EveryFrames { frames } => {
                self.frames += 1;
                if self.frames >= frames {
                    self.frames = 0;
                    added += self.spawn(particles, self.config.batch, accel);
                }
            }
        }
        added
    }

    /// Spawn up to `count` particles from the configured spawn region.
    /// Returns how many were added; 0 once the cap is reached.
    pub fn spawn(&mut self, particles: &mut ParticleSet, count: usize, accel: Vec2) -> usize {
        if count == 0 {
            return 0;
        }
        let room = self.max_particles.saturating_sub(particles.len());
        if room == 0 {
            self.report_cap();
            return 0;
        }
        let count = count.min(room);

        let mut added = 0;
        for _ in 0..count {
            let particle = self.next_particle(accel);
            match particles.push(particle) {
                Ok(_) => added += 1,
                Err(err) => {
                    log::warn!("spawn rejected: {}", err);
                    break;
                }
            }
        }
        log::debug!("spawned {} particles ({} live)", added, particles.len());
        added
    }

    /// Append an explicitly described particle. `Ok(None)` when at the cap.
    pub fn spawn_particle(
        &mut self,
        particles: &mut ParticleSet,
        particle: Particle,
    ) -> Result<Option<usize>, ConfigError> {
        if self.is_full(particles) {
            self.report_cap();
            return Ok(None);
        }
        particles.push(particle).map(Some)
    }

    fn next_particle(&mut self, accel: Vec2) -> Particle {
        let pj = self.config.position_jitter;
        let vj = self.config.velocity_jitter;
        let pos = self.config.position
            + Vec2::new(
                self.rng.random_range(-pj..=pj),
                self.rng.random_range(-pj..=pj),
            );
        let velocity = self.config.velocity
            + Vec2::new(
                self.rng.random_range(-vj..=vj),
                self.rng.random_range(-vj..=vj),
            );
        let color = [
            self.rng.random::<f32>(),
            self.rng.random::<f32>(),
            self.rng.random::<f32>(),
        ];

        Particle::at_rest(pos, self.config.radius)
            .with_velocity(velocity, self.dt)
            .with_accel(accel)
            .with_color(color)
    }

    fn report_cap(&mut self) {
        if !self.cap_reported {
            log::warn!("particle cap of {} reached; further spawns ignored", self.max_particles);
            self.cap_reported = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_particles: usize) -> SimConfig {
        SimConfig {
            max_particles,
            ..SimConfig::default()
        }
    }

    #[test]
    fn spawn_stops_at_cap() {
        let config = config(3);
        let mut spawner = ParticleSpawner::new(&config).unwrap();
        let mut set = ParticleSet::new();

        assert_eq!(spawner.spawn(&mut set, 2, Vec2::ZERO), 2);
        assert_eq!(spawner.spawn(&mut set, 5, Vec2::ZERO), 1);
        assert_eq!(spawner.spawn(&mut set, 1, Vec2::ZERO), 0);
        assert_eq!(set.len(), 3);
        assert!(spawner.is_full(&set));
    }

    #[test]
    fn explicit_spawn_at_cap_is_noop() {
        let config = config(1);
        let mut spawner = ParticleSpawner::new(&config).unwrap();
        let mut set = ParticleSet::new();

        let first = spawner
            .spawn_particle(&mut set, Particle::at_rest(Vec2::ZERO, 0.05))
            .unwrap();
        assert_eq!(first, Some(0));
        let second = spawner
            .spawn_particle(&mut set, Particle::at_rest(Vec2::ONE * 0.5, 0.05))
            .unwrap();
        assert_eq!(second, None);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn spawned_particles_respect_jitter_and_velocity() {
        let mut config = config(50);
        config.spawn.position = Vec2::new(0.2, 0.1);
        config.spawn.position_jitter = 0.1;
        config.spawn.velocity = Vec2::new(1.0, 0.0);
        config.spawn.velocity_jitter = 0.0;
        let mut spawner = ParticleSpawner::new(&config).unwrap();
        let mut set = ParticleSet::new();

        spawner.spawn(&mut set, 20, Vec2::new(0.0, -9.8));
        for id in 0..set.len() {
            let offset = set.positions()[id] - config.spawn.position;
            assert!(offset.abs().max_element() <= 0.1 + 1e-6);
            let v = set.displacement(id) / config.dt;
            assert!((v.x - 1.0).abs() < 1e-2);
            assert!(v.y.abs() < 1e-2);
            assert_eq!(set.accelerations()[id], Vec2::new(0.0, -9.8));
            let attrs = set.render_attributes()[id];
            assert_eq!(attrs.radius, config.spawn.radius);
            assert!((0.0..1.0).contains(&attrs.r));
        }
    }

    #[test]
    fn interval_trigger_accumulates_frame_time() {
        let mut config = config(100);
        config.spawn.trigger = SpawnTrigger::Interval { seconds: 0.1 };
        config.spawn.batch = 2;
        let mut spawner = ParticleSpawner::new(&config).unwrap();
        let mut set = ParticleSet::new();

        assert_eq!(spawner.tick(&mut set, 0.06, Vec2::ZERO), 0);
        assert_eq!(spawner.tick(&mut set, 0.06, Vec2::ZERO), 2);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn long_frame_is_limited_to_max_batches() {
        let mut config = config(100);
        config.spawn.trigger = SpawnTrigger::Interval { seconds: 0.1 };
        config.spawn.batch = 1;
        config.spawn.max_batches_per_frame = 3;
        let mut spawner = ParticleSpawner::new(&config).unwrap();
        let mut set = ParticleSet::new();

        assert_eq!(spawner.tick(&mut set, 10.0, Vec2::ZERO), 3);
        assert_eq!(spawner.tick(&mut set, 0.0, Vec2::ZERO), 0);
    }

    #[test]
    fn frame_trigger_fires_every_n_frames() {
        let mut config = config(100);
        config.spawn.trigger = SpawnTrigger::EveryFrames { frames: 3 };
        let mut spawner = ParticleSpawner::new(&config).unwrap();
        let mut set = ParticleSet::new();

        let added: Vec<usize> = (0..6)
            .map(|_| spawner.tick(&mut set, 0.016, Vec2::ZERO))
            .collect();
        assert_eq!(added, vec![0, 0, 1, 0, 0, 1]);
    }

    #[test]
    fn same_seed_same_particles() {
        let config = config(10);
        let mut a = ParticleSpawner::new(&config).unwrap();
        let mut b = ParticleSpawner::new(&config).unwrap();
        let (mut set_a, mut set_b) = (ParticleSet::new(), ParticleSet::new());

        a.spawn(&mut set_a, 10, Vec2::ZERO);
        b.spawn(&mut set_b, 10, Vec2::ZERO);
        assert_eq!(set_a.positions(), set_b.positions());
        assert_eq!(set_a.render_attributes(), set_b.render_attributes());
    }
}
