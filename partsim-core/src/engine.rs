use crate::error::ConfigError;
use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// A particle to be appended to a [`ParticleSet`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    /// Position one sub-step ago; `pos - prev_pos` is the implicit velocity
    pub prev_pos: Vec2,
    pub accel: Vec2,
    pub radius: f32,
    pub color: [f32; 3],
}

impl Particle {
    /// A particle at rest at `pos`.
    pub fn at_rest(pos: Vec2, radius: f32) -> Self {
        Self {
            pos,
            prev_pos: pos,
            accel: Vec2::ZERO,
            radius,
            color: [1.0, 1.0, 1.0],
        }
    }

    /// Encode `velocity` through the Verlet relation `prev = pos - velocity * dt`.
    pub fn with_velocity(mut self, velocity: Vec2, dt: f32) -> Self {
        self.prev_pos = self.pos - velocity * dt;
        self
    }

    pub fn with_accel(mut self, accel: Vec2) -> Self {
        self.accel = accel;
        self
    }

    pub fn with_color(mut self, color: [f32; 3]) -> Self {
        self.color = color;
        self
    }
}

/// Static per-particle render data, laid out for direct buffer upload
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RenderAttributes {
    pub radius: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// Struct-of-arrays particle store. A particle's identity is its index.
///
/// All columns have the same length. Particles are only ever appended.
#[derive(Debug, Default, Clone)]
pub struct ParticleSet {
    pub(crate) pos: Vec<Vec2>,
    pub(crate) prev_pos: Vec<Vec2>,
    pub(crate) accel: Vec<Vec2>,
    pub(crate) radius: Vec<f32>,
    attributes: Vec<RenderAttributes>,
    max_radius: f32,
}

impl ParticleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pos: Vec::with_capacity(capacity),
            prev_pos: Vec::with_capacity(capacity),
            accel: Vec::with_capacity(capacity),
            radius: Vec::with_capacity(capacity),
            attributes: Vec::with_capacity(capacity),
            max_radius: 0.0,
        }
    }

    /// Append a particle and return its index.
    pub fn push(&mut self, particle: Particle) -> Result<usize, ConfigError> {
        if !particle.radius.is_finite() || particle.radius <= 0.0 {
            return Err(ConfigError::InvalidRadius(particle.radius));
        }
        if !particle.pos.is_finite() || !particle.prev_pos.is_finite() {
            return Err(ConfigError::parameter("particle position must be finite"));
        }
        let [r, g, b] = particle.color;
        let id = self.pos.len();
        self.pos.push(particle.pos);
        self.prev_pos.push(particle.prev_pos);
        self.accel.push(particle.accel);
        self.radius.push(particle.radius);
        self.attributes.push(RenderAttributes {
            radius: particle.radius,
            r,
            g,
            b,
        });
        self.max_radius = self.max_radius.max(particle.radius);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.pos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pos.is_empty()
    }

    /// Largest radius of any live particle, 0 when empty.
    pub fn max_radius(&self) -> f32 {
        self.max_radius
    }

    /// Insertion-ordered positions.
    pub fn positions(&self) -> &[Vec2] {
        &self.pos
    }

    /// Positions as `x0, y0, x1, y1, ...` for bulk upload.
    pub fn positions_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.pos)
    }

    pub fn previous_positions(&self) -> &[Vec2] {
        &self.prev_pos
    }

    pub fn accelerations(&self) -> &[Vec2] {
        &self.accel
    }

    pub fn radii(&self) -> &[f32] {
        &self.radius
    }

    /// Static `(radius, r, g, b)` tuples, parallel to [`Self::positions`].
    pub fn render_attributes(&self) -> &[RenderAttributes] {
        &self.attributes
    }

    /// Implicit per-sub-step displacement `pos - prev_pos`.
    pub fn displacement(&self, id: usize) -> Vec2 {
        self.pos[id] - self.prev_pos[id]
    }

    /// Set one particle's acceleration. `false` when `id` is not live.
    pub fn set_acceleration(&mut self, id: usize, accel: Vec2) -> bool {
        match self.accel.get_mut(id) {
            Some(a) => {
                *a = accel;
                true
            }
            None => false,
        }
    }

    /// Apply `f` to every particle's acceleration.
    pub fn map_accelerations(&mut self, f: impl Fn(Vec2) -> Vec2) {
        for a in &mut self.accel {
            *a = f(*a);
        }
    }

    /// Overwrite one particle's kinematic state, keeping its render attributes.
    pub fn set_state(&mut self, id: usize, pos: Vec2, prev_pos: Vec2) {
        self.pos[id] = pos;
        self.prev_pos[id] = prev_pos;
    }
}
