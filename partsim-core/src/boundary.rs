//! Wall containment for the axis-aligned world box

use crate::engine::ParticleSet;
use glam::Vec2;

/// Axis-aligned simulation box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl WorldBounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Whether a circle of `radius` at `pos` lies fully inside the box.
    pub fn contains(&self, pos: Vec2, radius: f32) -> bool {
        let lo = self.min + Vec2::splat(radius);
        let hi = self.max - Vec2::splat(radius);
        pos.cmpge(lo).all() && pos.cmple(hi).all()
    }

    /// Nearest position to `pos` where a circle of `radius` fits inside the box.
    pub fn clamp(&self, pos: Vec2, radius: f32) -> Vec2 {
        pos.clamp(self.min + Vec2::splat(radius), self.max - Vec2::splat(radius))
    }
}

/// Clamp one coordinate into `[wall_min, wall_max]`, reflecting the implicit
/// velocity about the wall and scaling it by `damping`.
#[inline]
pub fn reflect_axis(pos: &mut f32, prev: &mut f32, wall_min: f32, wall_max: f32, damping: f32) {
    if *pos < wall_min {
        *prev = wall_min + (*pos - *prev) * damping;
        *pos = wall_min;
    } else if *pos > wall_max {
        *prev = wall_max + (*pos - *prev) * damping;
        *pos = wall_max;
    }
}

/// Keep every particle inside `bounds`, inset by its own radius.
///
/// Each axis is handled independently so a corner hit reflects both.
pub fn resolve(particles: &mut ParticleSet, bounds: &WorldBounds, damping: f32) {
    let ParticleSet {
        pos,
        prev_pos,
        radius,
        ..
    } = particles;

    for ((p, prev), &r) in pos.iter_mut().zip(prev_pos.iter_mut()).zip(radius.iter()) {
        reflect_axis(&mut p.x, &mut prev.x, bounds.min.x + r, bounds.max.x - r, damping);
        reflect_axis(&mut p.y, &mut prev.y, bounds.min.y + r, bounds.max.y - r, damping);
    }
}
