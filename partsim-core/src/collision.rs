//! Circle-circle contact resolution
//!
//! Overlapping pairs are pushed apart along their centre line, half the overlap
//! each. Moving `pos` without touching `prev_pos` leaves the separation in the
//! next Verlet step as an impulse.
//!
//! Corrected positions are clamped back inside the walls, so a pair pressed
//! against a wall may need a few sub-steps to fully separate.
//!
//! Pairs are resolved one after another, so a particle touching several
//! neighbors can keep a small residual overlap that later sub-steps remove.

use crate::boundary::WorldBounds;
use crate::engine::ParticleSet;
use crate::grid::SpatialGrid;
use crate::profiler::CollisionStats;

/// Squared centre distance below which two particles count as coincident and
/// are left alone (no usable normal).
pub const COINCIDENT_EPSILON_SQ: f32 = 1e-4;

#[derive(Debug, Default)]
pub struct CollisionResolver {
    candidates: Vec<usize>,
}

impl CollisionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every overlapping pair found through `grid`.
    ///
    /// `grid` must have been rebuilt from the current positions. Each unordered
    /// pair is visited once, `i` ascending, then candidates `j > i` ascending.
    pub fn resolve(
        &mut self,
        particles: &mut ParticleSet,
        grid: &SpatialGrid,
        bounds: &WorldBounds,
        stats: &mut CollisionStats,
    ) {
        let max_radius = particles.max_radius();

        for i in 0..particles.len() {
            let p = particles.pos[i];
            let reach = particles.radius[i] + max_radius;
            grid.query_nearby_into(p.x, p.y, reach, &mut self.candidates);

            for &j in self.candidates.iter().filter(|&&j| j > i) {
                stats.checks += 1;
                if resolve_pair(particles, i, j) {
                    stats.verified += 1;
                    particles.pos[i] = bounds.clamp(particles.pos[i], particles.radius[i]);
                    particles.pos[j] = bounds.clamp(particles.pos[j], particles.radius[j]);
                }
            }
        }
    }
}

/// Separate particles `i` and `j` if they overlap. Returns whether they did.
pub fn resolve_pair(particles: &mut ParticleSet, i: usize, j: usize) -> bool {
    let delta = particles.pos[i] - particles.pos[j];
    let dist_sq = delta.length_squared();
    let contact = particles.radius[i] + particles.radius[j];

    if dist_sq >= contact * contact || dist_sq < COINCIDENT_EPSILON_SQ {
        return false;
    }

    let dist = dist_sq.sqrt();
    let normal = delta / dist;
    let correction = normal * ((contact - dist) * 0.5);
    particles.pos[i] += correction;
    particles.pos[j] -= correction;
    true
}
