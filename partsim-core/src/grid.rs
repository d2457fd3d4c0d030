//! Uniform grid broad phase
//!
//! Buckets particle indices by cell so a neighbor query only visits the cells
//! around a point. The grid never owns particle data and is rebuilt from
//! scratch every sub-step.

use crate::engine::ParticleSet;
use crate::error::ConfigError;
use glam::Vec2;

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    inv_cell_size: f32,
    width: usize,
    height: usize,
    world_min: Vec2,
    cells: Vec<Vec<usize>>,
}

impl SpatialGrid {
    /// Build an empty grid covering `[min, max]` with square cells of `cell_size`.
    pub fn new(cell_size: f32, min: Vec2, max: Vec2) -> Result<Self, ConfigError> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(ConfigError::InvalidCellSize(cell_size));
        }
        if !min.is_finite() || !max.is_finite() || max.x <= min.x || max.y <= min.y {
            return Err(ConfigError::InvalidBounds {
                min_x: min.x,
                min_y: min.y,
                max_x: max.x,
                max_y: max.y,
            });
        }

        let extent = max - min;
        let width = (extent.x / cell_size) as usize + 1;
        let height = (extent.y / cell_size) as usize + 1;
        log::debug!(
            "spatial grid {}x{} cells of {} over [{}, {}]",
            width,
            height,
            cell_size,
            min,
            max
        );

        Ok(Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            width,
            height,
            world_min: min,
            cells: vec![Vec::new(); width * height],
        })
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Grid dimensions in cells `(columns, rows)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Empty every bucket, keeping their allocations.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    /// Clamped cell coordinate containing `(x, y)`.
    pub fn cell_of(&self, x: f32, y: f32) -> (usize, usize) {
        (
            self.clamp_axis(x - self.world_min.x, self.width),
            self.clamp_axis(y - self.world_min.y, self.height),
        )
    }

    #[inline]
    fn clamp_axis(&self, offset: f32, cells: usize) -> usize {
        let c = (offset * self.inv_cell_size).floor();
        if c <= 0.0 {
            0
        } else {
            (c as usize).min(cells - 1)
        }
    }

    pub fn insert(&mut self, id: usize, x: f32, y: f32) {
        let (gx, gy) = self.cell_of(x, y);
        self.cells[gy * self.width + gx].push(id);
    }

    /// Clear and re-insert every particle at its current position.
    pub fn rebuild(&mut self, particles: &ParticleSet) {
        self.clear();
        for (id, p) in particles.positions().iter().enumerate() {
            self.insert(id, p.x, p.y);
        }
    }

    /// All ids in cells overlapping the square of half-width `radius` around
    /// `(x, y)`, in ascending order. May contain false positives.
    pub fn query_nearby(&self, x: f32, y: f32, radius: f32) -> Vec<usize> {
        let mut out = Vec::new();
        self.query_nearby_into(x, y, radius, &mut out);
        out
    }

    /// Like [`Self::query_nearby`] but reuses `out`, which is cleared first.
    pub fn query_nearby_into(&self, x: f32, y: f32, radius: f32, out: &mut Vec<usize>) {
        out.clear();
        let (min_gx, min_gy) = self.cell_of(x - radius, y - radius);
        let (max_gx, max_gy) = self.cell_of(x + radius, y + radius);

        for gy in min_gy..=max_gy {
            let row = gy * self.width;
            for gx in min_gx..=max_gx {
                out.extend_from_slice(&self.cells[row + gx]);
            }
        }
        // Each id lives in exactly one cell, so sorting is enough for set semantics.
        out.sort_unstable();
    }
}
