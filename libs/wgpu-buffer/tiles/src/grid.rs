// This file is part of Neon.
//
// Neon is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// Neon is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with Neon.  If not, see <http://www.gnu.org/licenses/>.
use crate::tile::Tile;
use geometry::Disk;
use nalgebra::Point2;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use rayon::prelude::*;
use std::f64::consts::PI;

pub const DEFAULT_RADIUS: f64 = 500.0;
pub const DEFAULT_BUDGET: usize = 900_000;
pub const DEFAULT_BAD_RATE: f64 = 0.005;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GridDetailLevel {
    Low,
    Medium,
    High,
    Ultra,
}

#[derive(Clone, Copy, Debug)]
pub struct GridDetail {
    budget: usize,
}

impl GridDetail {
    fn new(budget: usize) -> Self {
        Self { budget }
    }

    pub fn for_level(level: GridDetailLevel) -> Self {
        match level {
            GridDetailLevel::Low => Self::new(100_000),
            GridDetailLevel::Medium => Self::new(300_000),
            GridDetailLevel::High => Self::new(600_000),
            GridDetailLevel::Ultra => Self::new(900_000),
        }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }
}

/// Produces the leaf tile set: a square lattice clipped to the disk, with the
/// tile side chosen so the clipped count stays under the budget.
///
/// Invalid parameters are clamped rather than surfaced; generation cannot
/// fail. With an injected seed the seed is the only source of randomness, so
/// two builds with the same parameters emit identical tile sets.
#[derive(Clone, Debug)]
pub struct GridBuilder {
    radius: f64,
    budget: usize,
    bad_rate: f64,
    seed: Option<u64>,
}

impl GridBuilder {
    pub fn new(radius: f64, budget: usize) -> Self {
        let radius = if radius.is_finite() { radius.max(1.0) } else { 1.0 };
        Self {
            radius,
            budget: budget.max(1),
            bad_rate: DEFAULT_BAD_RATE,
            seed: None,
        }
    }

    pub fn for_detail(radius: f64, level: GridDetailLevel) -> Self {
        Self::new(radius, GridDetail::for_level(level).budget())
    }

    pub fn with_bad_rate(mut self, bad_rate: f64) -> Self {
        self.bad_rate = if bad_rate.is_finite() {
            bad_rate.clamp(0.0, 1.0)
        } else {
            DEFAULT_BAD_RATE
        };
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn bad_rate(&self) -> f64 {
        self.bad_rate
    }

    /// The lattice spacing: cover the disk area with `budget` squares, but
    /// never go below unit tiles.
    pub fn tile_side(&self) -> f64 {
        (PI * self.radius * self.radius / self.budget as f64)
            .sqrt()
            .max(1.0)
    }

    pub fn build(&self) -> Vec<Tile> {
        let side = self.tile_side();
        let half_cells = (self.radius / side).ceil() as i64;
        let disk = Disk::new(Point2::origin(), self.radius);
        let bad_rate = self.bad_rate;
        let radius = self.radius;
        let base_seed = self.seed.unwrap_or_else(rand::random);

        (-half_cells..half_cells)
            .into_par_iter()
            .flat_map_iter(move |row| {
                // One stream per row keeps parallel generation deterministic
                // under an injected seed.
                let mut draw = SmallRng::seed_from_u64(
                    base_seed ^ (row as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15),
                );
                (-half_cells..half_cells).filter_map(move |col| {
                    let center = Point2::new(
                        (col as f64 + 0.5) * side,
                        (row as f64 + 0.5) * side,
                    );
                    if !disk.contains(center) {
                        return None;
                    }
                    let bad = draw.gen::<f64>() < bad_rate;
                    Some(Tile::leaf(center, side, radius, bad))
                })
            })
            .collect()
    }
}

impl Default for GridBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_RADIUS, DEFAULT_BUDGET)
    }
}
