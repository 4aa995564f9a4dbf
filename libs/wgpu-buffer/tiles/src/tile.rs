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
use geometry::Aabb2;
use nalgebra::Point2;
use std::{f64::consts::PI, ops::Range};

pub const GOOD_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
pub const BAD_COLOR: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

/// Merged tiles remember what they summarize as a span into the owning
/// pyramid level's member arena; the arena holds indices into the next finer
/// level. Constituents are never held by reference.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TileKind {
    Leaf,
    Merged { members: Range<u32> },
}

/// One square tile, leaf or merged. Immutable once the pyramid is built.
#[derive(Clone, Debug)]
pub struct Tile {
    pub(crate) position: Point2<f64>,
    pub(crate) side: f64,
    pub(crate) color: [f32; 4],
    pub(crate) radial: f32,
    pub(crate) angle: f32,
    pub(crate) bad: bool,
    pub(crate) level: u8,
    pub(crate) kind: TileKind,
}

impl Tile {
    /// A generator-produced tile. The level is stamped when the pyramid
    /// adopts the leaf set.
    pub(crate) fn leaf(position: Point2<f64>, side: f64, disk_radius: f64, bad: bool) -> Self {
        Self {
            position,
            side,
            color: if bad { BAD_COLOR } else { GOOD_COLOR },
            radial: radial_for(position, disk_radius),
            angle: angle_for(position),
            bad,
            level: 0,
            kind: TileKind::Leaf,
        }
    }

    pub(crate) fn merged(
        position: Point2<f64>,
        side: f64,
        color: [f32; 4],
        disk_radius: f64,
        level: u8,
        members: Range<u32>,
    ) -> Self {
        Self {
            position,
            side,
            color,
            radial: radial_for(position, disk_radius),
            angle: angle_for(position),
            bad: false,
            level,
            kind: TileKind::Merged { members },
        }
    }

    pub fn position(&self) -> Point2<f64> {
        self.position
    }

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    pub fn side(&self) -> f64 {
        self.side
    }

    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    /// Distance from the disk center over the disk radius, in [0, 1].
    pub fn radial_distance(&self) -> f32 {
        self.radial
    }

    /// Angle about the disk center, normalized to [0, 1).
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn is_bad(&self) -> bool {
        self.bad
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn kind(&self) -> &TileKind {
        &self.kind
    }

    pub fn bounding_square(&self) -> Aabb2 {
        Aabb2::from_center_extent(self.position, self.side, self.side)
    }
}

fn radial_for(position: Point2<f64>, disk_radius: f64) -> f32 {
    (position.coords.norm() / disk_radius).min(1.0) as f32
}

fn angle_for(position: Point2<f64>) -> f32 {
    // atan2 lands in (-pi, pi]; shift and wrap the single closed endpoint
    // back to zero so the result stays in [0, 1).
    (((position.y.atan2(position.x) + PI) / (2.0 * PI)).fract()) as f32
}
