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
use crate::tile::{Tile, TileKind};
use fxhash::FxHashMap;
use nalgebra::Point2;

pub const DEFAULT_LEVEL_COUNT: u8 = 6;

/// Integer lattice coordinate of a cell at some level's spacing.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct CellKey {
    pub x: i64,
    pub y: i64,
}

impl CellKey {
    pub fn at(x: f64, y: f64, side: f64) -> Self {
        Self {
            x: (x / side).floor() as i64,
            y: (y / side).floor() as i64,
        }
    }
}

/// One resolution of the pyramid: its tiles, a cell-key lookup over them,
/// and (for merged levels) the member arena the tiles' spans point into.
#[derive(Clone, Debug)]
pub struct PyramidLevel {
    pub(crate) tiles: Vec<Tile>,
    pub(crate) members: Vec<u32>,
    pub(crate) by_cell: FxHashMap<CellKey, u32>,
    pub(crate) side: f64,
}

impl PyramidLevel {
    fn from_leaves(tiles: Vec<Tile>, side: f64) -> Self {
        let mut by_cell = FxHashMap::default();
        for (i, tile) in tiles.iter().enumerate() {
            by_cell.insert(CellKey::at(tile.x(), tile.y(), side), i as u32);
        }
        Self {
            tiles,
            members: Vec::new(),
            by_cell,
            side,
        }
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn side(&self) -> f64 {
        self.side
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tile_for_cell(&self, key: &CellKey) -> Option<&Tile> {
        self.by_cell.get(key).map(|&i| &self.tiles[i as usize])
    }

    /// Indices into the next finer level; empty for leaves.
    pub fn members_of(&self, tile: &Tile) -> &[u32] {
        match tile.kind() {
            TileKind::Leaf => &[],
            TileKind::Merged { members } => {
                &self.members[members.start as usize..members.end as usize]
            }
        }
    }
}

/// L resolutions of the tile set, coarsest first; `levels[L-1]` is the leaf
/// set. Each coarser level halves the lattice density by merging the finer
/// level cell-wise, averaging colors.
#[derive(Clone, Debug)]
pub struct Pyramid {
    pub(crate) levels: Vec<PyramidLevel>,
    base_side: f64,
    disk_radius: f64,
}

impl Pyramid {
    pub fn build(mut leaves: Vec<Tile>, level_count: u8, base_side: f64, disk_radius: f64) -> Self {
        let level_count = level_count.max(1);
        let leaf_level = level_count - 1;
        for tile in &mut leaves {
            tile.level = leaf_level;
        }

        // Built finest-first and reversed so the vec indexes by level.
        let mut levels = Vec::with_capacity(level_count as usize);
        levels.push(PyramidLevel::from_leaves(leaves, base_side));
        for k in (0..leaf_level).rev() {
            let side = base_side * f64::powi(2.0, (leaf_level - k) as i32);
            let merged = Self::merge_level(levels.last().unwrap(), side, k, disk_radius);
            levels.push(merged);
        }
        levels.reverse();

        Self {
            levels,
            base_side,
            disk_radius,
        }
    }

    fn merge_level(finer: &PyramidLevel, side: f64, level: u8, disk_radius: f64) -> PyramidLevel {
        let mut cells: FxHashMap<CellKey, Vec<u32>> = FxHashMap::default();
        for (i, tile) in finer.tiles.iter().enumerate() {
            cells
                .entry(CellKey::at(tile.x(), tile.y(), side))
                .or_default()
                .push(i as u32);
        }
        // Hash order is arbitrary; sort so builds are reproducible.
        let mut ordered: Vec<_> = cells.into_iter().collect();
        ordered.sort_unstable_by_key(|(key, _)| *key);

        let mut tiles = Vec::with_capacity(ordered.len());
        let mut members = Vec::with_capacity(finer.tiles.len());
        let mut by_cell = FxHashMap::default();
        for (key, cell_members) in ordered {
            let mut sum = [0f64; 4];
            for &mi in &cell_members {
                let color = finer.tiles[mi as usize].color();
                for (acc, channel) in sum.iter_mut().zip(color) {
                    *acc += channel as f64;
                }
            }
            let count = cell_members.len() as f64;
            let color = [
                (sum[0] / count) as f32,
                (sum[1] / count) as f32,
                (sum[2] / count) as f32,
                (sum[3] / count) as f32,
            ];
            let start = members.len() as u32;
            members.extend_from_slice(&cell_members);
            let span = start..members.len() as u32;
            let center = Point2::new((key.x as f64 + 0.5) * side, (key.y as f64 + 0.5) * side);
            by_cell.insert(key, tiles.len() as u32);
            tiles.push(Tile::merged(center, side, color, disk_radius, level, span));
        }

        PyramidLevel {
            tiles,
            members,
            by_cell,
            side,
        }
    }

    pub fn level_count(&self) -> u8 {
        self.levels.len() as u8
    }

    pub fn level(&self, k: u8) -> Option<&PyramidLevel> {
        self.levels.get(k as usize)
    }

    pub fn leaves(&self) -> &[Tile] {
        &self.levels[self.levels.len() - 1].tiles
    }

    pub fn base_side(&self) -> f64 {
        self.base_side
    }

    pub fn disk_radius(&self) -> f64 {
        self.disk_radius
    }

    pub fn side_for_level(&self, k: u8) -> f64 {
        let leaf_level = self.level_count() - 1;
        self.base_side * f64::powi(2.0, (leaf_level.saturating_sub(k)) as i32)
    }
}
