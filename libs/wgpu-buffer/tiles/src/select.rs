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
use crate::{
    instance::TileInstance,
    pyramid::{CellKey, Pyramid},
    quad_tree::QuadTree,
    tile::Tile,
};
use camera::{ZOOM_MAX, ZOOM_MIN};
use fxhash::FxHashSet;
use geometry::Aabb2;
use std::mem;

// Zoom maps to detail sub-linearly so coarse levels dominate on zoom-out.
const BASE_LEVEL_EXPONENT: f64 = 0.8;

// Falloff saturates at this fraction of the long view dimension.
const FALLOFF_RANGE_FRAC: f64 = 0.8;
const FALLOFF_DROP_SCALE: f64 = 2.5;
const FALLOFF_DROP_EXPONENT: f64 = 1.5;

const DBG_COLORS_BY_LEVEL: [[f32; 4]; 8] = [
    [0.75, 0.25, 0.25, 1.0],
    [0.25, 0.75, 0.75, 1.0],
    [0.75, 0.42, 0.25, 1.0],
    [0.25, 0.58, 0.75, 1.0],
    [0.75, 0.58, 0.25, 1.0],
    [0.25, 0.42, 0.75, 1.0],
    [0.75, 0.75, 0.25, 1.0],
    [0.25, 0.25, 0.75, 1.0],
];

/// The LOD every tile would get from zoom alone, before per-tile falloff.
pub fn base_level(zoom: f64, level_count: u8) -> u8 {
    debug_assert!(level_count >= 1);
    let top = (level_count - 1) as f64;
    let u = ((zoom - ZOOM_MIN) / (ZOOM_MAX - ZOOM_MIN))
        .clamp(0.0, 1.0)
        .powf(BASE_LEVEL_EXPONENT);
    (u * top).floor().clamp(0.0, top) as u8
}

/// Per-frame selection state. The hash set and vectors are retained across
/// frames so steady-state selection does not allocate.
#[derive(Debug, Default)]
pub struct TileSelector {
    emitted: FxHashSet<(u8, CellKey)>,
    candidates: Vec<u32>,
    instances: Vec<TileInstance>,
    tint_levels: bool,
}

impl TileSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace emitted colors with a fixed per-level palette so the active
    /// LOD bands are visible.
    pub fn set_tint_levels(&mut self, tint_levels: bool) {
        self.tint_levels = tint_levels;
    }

    pub fn instances(&self) -> &[TileInstance] {
        &self.instances
    }

    /// Pick one tile per occupied cell at the right level for this view.
    ///
    /// Each candidate leaf inside the view maps to a cell at its target
    /// level (base level minus the distance falloff). The first candidate
    /// to reach a cell emits that cell's merged tile; later ones are
    /// suppressed. A cell with no merged tile falls through to the finest
    /// level that has any of its sub-cells, and failing even that, the
    /// candidate itself is drawn so the disk never shows holes.
    pub fn select(&mut self, view: &Aabb2, zoom: f64, pyramid: &Pyramid, index: &QuadTree) {
        self.emitted.clear();
        self.instances.clear();
        self.candidates.clear();

        let level_count = pyramid.level_count();
        if level_count == 0 || index.is_empty() {
            return;
        }
        let base = base_level(zoom, level_count);
        index.query_range(view, &mut self.candidates);

        let view_center = view.center();
        let falloff_range = FALLOFF_RANGE_FRAC * view.width().max(view.height());
        let leaves = pyramid.leaves();

        let candidates = mem::take(&mut self.candidates);
        for &candidate in &candidates {
            let leaf = &leaves[candidate as usize];
            let distance = (leaf.position() - view_center).norm();
            let falloff = (distance / falloff_range).min(1.0);
            let drop = (FALLOFF_DROP_SCALE * falloff.powf(FALLOFF_DROP_EXPONENT)).floor() as i64;
            let target = (base as i64 - drop).max(0) as u8;
            let key = CellKey::at(leaf.x(), leaf.y(), pyramid.side_for_level(target));
            if self.emitted.contains(&(target, key)) {
                continue;
            }

            if let Some(tile) = pyramid
                .level(target)
                .and_then(|level| level.tile_for_cell(&key))
            {
                self.push_unique(tile);
                continue;
            }

            if self.descend_finer(pyramid, target, key, level_count) {
                // The finer tiles cover this cell; the cell key itself stays
                // unmarked so it cannot shadow differently-keyed candidates.
                continue;
            }

            self.push_unique(leaf);
            self.emitted.insert((target, key));
        }
        self.candidates = candidates;
    }

    /// Walk toward the leaves one level at a time, drawing everything the
    /// first non-empty level holds inside `key`'s footprint.
    fn descend_finer(
        &mut self,
        pyramid: &Pyramid,
        target: u8,
        key: CellKey,
        level_count: u8,
    ) -> bool {
        for finer in target + 1..level_count {
            let Some(level) = pyramid.level(finer) else {
                continue;
            };
            if level.is_empty() {
                continue;
            }
            let scale = 1i64 << (finer - target);
            let mut found = false;
            for sub_y in key.y * scale..(key.y + 1) * scale {
                for sub_x in key.x * scale..(key.x + 1) * scale {
                    let sub = CellKey { x: sub_x, y: sub_y };
                    if let Some(tile) = level.tile_for_cell(&sub) {
                        self.push_unique(tile);
                        found = true;
                    }
                }
            }
            if found {
                return true;
            }
        }
        false
    }

    /// Emit a tile unless something already emitted covers the same cell at
    /// the same level.
    fn push_unique(&mut self, tile: &Tile) {
        let key = CellKey::at(tile.x(), tile.y(), tile.side());
        if self.emitted.insert((tile.level(), key)) {
            let instance = if self.tint_levels {
                let tint = DBG_COLORS_BY_LEVEL[tile.level() as usize % DBG_COLORS_BY_LEVEL.len()];
                TileInstance::with_color(tile, tint)
            } else {
                TileInstance::new(tile)
            };
            self.instances.push(instance);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::grid::GridBuilder;
    use fxhash::FxHashSet;
    use nalgebra::Point2;

    fn fixture(radius: f64, budget: usize) -> (Pyramid, QuadTree) {
        let builder = GridBuilder::new(radius, budget).with_seed(13);
        let leaves = builder.build();
        let bounds = Aabb2::from_center_extent(
            Point2::origin(),
            (radius + builder.tile_side()) * 2.0,
            (radius + builder.tile_side()) * 2.0,
        );
        let mut index = QuadTree::new(bounds);
        for (i, tile) in leaves.iter().enumerate() {
            index.insert(i as u32, tile.position(), tile.side());
        }
        let pyramid = Pyramid::build(leaves, 6, builder.tile_side(), radius);
        (pyramid, index)
    }

    #[test]
    fn test_base_level_monotonic_in_zoom() {
        let mut last = 0;
        let mut zoom = ZOOM_MIN;
        while zoom <= ZOOM_MAX {
            let level = base_level(zoom, 6);
            assert!(level >= last, "level dropped at zoom {}", zoom);
            last = level;
            zoom += 0.01;
        }
        assert_eq!(base_level(ZOOM_MIN, 6), 0);
        assert_eq!(base_level(ZOOM_MAX, 6), 5);
        // Out-of-range zooms clamp instead of wrapping.
        assert_eq!(base_level(-10.0, 6), 0);
        assert_eq!(base_level(100.0, 6), 5);
    }

    #[test]
    fn test_falloff_keeps_base_level_near_center() {
        // An 800x600 view at zoom 1: the long dimension is 1333.3, so a tile
        // 500 units out is at f = 0.469 and still drops nothing.
        let view = Aabb2::from_center_extent(Point2::origin(), 4000.0 / 3.0, 1000.0);
        let falloff_range = FALLOFF_RANGE_FRAC * view.width().max(view.height());
        for distance in [0.0, 500.0] {
            let falloff = (distance / falloff_range).min(1.0_f64);
            let drop = (FALLOFF_DROP_SCALE * falloff.powf(FALLOFF_DROP_EXPONENT)).floor() as i64;
            assert_eq!(drop, 0, "distance {}", distance);
        }
        // At the saturation point the full drop applies.
        let drop = (FALLOFF_DROP_SCALE * 1.0_f64.powf(FALLOFF_DROP_EXPONENT)).floor() as i64;
        assert_eq!(drop, 2);
    }

    #[test]
    fn test_no_two_instances_share_a_cell() {
        let (pyramid, index) = fixture(100.0, 10_000);
        let mut selector = TileSelector::new();
        let view = Aabb2::from_center_extent(Point2::new(20.0, -30.0), 400.0, 300.0);
        selector.select(&view, 4.0, &pyramid, &index);
        assert!(!selector.instances().is_empty());
        let mut seen = FxHashSet::default();
        for instance in selector.instances() {
            let side = instance.side() as f64;
            let key = CellKey::at(
                instance.position()[0] as f64,
                instance.position()[1] as f64,
                side,
            );
            assert!(seen.insert((side.to_bits(), key)), "duplicate cell at {:?}", key);
        }
    }

    #[test]
    fn test_full_zoom_emits_leaves_near_center() {
        let (pyramid, index) = fixture(100.0, 10_000);
        let mut selector = TileSelector::new();
        let view = Aabb2::from_center_extent(Point2::origin(), 50.0, 50.0);
        selector.select(&view, ZOOM_MAX, &pyramid, &index);
        let base_side = pyramid.base_side() as f32;
        // Inside the falloff knee everything is a leaf; the view corners
        // are allowed to coarsen.
        let mut center_leaves = 0;
        for instance in selector.instances() {
            let [x, y] = instance.position();
            if ((x * x + y * y) as f64).sqrt() < 20.0 {
                assert!((instance.side() - base_side).abs() < 1e-6);
                center_leaves += 1;
            }
        }
        assert!(center_leaves > 0);
    }

    #[test]
    fn test_zoomed_out_prefers_coarse_tiles() {
        let (pyramid, index) = fixture(100.0, 10_000);
        let mut selector = TileSelector::new();
        let view = Aabb2::from_center_extent(Point2::origin(), 10_000.0, 10_000.0);
        selector.select(&view, ZOOM_MIN, &pyramid, &index);
        let coarse_side = pyramid.side_for_level(0) as f32;
        assert!(!selector.instances().is_empty());
        assert!(selector
            .instances()
            .iter()
            .all(|i| (i.side() - coarse_side).abs() < 1e-6));
        // Far fewer instances than leaves.
        assert!(selector.instances().len() * 100 < index.len());
    }

    #[test]
    fn test_missing_level_falls_through_to_finer() {
        let (mut pyramid, index) = fixture(60.0, 3_000);
        // Simulate a memory-pressured builder that skipped level 2.
        pyramid.levels[2].tiles.clear();
        pyramid.levels[2].by_cell.clear();
        pyramid.levels[2].members.clear();
        let mut selector = TileSelector::new();
        // Zoom chosen so the base level lands on the gap.
        let zoom = 4.0;
        assert_eq!(base_level(zoom, 6), 2);
        let view = Aabb2::from_center_extent(Point2::origin(), 150.0, 150.0);
        selector.select(&view, zoom, &pyramid, &index);
        assert!(!selector.instances().is_empty());
        // Everything emitted came from a finer level than the gap.
        let gap_side = pyramid.side_for_level(2) as f32;
        for instance in selector.instances() {
            assert!(instance.side() < gap_side);
        }
    }

    #[test]
    fn test_empty_view_is_not_an_error() {
        let (pyramid, index) = fixture(50.0, 2_000);
        let mut selector = TileSelector::new();
        let view = Aabb2::from_center_extent(Point2::new(5_000.0, 5_000.0), 100.0, 100.0);
        selector.select(&view, 1.0, &pyramid, &index);
        assert!(selector.instances().is_empty());
    }

    #[test]
    fn test_tinting_replaces_colors() {
        let (pyramid, index) = fixture(50.0, 2_000);
        let mut selector = TileSelector::new();
        selector.set_tint_levels(true);
        let view = Aabb2::from_center_extent(Point2::origin(), 120.0, 120.0);
        selector.select(&view, 1.0, &pyramid, &index);
        assert!(!selector.instances().is_empty());
        for instance in selector.instances() {
            assert!(DBG_COLORS_BY_LEVEL.contains(&instance.color()));
        }
    }
}
