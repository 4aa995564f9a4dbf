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

// The tile pipeline:
//   GridBuilder emits the leaf set: a square lattice clipped to the disk,
//     sized so the leaf count meets the budget.
//   QuadTree indexes leaf centers for viewport range queries.
//   Pyramid pre-merges the leaves into L resolutions, averaging colors.
//   TileSelector runs per frame: base level from zoom, per-candidate drop
//     from distance to the view center, one emitted tile per (level, cell).
//
// Startup builds everything once; rayon parallelizes leaf generation
// internally and joins before the constructor returns. After that the
// structures are read-only, the frame loop is single-threaded, and the only
// per-frame allocation is amortized away by the selector's reused buffers.
//
// The renderer is a collaborator, not a dependency: it gets a TileInstance
// slice (and the vertex layout to interpret it) and owes us resize and
// device-loss notifications back. Shaders, batching, and pixel-ratio
// handling live entirely on its side of the TileRenderer trait.

mod grid;
mod instance;
mod pyramid;
mod quad_tree;
mod select;
mod tile;

pub use crate::{
    grid::{
        GridBuilder, GridDetail, GridDetailLevel, DEFAULT_BAD_RATE, DEFAULT_BUDGET, DEFAULT_RADIUS,
    },
    instance::{TileInstance, MAX_INSTANCES_PER_BATCH},
    pyramid::{CellKey, Pyramid, PyramidLevel, DEFAULT_LEVEL_COUNT},
    quad_tree::{QuadTree, DEFAULT_MAX_DEPTH, DEFAULT_MAX_ITEMS},
    select::{base_level, TileSelector},
    tile::{Tile, TileKind, BAD_COLOR, GOOD_COLOR},
};

use anyhow::Result;
use camera::FlatCamera;
use geometry::Disk;
use log::{debug, warn};
use nalgebra::Point2;

/// What the core owes the renderer each frame. Implementations batch the
/// slice into instanced draws of a unit quad, at most
/// [`MAX_INSTANCES_PER_BATCH`] instances each, laid out per
/// [`TileInstance::descriptor`].
pub trait TileRenderer {
    fn draw_tiles(&mut self, instances: &[TileInstance]) -> Result<()>;
}

/// Owns the built tile structures and drives per-frame selection.
pub struct TileBuffer {
    pyramid: Pyramid,
    index: QuadTree,
    selector: TileSelector,

    pinned_camera: Option<FlatCamera>,
    suspended: bool,
}

impl TileBuffer {
    pub fn new(grid: &GridBuilder, level_count: u8) -> Self {
        let level_count = level_count.max(1);
        let leaves = grid.build();
        debug!(
            "tiles: generated {} leaves of side {:.3} for radius {}",
            leaves.len(),
            grid.tile_side(),
            grid.radius()
        );

        // Root bounds pad the disk by one tile so rim centers are interior.
        let bounds =
            Disk::new(Point2::origin(), grid.radius() + grid.tile_side()).bounding_box();
        let mut index = QuadTree::new(bounds);
        for (i, tile) in leaves.iter().enumerate() {
            index.insert(i as u32, tile.position(), tile.side());
        }

        let pyramid = Pyramid::build(leaves, level_count, grid.tile_side(), grid.radius());
        for k in 0..pyramid.level_count() {
            debug!(
                "tiles: level {} holds {} tiles of side {:.3}",
                k,
                pyramid.level(k).map_or(0, |l| l.len()),
                pyramid.side_for_level(k),
            );
        }

        Self {
            pyramid,
            index,
            selector: TileSelector::new(),
            pinned_camera: None,
            suspended: false,
        }
    }

    /// Re-select the visible tile set for this frame's camera. The camera is
    /// snapshotted (or replaced wholesale by the pinned one) before
    /// selection starts, so mid-frame input cannot tear the view. Suspended
    /// (device lost), this keeps returning the last good frame.
    pub fn optimize_for_view(&mut self, camera: &FlatCamera) -> &[TileInstance] {
        if self.suspended {
            return self.selector.instances();
        }
        let (view, zoom) = match &self.pinned_camera {
            Some(pinned) => (pinned.view_bounds(), pinned.zoom()),
            None => (camera.view_bounds(), camera.zoom()),
        };
        self.selector.select(&view, zoom, &self.pyramid, &self.index);
        self.selector.instances()
    }

    /// The instances chosen by the most recent selection pass.
    pub fn visible_tiles(&self) -> &[TileInstance] {
        self.selector.instances()
    }

    pub fn dispatch(&self, renderer: &mut dyn TileRenderer) -> Result<()> {
        renderer.draw_tiles(self.selector.instances())
    }

    /// Freeze selection at the current camera so culling and falloff can be
    /// inspected from outside; toggling again releases it.
    pub fn toggle_pin_camera(&mut self, camera: &FlatCamera) {
        self.pinned_camera = match self.pinned_camera.take() {
            Some(_) => None,
            None => Some(camera.clone()),
        };
        debug!(
            "tiles: camera pin {}",
            if self.pinned_camera.is_some() {
                "engaged"
            } else {
                "released"
            }
        );
    }

    pub fn camera_is_pinned(&self) -> bool {
        self.pinned_camera.is_some()
    }

    /// The renderer lost its back end; stop churning the selection and let
    /// it keep showing whatever it last had.
    pub fn note_device_lost(&mut self) {
        warn!("tiles: render device lost; selection suspended");
        self.suspended = true;
    }

    /// Back end is usable again; run one full selection pass immediately so
    /// the first recovered frame is current.
    pub fn note_device_restored(&mut self, camera: &FlatCamera) {
        self.suspended = false;
        self.optimize_for_view(camera);
    }

    pub fn set_tint_levels(&mut self, tint_levels: bool) {
        self.selector.set_tint_levels(tint_levels);
    }

    pub fn pyramid(&self) -> &Pyramid {
        &self.pyramid
    }

    pub fn index(&self) -> &QuadTree {
        &self.index
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_suspension_freezes_the_frame() {
        let mut buffer = TileBuffer::new(&GridBuilder::new(50.0, 2_000).with_seed(17), 6);
        let camera = FlatCamera::new(1.0);
        let count = buffer.optimize_for_view(&camera).len();
        assert!(count > 0);

        buffer.note_device_lost();
        let mut far_camera = camera.clone();
        far_camera.set_position(Point2::new(9_000.0, 9_000.0));
        far_camera.update_projection();
        // Still the old frame; the far-off camera is ignored while down.
        assert_eq!(buffer.optimize_for_view(&far_camera).len(), count);

        buffer.note_device_restored(&far_camera);
        assert!(buffer.visible_tiles().is_empty());
    }

    #[test]
    fn test_pinned_camera_freezes_selection() {
        let mut buffer = TileBuffer::new(&GridBuilder::new(50.0, 2_000).with_seed(17), 6);
        let camera = FlatCamera::new(1.0);
        buffer.toggle_pin_camera(&camera);
        assert!(buffer.camera_is_pinned());

        let mut wandering = camera.clone();
        wandering.set_position(Point2::new(9_000.0, 9_000.0));
        wandering.update_projection();
        // Selection still follows the pin.
        assert!(!buffer.optimize_for_view(&wandering).is_empty());

        buffer.toggle_pin_camera(&wandering);
        assert!(!buffer.camera_is_pinned());
        assert!(buffer.optimize_for_view(&wandering).is_empty());
    }
}
