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
use memoffset::offset_of;
use static_assertions::assert_eq_size;
use std::mem;
use zerocopy::{AsBytes, FromBytes};

/// Renderers chunk instanced draws to at most this many instances.
pub const MAX_INSTANCES_PER_BATCH: usize = 16_384;

/// The per-instance record the renderer consumes: one unit quad scaled by
/// `side`, translated to `position`, flat-shaded with `color`.
#[repr(C)]
#[derive(AsBytes, FromBytes, Copy, Clone, Default, Debug)]
pub struct TileInstance {
    position: [f32; 2],
    side: f32,
    color: [f32; 4],
}
assert_eq_size!(TileInstance, [f32; 7]);

impl TileInstance {
    pub fn new(tile: &Tile) -> Self {
        Self::with_color(tile, tile.color())
    }

    pub fn with_color(tile: &Tile, color: [f32; 4]) -> Self {
        Self {
            position: [tile.x() as f32, tile.y() as f32],
            side: tile.side() as f32,
            color,
        }
    }

    pub fn position(&self) -> [f32; 2] {
        self.position
    }

    pub fn side(&self) -> f32 {
        self.side
    }

    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    pub fn mem_size() -> usize {
        mem::size_of::<Self>()
    }

    #[allow(clippy::unneeded_field_pattern)]
    pub fn descriptor() -> wgpu::VertexBufferLayout<'static> {
        let tmp = wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // position
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 0,
                    shader_location: 0,
                },
                // side
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32,
                    offset: 8,
                    shader_location: 1,
                },
                // color
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: 12,
                    shader_location: 2,
                },
            ],
        };

        assert_eq!(
            tmp.attributes[0].offset,
            offset_of!(TileInstance, position) as wgpu::BufferAddress
        );

        assert_eq!(
            tmp.attributes[1].offset,
            offset_of!(TileInstance, side) as wgpu::BufferAddress
        );

        assert_eq!(
            tmp.attributes[2].offset,
            offset_of!(TileInstance, color) as wgpu::BufferAddress
        );

        assert_eq!(mem::size_of::<TileInstance>(), 28);

        tmp
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Point2;

    #[test]
    fn test_descriptor_offsets_agree_with_layout() {
        let descriptor = TileInstance::descriptor();
        assert_eq!(descriptor.array_stride, 28);
        assert_eq!(descriptor.attributes.len(), 3);
    }

    #[test]
    fn test_instance_captures_tile() {
        let tile = Tile::leaf(Point2::new(3.0, -4.0), 2.0, 10.0, true);
        let instance = TileInstance::new(&tile);
        assert_eq!(instance.position(), [3.0, -4.0]);
        assert_eq!(instance.side(), 2.0);
        assert_eq!(instance.color(), crate::tile::BAD_COLOR);
    }
}
