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
use log::warn;
use nalgebra::{Matrix4, Point2};

pub const ZOOM_MIN: f64 = 0.1;
pub const ZOOM_MAX: f64 = 10.0;

// World-space height of the view window at zoom 1; width follows the aspect.
const VIEW_WINDOW: f64 = 1000.0;

/// An orthographic camera over the tile plane.
///
/// The view window is `1000 * aspect / zoom` wide and `1000 / zoom` tall,
/// centered on `position`, with depth clipped to [-1, 1]. The projection is
/// computed in f64 and stored column-major as f32, which is what the uniform
/// upload wants.
///
/// Invariant: `projection` is always finite. An update that would introduce a
/// non-finite entry is rejected and the last good matrix is retained, so a
/// poisoned position or zoom can never tear the frame; `view_bounds` falls
/// back to the default window for the same reason.
#[derive(Clone, Debug)]
pub struct FlatCamera {
    position: Point2<f64>,
    zoom: f64,
    aspect_ratio: f64,
    projection: Matrix4<f32>,
}

impl FlatCamera {
    pub fn new(aspect_ratio: f64) -> Self {
        let mut camera = Self {
            position: Point2::origin(),
            zoom: 1.0,
            aspect_ratio: 1.0,
            projection: Matrix4::identity(),
        };
        camera.handle_aspect_change(aspect_ratio);
        camera.update_projection();
        camera
    }

    pub fn position(&self) -> Point2<f64> {
        self.position
    }

    /// Stores the position as given, finite or not. `view_bounds` and
    /// `update_projection` contain any poison; the next accepted update
    /// flushes it.
    pub fn set_position(&mut self, position: Point2<f64>) {
        self.position = position;
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        if !zoom.is_finite() {
            warn!("camera: rejecting non-finite zoom {}", zoom);
            return;
        }
        self.zoom = zoom.clamp(ZOOM_MIN, ZOOM_MAX);
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    /// The renderer reports surface resizes here.
    pub fn handle_aspect_change(&mut self, aspect_ratio: f64) {
        if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
            warn!("camera: rejecting degenerate aspect ratio {}", aspect_ratio);
            return;
        }
        self.aspect_ratio = aspect_ratio;
    }

    fn window_extent(&self) -> (f64, f64) {
        (
            VIEW_WINDOW * self.aspect_ratio / self.zoom,
            VIEW_WINDOW / self.zoom,
        )
    }

    /// The world-space rectangle visible through the current projection.
    /// Falls back to the default zoom-1 window at the origin if the camera
    /// state has gone non-finite.
    pub fn view_bounds(&self) -> Aabb2 {
        let (width, height) = self.window_extent();
        if !self.position.x.is_finite()
            || !self.position.y.is_finite()
            || !width.is_finite()
            || !height.is_finite()
            || width <= 0.0
            || height <= 0.0
        {
            warn!("camera: degenerate view state; using default view bounds");
            return Aabb2::from_center_extent(Point2::origin(), VIEW_WINDOW, VIEW_WINDOW);
        }
        Aabb2::from_center_extent(self.position, width, height)
    }

    /// Recompute the projection from the current position, zoom, and aspect.
    /// Keeps the last good matrix if the result would not be finite.
    pub fn update_projection(&mut self) {
        let (width, height) = self.window_extent();
        let m = Matrix4::new_orthographic(
            self.position.x - width / 2.0,
            self.position.x + width / 2.0,
            self.position.y - height / 2.0,
            self.position.y + height / 2.0,
            -1.0,
            1.0,
        )
        .cast::<f32>();
        // Checked after the f32 cast; a finite f64 entry can still overflow
        // the storage format.
        if m.iter().all(|v| v.is_finite()) {
            self.projection = m;
        } else {
            warn!("camera: rejecting non-finite projection update");
        }
    }

    pub fn projection(&self) -> &Matrix4<f32> {
        &self.projection
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_view_bounds_follow_zoom_and_aspect() {
        // An 800x600 surface at zoom 1 sees 1333.3 x 1000 world units.
        let camera = FlatCamera::new(800.0 / 600.0);
        let bounds = camera.view_bounds();
        assert_abs_diff_eq!(bounds.left(), -666.666, epsilon = 1e-2);
        assert_abs_diff_eq!(bounds.right(), 666.666, epsilon = 1e-2);
        assert_abs_diff_eq!(bounds.top(), 500.0);
        assert_abs_diff_eq!(bounds.bottom(), -500.0);
    }

    #[test]
    fn test_non_finite_position_falls_back_to_default_bounds() {
        let mut camera = FlatCamera::new(800.0 / 600.0);
        camera.set_position(Point2::new(f64::NAN, 0.0));
        let bounds = camera.view_bounds();
        assert_abs_diff_eq!(bounds.left(), -500.0);
        assert_abs_diff_eq!(bounds.right(), 500.0);
        assert_abs_diff_eq!(bounds.top(), 500.0);
        assert_abs_diff_eq!(bounds.bottom(), -500.0);
    }

    #[test]
    fn test_poisoned_update_keeps_last_good_matrix() {
        let mut camera = FlatCamera::new(1.0);
        camera.set_position(Point2::new(25.0, -25.0));
        camera.update_projection();
        let good = *camera.projection();
        camera.set_position(Point2::new(f64::INFINITY, f64::NAN));
        camera.update_projection();
        assert_eq!(*camera.projection(), good);
    }

    #[test]
    fn test_matrix_stays_finite_under_abuse() {
        let mut camera = FlatCamera::new(1.0);
        let abuse = [
            Point2::new(f64::NAN, f64::NAN),
            Point2::new(f64::INFINITY, 0.0),
            Point2::new(0.0, f64::NEG_INFINITY),
            Point2::new(1e300, 1e300),
            Point2::new(3.0, 4.0),
        ];
        for p in abuse {
            camera.set_position(p);
            camera.set_zoom(f64::NAN);
            camera.update_projection();
            assert!(camera.projection().iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_zoom_clamps() {
        let mut camera = FlatCamera::new(1.0);
        camera.set_zoom(100.0);
        assert_abs_diff_eq!(camera.zoom(), ZOOM_MAX);
        camera.set_zoom(0.0);
        assert_abs_diff_eq!(camera.zoom(), ZOOM_MIN);
    }

    #[test]
    fn test_degenerate_aspect_rejected() {
        let mut camera = FlatCamera::new(2.0);
        camera.handle_aspect_change(0.0);
        assert_abs_diff_eq!(camera.aspect_ratio(), 2.0);
        camera.handle_aspect_change(-1.0);
        assert_abs_diff_eq!(camera.aspect_ratio(), 2.0);
        camera.handle_aspect_change(f64::NAN);
        assert_abs_diff_eq!(camera.aspect_ratio(), 2.0);
    }
}
