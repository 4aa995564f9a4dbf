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
use crate::flat_camera::FlatCamera;
use nalgebra::{Point2, Vector2};

pub const PAN_SPEED: f64 = 0.25;
pub const PAN_LIMIT: f64 = 10_000.0;
pub const SMOOTHING: f64 = 0.2;

#[derive(Clone, Debug)]
struct InputState {
    pan: Vector2<f64>,
    zoom_delta: f64,
    reset: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            pan: Vector2::zeros(),
            zoom_delta: 0.0,
            reset: false,
        }
    }
}

/// Pan/zoom intent accumulated from the host's input layer.
///
/// Input events mutate only the accumulated intent and the pan target;
/// `apply_input_state` commits them to the camera once per rendered frame.
/// The rendered position trails the pan target by the smoothing factor, so a
/// burst of mouse motion eases out over a few frames instead of teleporting.
#[derive(Clone, Debug)]
pub struct PanController {
    input: InputState,
    target: Point2<f64>,
    pan_speed: f64,
    smoothing: f64,
}

impl Default for PanController {
    fn default() -> Self {
        Self::new()
    }
}

impl PanController {
    pub fn new() -> Self {
        Self {
            input: InputState::default(),
            target: Point2::origin(),
            pan_speed: PAN_SPEED,
            smoothing: SMOOTHING,
        }
    }

    /// Smoothing of 1 snaps the camera to the target every frame.
    pub fn with_smoothing(mut self, smoothing: f64) -> Self {
        debug_assert!(smoothing > 0.0 && smoothing <= 1.0);
        self.smoothing = smoothing;
        self
    }

    pub fn with_pan_speed(mut self, pan_speed: f64) -> Self {
        self.pan_speed = pan_speed;
        self
    }

    pub fn handle_mousemotion(&mut self, dx: f64, dy: f64) {
        self.input.pan += Vector2::new(dx, dy);
    }

    pub fn handle_mousewheel(&mut self, delta: f64) {
        self.input.zoom_delta += delta;
    }

    pub fn handle_reset(&mut self) {
        self.input.reset = true;
    }

    /// Where the camera is headed, before smoothing.
    pub fn target(&self) -> Point2<f64> {
        self.target
    }

    /// Commit accumulated input to the camera and refresh its projection.
    /// Call exactly once per frame, before selection snapshots the camera.
    pub fn apply_input_state(&mut self, camera: &mut FlatCamera) {
        if std::mem::take(&mut self.input.reset) {
            self.input = InputState::default();
            self.target = Point2::origin();
            camera.set_position(Point2::origin());
            camera.set_zoom(1.0);
            camera.update_projection();
            return;
        }

        let zoom_delta = std::mem::take(&mut self.input.zoom_delta);
        if zoom_delta != 0.0 {
            camera.set_zoom(camera.zoom() + zoom_delta);
        }

        // Screen-down is world-up, and panning drags the world, not the
        // camera, hence the sign split. Scale shrinks with zoom so a pixel
        // of drag tracks roughly a pixel of world.
        let pan = std::mem::replace(&mut self.input.pan, Vector2::zeros());
        let scale = self.pan_speed / camera.zoom().max(0.1);
        self.target.x = (self.target.x - pan.x * scale).clamp(-PAN_LIMIT, PAN_LIMIT);
        self.target.y = (self.target.y + pan.y * scale).clamp(-PAN_LIMIT, PAN_LIMIT);

        let position = camera.position();
        camera.set_position(position + (self.target - position) * self.smoothing);
        camera.update_projection();
    }
}
