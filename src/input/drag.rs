//! Cursor drag and wheel tracking.
//!
//! Turns raw pointer positions and wheel deltas into [`ViewDelta`]s. The
//! tracker is window-system agnostic; the viewer feeds it winit events.

use std::f32::consts::PI;

use crate::camera::ViewDelta;
use crate::math::Matrix4;
use crate::options::CameraOptions;

/// Pointer state between events.
#[derive(Debug, Clone)]
pub struct DragTracker {
    last_pos: Option<(f32, f32)>,
    pressed: bool,
    shift: bool,
    viewport: (u32, u32),
    rotation_speed: f32,
    wheel_divisor: f32,
}

impl DragTracker {
    /// Tracker for a viewport of the given size.
    #[must_use]
    pub fn new(options: &CameraOptions, width: u32, height: u32) -> Self {
        Self {
            last_pos: None,
            pressed: false,
            shift: false,
            viewport: (width, height),
            rotation_speed: options.rotation_speed,
            wheel_divisor: options.wheel_divisor,
        }
    }

    /// Radians per pixel of drag. A drag across the longer viewport side
    /// turns the scene twice around.
    #[must_use]
    pub fn rotation_scale(&self) -> f32 {
        let longest = self.viewport.0.max(self.viewport.1).max(1);
        4.0 * PI / longest as f32 * self.rotation_speed
    }

    /// Track a viewport resize.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    /// Primary button pressed or released.
    pub fn set_pressed(&mut self, pressed: bool) {
        self.pressed = pressed;
    }

    /// Shift modifier state. While held, horizontal drags roll about Z.
    pub fn set_shift(&mut self, shift: bool) {
        self.shift = shift;
    }

    /// Record a cursor position; returns a rotation when the button is down.
    pub fn cursor_moved(&mut self, x: f32, y: f32) -> Option<ViewDelta> {
        let previous = self.last_pos.replace((x, y));
        if !self.pressed {
            return None;
        }
        let (px, py) = previous?;
        let (dx, dy) = (x - px, y - py);
        if dx == 0.0 && dy == 0.0 {
            return None;
        }
        let s = self.rotation_scale();
        let rotation = if self.shift {
            // Roll only; vertical motion is ignored.
            if dx == 0.0 {
                return None;
            }
            Matrix4::rotate_z(dx * s)
        } else {
            Matrix4::rotate_y(dx * s).multiply(&Matrix4::rotate_x(dy * s))
        };
        Some(ViewDelta {
            rotation,
            zoom: 0.0,
        })
    }

    /// Wheel movement in pixels, positive when scrolling down (away from
    /// the user). Scrolling down zooms out.
    #[must_use]
    pub fn wheel(&self, pixels: f32) -> ViewDelta {
        ViewDelta {
            rotation: Matrix4::identity(),
            zoom: -pixels / self.wheel_divisor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> DragTracker {
        DragTracker::new(&CameraOptions::default(), 800, 400)
    }

    #[test]
    fn no_rotation_without_button() {
        let mut t = tracker();
        assert_eq!(t.cursor_moved(10.0, 10.0), None);
        assert_eq!(t.cursor_moved(20.0, 10.0), None);
    }

    #[test]
    fn first_move_after_press_only_anchors() {
        let mut t = tracker();
        t.set_pressed(true);
        assert_eq!(t.cursor_moved(5.0, 5.0), None);
        assert!(t.cursor_moved(6.0, 5.0).is_some());
    }

    #[test]
    fn horizontal_drag_rotates_about_y() {
        let mut t = tracker();
        t.set_pressed(true);
        let _ = t.cursor_moved(0.0, 0.0);
        let delta = t.cursor_moved(100.0, 0.0).unwrap();
        let expected = Matrix4::rotate_y(100.0 * 4.0 * PI / 800.0);
        assert!(delta.rotation.max_abs_diff(&expected) < 1e-6);
    }

    #[test]
    fn shift_drag_rolls_about_z() {
        let mut t = tracker();
        t.set_pressed(true);
        t.set_shift(true);
        let _ = t.cursor_moved(0.0, 0.0);
        let delta = t.cursor_moved(100.0, 0.0).unwrap();
        let expected = Matrix4::rotate_z(100.0 * 4.0 * PI / 800.0);
        assert!(delta.rotation.max_abs_diff(&expected) < 1e-6);
    }

    #[test]
    fn shift_drag_ignores_vertical_motion() {
        let mut t = tracker();
        t.set_pressed(true);
        t.set_shift(true);
        let _ = t.cursor_moved(0.0, 0.0);
        let delta = t.cursor_moved(40.0, 90.0).unwrap();
        let expected = Matrix4::rotate_z(40.0 * 4.0 * PI / 800.0);
        assert!(delta.rotation.max_abs_diff(&expected) < 1e-6);

        assert_eq!(t.cursor_moved(40.0, 10.0), None);
    }

    #[test]
    fn wheel_maps_to_log_zoom() {
        let t = tracker();
        assert_eq!(t.wheel(100.0).zoom, -0.5);
        assert_eq!(t.wheel(-200.0).zoom, 1.0);
    }
}
