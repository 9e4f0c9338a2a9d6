//! Accumulated view rotation and zoom.
//!
//! Rotation composes as `accumulated · delta`. With row vectors this applies
//! each new drag after everything before it, so a drag always turns the
//! scene about the fixed screen axes no matter how it is already oriented.

use crate::math::Matrix4;

/// Zoom exponent used until the first wheel event.
pub const DEFAULT_ZOOM_LEVEL: f32 = -3.7;

/// One frame's worth of pointer-derived change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewDelta {
    /// Incremental rotation.
    pub rotation: Matrix4,
    /// Change of the log-scale zoom exponent.
    pub zoom: f32,
}

impl Default for ViewDelta {
    fn default() -> Self {
        Self {
            rotation: Matrix4::identity(),
            zoom: 0.0,
        }
    }
}

/// Rotation, log-scale zoom and viewport aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    /// Product of every rotation delta so far.
    pub rotation: Matrix4,
    /// Zoom exponent; the applied scale is `exp(zoom_level)`.
    pub zoom_level: f32,
    /// Viewport width / height.
    pub aspect: f32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(DEFAULT_ZOOM_LEVEL)
    }
}

impl ViewState {
    /// Unrotated view with the given zoom exponent and square aspect.
    #[must_use]
    pub fn new(zoom_level: f32) -> Self {
        Self {
            rotation: Matrix4::identity(),
            zoom_level,
            aspect: 1.0,
        }
    }

    /// Update the aspect ratio from a viewport size. Zero-sized viewports
    /// are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Fold one frame's delta into the state.
    pub fn apply(&mut self, delta: &ViewDelta) {
        self.rotation = self.rotation.multiply(&delta.rotation);
        self.zoom_level += delta.zoom;
    }

    /// Linear zoom factor.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.zoom_level.exp()
    }

    /// The matrix uploaded for the sphere passes.
    #[must_use]
    pub fn view_matrix(&self) -> Matrix4 {
        self.rotation
            .multiply(&Matrix4::identity().correct_aspect(self.aspect))
            .scale_uniform(self.scale())
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    const EPS: f32 = 1e-5;

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < EPS)
    }

    fn drag(rotation: Matrix4) -> ViewDelta {
        ViewDelta {
            rotation,
            zoom: 0.0,
        }
    }

    #[test]
    fn drags_rotate_about_screen_axes() {
        // Turn 90° about Y, then drag 90° about X. The second drag must act
        // on the already-turned scene: the point now on the screen X axis
        // stays put.
        let mut view = ViewState::new(0.0);
        view.apply(&drag(Matrix4::rotate_y(FRAC_PI_2)));
        view.apply(&drag(Matrix4::rotate_x(FRAC_PI_2)));

        let p = [0.0, 0.0, 1.0];
        let after_first = Matrix4::rotate_y(FRAC_PI_2).transform_point(p);
        assert!(close(after_first, [-1.0, 0.0, 0.0]));
        assert!(close(view.rotation.transform_point(p), [-1.0, 0.0, 0.0]));

        // The opposite order would have turned the same point onto +Y.
        let swapped =
            Matrix4::rotate_x(FRAC_PI_2).multiply(&Matrix4::rotate_y(FRAC_PI_2));
        assert!(close(swapped.transform_point(p), [0.0, 1.0, 0.0]));
    }

    #[test]
    fn zoom_accumulates_in_log_space() {
        let mut view = ViewState::default();
        view.apply(&ViewDelta {
            rotation: Matrix4::identity(),
            zoom: 0.7,
        });
        assert!((view.zoom_level - (-3.0)).abs() < EPS);
        assert!((view.scale() - (-3.0f32).exp()).abs() < EPS);
    }

    #[test]
    fn view_matrix_applies_aspect_and_scale() {
        let mut view = ViewState::new(2.0f32.ln());
        view.set_viewport(200, 100);
        let m = view.view_matrix();
        assert!(close(m.transform_point([1.0, 1.0, 1.0]), [1.0, 2.0, 2.0]));
        assert_eq!(m.rows[3], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn zero_viewport_keeps_aspect() {
        let mut view = ViewState::default();
        view.set_viewport(300, 150);
        view.set_viewport(0, 150);
        assert_eq!(view.aspect, 2.0);
    }
}
