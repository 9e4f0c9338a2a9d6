use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::camera::DEFAULT_ZOOM_LEVEL;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Camera", inline)]
#[serde(default)]
/// Initial view and pointer sensitivity.
pub struct CameraOptions {
    /// Zoom exponent at startup; the view scale is `exp(initial_zoom)`.
    #[schemars(title = "Initial Zoom", range(min = -8.0, max = 2.0), extend("step" = 0.1))]
    pub initial_zoom: f32,
    /// Rotation sensitivity multiplier.
    #[schemars(title = "Rotate Speed", range(min = 0.1, max = 2.0), extend("step" = 0.05))]
    pub rotation_speed: f32,
    /// Wheel pixels per unit of zoom exponent.
    #[schemars(skip)]
    pub wheel_divisor: f32,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            initial_zoom: DEFAULT_ZOOM_LEVEL,
            rotation_speed: 1.0,
            wheel_divisor: 200.0,
        }
    }
}
