use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "World", inline)]
#[serde(default)]
/// Background and depth-fog colors.
pub struct WorldOptions {
    /// Surface clear color behind the spheres.
    #[schemars(title = "Background")]
    pub background: [f32; 3],
    /// Color blended in by depth fog.
    #[schemars(title = "Fog Color")]
    pub fog_color: [f32; 3],
    /// Fog opacity at the front of the scene.
    #[schemars(title = "Fog Front", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    pub fog_front: f32,
    /// Fog opacity at the back of the scene.
    #[schemars(title = "Fog Back", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    pub fog_back: f32,
}

impl Default for WorldOptions {
    fn default() -> Self {
        Self {
            background: [1.0, 1.0, 1.0],
            fog_color: [1.0, 1.0, 1.0],
            fog_front: 0.0,
            fog_back: 0.0,
        }
    }
}

impl WorldOptions {
    /// Whether fog changes any pixel.
    #[must_use]
    pub fn fog_enabled(&self) -> bool {
        self.fog_front > 0.0 || self.fog_back > 0.0
    }
}
