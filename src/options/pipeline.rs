use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::geometry::mesh::DEFAULT_SUBDIVISIONS;
use crate::renderer::schedule::GBufferLayout;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Pipeline", inline)]
#[serde(default)]
/// Setup-time pipeline choices. Changing these requires rebuilding the
/// engine.
pub struct PipelineOptions {
    /// Which set of G-buffer passes to run and how their channels are
    /// stored.
    #[schemars(title = "G-Buffer Layout")]
    pub gbuffer_layout: GBufferLayout,
    /// Icosphere subdivision level for every sphere.
    #[schemars(title = "Sphere Detail", range(min = 0, max = 5))]
    pub sphere_subdivisions: u32,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            gbuffer_layout: GBufferLayout::default(),
            sphere_subdivisions: DEFAULT_SUBDIVISIONS,
        }
    }
}
