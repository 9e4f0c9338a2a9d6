use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Neighborhood sampled for ambient occlusion.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum AoKernel {
    /// Every `ao_step`-th texel within `ao_radius` pixels.
    #[default]
    Sparse,
    /// Every texel of a 5×5 window.
    Dense,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Effects", inline)]
#[serde(default)]
/// Ambient occlusion and outline parameters for the composite pass.
pub struct PostProcessingOptions {
    #[schemars(title = "AO Kernel")]
    /// Occlusion sampling pattern.
    pub ao_kernel: AoKernel,
    /// Sparse kernel radius in pixels.
    #[schemars(title = "AO Radius", range(min = 5, max = 100))]
    pub ao_radius: u32,
    /// Sparse kernel spacing in pixels.
    #[schemars(skip)]
    pub ao_step: u32,
    /// Depth margin a neighbor needs before it occludes.
    #[schemars(skip)]
    pub ao_bias: f32,
    /// Extra margin per pixel of distance.
    #[schemars(skip)]
    pub ao_falloff: f32,
    /// Darkening per occluding sample.
    #[schemars(title = "AO Strength", range(min = 0.0, max = 0.01), extend("step" = 0.0005))]
    pub ao_strength: f32,
    /// Lower bound of the shadow factor.
    #[schemars(title = "Min Shadow", range(min = 0.0, max = 1.0), extend("step" = 0.05))]
    pub min_shadow: f32,

    /// Outline along group boundaries.
    #[schemars(title = "Group Outlines")]
    pub group_outline: bool,
    /// Differing-neighbor counts mapped to 0 and 1.
    #[schemars(skip)]
    pub group_thresholds: [f32; 2],

    /// Outline along depth discontinuities.
    #[schemars(title = "Contour Outlines")]
    pub depth_outline: bool,
    /// Multiplier from encoded depth difference to outline units.
    #[schemars(skip)]
    pub depth_scale: f32,
    /// Scaled depth differences mapped to 0 and 1 per neighbor.
    #[schemars(skip)]
    pub depth_diff_range: [f32; 2],
    /// Summed neighbor contributions mapped to 0 and 1.
    #[schemars(skip)]
    pub depth_thresholds: [f32; 2],

    /// Outline where the index channel jumps by `residue_diff` or more.
    #[schemars(title = "Residue Outlines")]
    pub residue_outline: bool,
    /// Minimum index difference counted as a residue boundary.
    #[schemars(skip)]
    pub residue_diff: u32,
    /// Differing-neighbor counts mapped to 0 and 1.
    #[schemars(skip)]
    pub residue_thresholds: [f32; 2],
}

impl Default for PostProcessingOptions {
    fn default() -> Self {
        Self {
            ao_kernel: AoKernel::Sparse,
            ao_radius: 50,
            ao_step: 5,
            ao_bias: 1.0 / 80.0,
            ao_falloff: 1.0 / 400.0,
            ao_strength: 0.002,
            min_shadow: 0.3,
            group_outline: true,
            group_thresholds: [3.0, 10.0],
            depth_outline: true,
            depth_scale: 80.0,
            depth_diff_range: [0.0, 5.0],
            depth_thresholds: [3.0, 10.0],
            residue_outline: false,
            residue_diff: 6000,
            residue_thresholds: [3.0, 20.0],
        }
    }
}
