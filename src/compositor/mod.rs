//! Screen-space ambient occlusion and outlines over a decoded G-buffer.
//!
//! Everything here is a pure per-pixel function of the G-buffer
//! neighborhood. The composite shader (`assets/shaders/screen/composite.wgsl`)
//! evaluates the same functions on the GPU with parameters taken from the
//! same [`CompositeSettings`].

/// G-buffer read access and CPU-side buffers.
pub mod source;

pub use source::{GBufferSource, LayeredGBuffer, PackedGBuffer};

use crate::options::{AoKernel, PostProcessingOptions, WorldOptions};

/// Linear ramp from `low` (→ 0) to `high` (→ 1), clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Input mapped to 0.
    pub low: f32,
    /// Input mapped to 1.
    pub high: f32,
}

impl Thresholds {
    /// Ramp from a `[low, high]` pair.
    #[must_use]
    pub const fn from_pair(pair: [f32; 2]) -> Self {
        Self {
            low: pair[0],
            high: pair[1],
        }
    }

    /// Map `v` onto `[0, 1]`.
    #[must_use]
    pub fn remap(&self, v: f32) -> f32 {
        ((v - self.low) / (self.high - self.low)).clamp(0.0, 1.0)
    }
}

/// Ambient-occlusion sampling and shading parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AoParams {
    /// Half-width of the sampled window in pixels; samples farther than
    /// this from the center are ignored.
    pub radius: i32,
    /// Spacing between samples in pixels.
    pub step: i32,
    /// Depth margin a neighbor must clear to occlude.
    pub bias: f32,
    /// Additional margin per pixel of distance.
    pub falloff: f32,
    /// Occlusion added per vote.
    pub strength: f32,
    /// Smallest shadow factor.
    pub min_shadow: f32,
}

impl AoParams {
    fn from_options(post: &PostProcessingOptions) -> Self {
        let (radius, step) = match post.ao_kernel {
            AoKernel::Sparse => (post.ao_radius as i32, post.ao_step.max(1) as i32),
            AoKernel::Dense => (2, 1),
        };
        Self {
            radius,
            step,
            bias: post.ao_bias,
            falloff: post.ao_falloff,
            strength: post.ao_strength,
            min_shadow: post.min_shadow,
        }
    }
}

/// Depth-discontinuity outline parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthOutlineParams {
    /// Multiplier applied to raw depth differences.
    pub scale: f32,
    /// Scaled differences at or below this are ignored.
    pub diff_min: f32,
    /// Scaled difference giving a full contribution.
    pub diff_max: f32,
    /// Ramp over the summed contributions.
    pub thresholds: Thresholds,
}

/// Minimum contributing neighbors before the depth outline switches from
/// the ramped sum to the mean contribution.
pub const DEPTH_AVERAGE_MIN_COUNT: u32 = 6;

/// Index-jump outline parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidueOutlineParams {
    /// Index difference that counts as a boundary.
    pub min_diff: u32,
    /// Ramp over the count of differing neighbors.
    pub thresholds: Thresholds,
}

/// Depth fog blended toward a fixed color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogParams {
    /// Fog color.
    pub color: [f32; 3],
    /// Fog amount at depth 1 (nearest).
    pub front: f32,
    /// Fog amount at depth 0 (farthest).
    pub back: f32,
}

/// Everything the composite needs, resolved from options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeSettings {
    /// Ambient occlusion.
    pub ao: AoParams,
    /// Group-boundary outline, if enabled.
    pub group_outline: Option<Thresholds>,
    /// Depth-discontinuity outline, if enabled.
    pub depth_outline: Option<DepthOutlineParams>,
    /// Index-jump outline, if enabled.
    pub residue_outline: Option<ResidueOutlineParams>,
    /// Depth fog, if any.
    pub fog: Option<FogParams>,
}

impl Default for CompositeSettings {
    fn default() -> Self {
        Self::from_options(&PostProcessingOptions::default(), &WorldOptions::default())
    }
}

impl CompositeSettings {
    /// Resolve settings from options.
    #[must_use]
    pub fn from_options(post: &PostProcessingOptions, world: &WorldOptions) -> Self {
        Self {
            ao: AoParams::from_options(post),
            group_outline: post
                .group_outline
                .then(|| Thresholds::from_pair(post.group_thresholds)),
            depth_outline: post.depth_outline.then(|| DepthOutlineParams {
                scale: post.depth_scale,
                diff_min: post.depth_diff_range[0],
                diff_max: post.depth_diff_range[1],
                thresholds: Thresholds::from_pair(post.depth_thresholds),
            }),
            residue_outline: post.residue_outline.then(|| ResidueOutlineParams {
                min_diff: post.residue_diff,
                thresholds: Thresholds::from_pair(post.residue_thresholds),
            }),
            fog: world.fog_enabled().then_some(FogParams {
                color: world.fog_color,
                front: world.fog_front,
                back: world.fog_back,
            }),
        }
    }
}

/// Occlusion score at `(x, y)`: votes from nearer neighbors times
/// `strength`. Background pixels score 0.
#[must_use]
pub fn ambient_occlusion(src: &impl GBufferSource, x: i64, y: i64, ao: &AoParams) -> f32 {
    let z = src.depth(x, y);
    if z <= 0.0 {
        return 0.0;
    }
    let step = ao.step.max(1) as usize;
    let radius = ao.radius as f32;
    let mut votes = 0u32;
    for j in (-ao.radius..=ao.radius).step_by(step) {
        for i in (-ao.radius..=ao.radius).step_by(step) {
            let dr = ((i * i + j * j) as f32).sqrt();
            if dr > radius {
                continue;
            }
            let sz = src.depth(x + i64::from(i), y + i64::from(j));
            if sz - ao.bias - dr * ao.falloff >= z {
                votes += 1;
            }
        }
    }
    votes as f32 * ao.strength
}

/// Shadow multiplier for an occlusion score.
#[must_use]
pub fn shadow_factor(occlusion: f32, min_shadow: f32) -> f32 {
    (1.0 - occlusion).clamp(min_shadow, 1.0)
}

/// Fraction of the 5×5 neighborhood lying in a different group, ramped.
#[must_use]
pub fn group_outline(src: &impl GBufferSource, x: i64, y: i64, thresholds: &Thresholds) -> f32 {
    let group = src.group(x, y);
    let mut differing = 0u32;
    for dy in -2..=2 {
        for dx in -2..=2 {
            if src.group(x + dx, y + dy) != group {
                differing += 1;
            }
        }
    }
    thresholds.remap(differing as f32)
}

/// Outline strength from depth jumps in the 5×5 neighborhood minus its
/// four corners. Background pixels get no outline.
///
/// Up to [`DEPTH_AVERAGE_MIN_COUNT`] contributors the summed contributions
/// are ramped through the thresholds; from there on the result is their
/// mean.
#[must_use]
pub fn depth_outline(
    src: &impl GBufferSource,
    x: i64,
    y: i64,
    params: &DepthOutlineParams,
) -> f32 {
    let z = src.depth(x, y);
    if z <= 0.0 {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut count = 0u32;
    for dy in -2i64..=2 {
        for dx in -2i64..=2 {
            if dx.abs() == 2 && dy.abs() == 2 {
                continue;
            }
            let rd = (src.depth(x + dx, y + dy) - z).abs() * params.scale;
            if rd <= params.diff_min {
                continue;
            }
            let contribution =
                ((rd - params.diff_min) / (params.diff_max - params.diff_min)).min(1.0);
            sum += contribution;
            count += 1;
        }
    }
    if count >= DEPTH_AVERAGE_MIN_COUNT {
        sum / count as f32
    } else {
        params.thresholds.remap(sum)
    }
}

/// Outline where neighboring indices jump by at least `min_diff`.
#[must_use]
pub fn residue_outline(
    src: &impl GBufferSource,
    x: i64,
    y: i64,
    params: &ResidueOutlineParams,
) -> f32 {
    let index = src.index(x, y);
    let mut jumps = 0u32;
    for dy in -2..=2 {
        for dx in -2..=2 {
            if src.index(x + dx, y + dy).abs_diff(index) >= params.min_diff {
                jumps += 1;
            }
        }
    }
    params.thresholds.remap(jumps as f32)
}

/// Final RGBA for one pixel.
#[must_use]
pub fn composite_pixel(
    src: &impl GBufferSource,
    x: u32,
    y: u32,
    settings: &CompositeSettings,
) -> [f32; 4] {
    let (px, py) = (i64::from(x), i64::from(y));
    let mut color = src.color_at(x, y);
    let z = src.depth_at(x, y);

    if let Some(fog) = &settings.fog {
        if z > 0.0 {
            let amount = fog.back + (fog.front - fog.back) * z;
            for (c, f) in color[..3].iter_mut().zip(fog.color) {
                *c += (f - *c) * amount;
            }
        }
    }

    let shadow = shadow_factor(
        ambient_occlusion(src, px, py, &settings.ao),
        settings.ao.min_shadow,
    );

    let mut outline = 0.0f32;
    if let Some(t) = &settings.group_outline {
        outline = outline.max(group_outline(src, px, py, t));
    }
    if let Some(p) = &settings.depth_outline {
        outline = outline.max(depth_outline(src, px, py, p));
    }
    if let Some(p) = &settings.residue_outline {
        outline = outline.max(residue_outline(src, px, py, p));
    }

    let darken = shadow * (1.0 - outline).clamp(0.0, 1.0);
    [
        color[0] * darken,
        color[1] * darken,
        color[2] * darken,
        outline.max(color[3]),
    ]
}

/// Composite every pixel, row by row.
#[must_use]
pub fn composite_image(src: &impl GBufferSource, settings: &CompositeSettings) -> Vec<[f32; 4]> {
    (0..src.height())
        .flat_map(|y| (0..src.width()).map(move |x| (x, y)))
        .map(|(x, y)| composite_pixel(src, x, y, settings))
        .collect()
}
