//! Pass ordering and per-pass depth/clear state.
//!
//! A frame runs every G-buffer pass in order, then one composite pass onto
//! the surface. The first pass clears color and depth and depth-tests with
//! `Less`, writing depth. Every later pass clears only color and tests with
//! `Equal` against the untouched depth buffer, so all passes shade exactly
//! the same visible pixels. The composite runs with no depth attachment.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::IllustrateError;

/// One offscreen G-buffer pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// Lit sphere color with alpha.
    Color,
    /// Raw `(depth, index, group, 1)` floats in one target.
    Layers,
    /// Codec-packed depth.
    Depth,
    /// Codec-packed instance index.
    Index,
    /// Codec-packed group id.
    Group,
}

impl PassKind {
    /// Every pass kind.
    pub const ALL: [Self; 5] =
        [Self::Color, Self::Layers, Self::Depth, Self::Index, Self::Group];

    /// Lower-case name used in labels and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Layers => "layers",
            Self::Depth => "depth",
            Self::Index => "index",
            Self::Group => "group",
        }
    }

    /// Format of this pass's color target.
    #[must_use]
    pub const fn target_format(self) -> wgpu::TextureFormat {
        match self {
            Self::Layers => wgpu::TextureFormat::Rgba32Float,
            Self::Color | Self::Depth | Self::Index | Self::Group => {
                wgpu::TextureFormat::Rgba8Unorm
            }
        }
    }

    /// Fragment entry point in the sphere shader.
    #[must_use]
    pub const fn fragment_entry(self) -> &'static str {
        match self {
            Self::Color => "fs_color",
            Self::Layers => "fs_layers",
            Self::Depth => "fs_depth",
            Self::Index => "fs_index",
            Self::Group => "fs_group",
        }
    }
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How depth, index and group reach the compositor.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum GBufferLayout {
    /// `color` plus one float target holding depth, index and group as raw
    /// floats.
    Layered,
    /// `color` plus three RGBA8 targets holding codec-packed depth, index
    /// and group.
    #[default]
    Packed,
}

impl GBufferLayout {
    /// Passes in execution order.
    #[must_use]
    pub const fn passes(self) -> &'static [PassKind] {
        match self {
            Self::Layered => &[PassKind::Color, PassKind::Layers],
            Self::Packed => &[
                PassKind::Color,
                PassKind::Depth,
                PassKind::Index,
                PassKind::Group,
            ],
        }
    }

    /// Whether `pass` is part of this layout.
    #[must_use]
    pub fn contains(self, pass: PassKind) -> bool {
        self.passes().contains(&pass)
    }
}

/// What a pass clears before drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearMode {
    /// Clear the color target and the shared depth buffer.
    ColorAndDepth,
    /// Clear the color target, keep depth.
    ColorOnly,
}

/// Depth comparison used by a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthCompare {
    /// Nearest fragment wins.
    Less,
    /// Only fragments matching the stored depth pass.
    Equal,
}

impl DepthCompare {
    /// Evaluate the comparison for an incoming fragment depth.
    #[must_use]
    pub fn passes(self, incoming: f32, stored: f32) -> bool {
        match self {
            Self::Less => incoming < stored,
            Self::Equal => incoming == stored,
        }
    }
}

impl From<DepthCompare> for wgpu::CompareFunction {
    fn from(compare: DepthCompare) -> Self {
        match compare {
            DepthCompare::Less => Self::Less,
            DepthCompare::Equal => Self::Equal,
        }
    }
}

/// Render state for one G-buffer pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassStep {
    /// Which pass.
    pub pass: PassKind,
    /// Clear behavior at pass start.
    pub clear: ClearMode,
    /// Depth test.
    pub depth_compare: DepthCompare,
    /// Whether the pass writes depth.
    pub depth_write: bool,
}

/// Validated pass order for one G-buffer layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSchedule {
    layout: GBufferLayout,
    steps: Vec<PassStep>,
}

impl FrameSchedule {
    /// Schedule `layout`'s passes in their default order.
    ///
    /// # Errors
    ///
    /// Never fails for the built-in layouts; returns the same errors as
    /// [`Self::new`].
    pub fn from_layout(layout: GBufferLayout) -> Result<Self, IllustrateError> {
        Self::new(layout, layout.passes())
    }

    /// Schedule `passes` in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`IllustrateError::InvalidSchedule`] if `passes` is empty,
    /// repeats a pass, names a pass outside `layout`, or omits one the
    /// layout composes from.
    pub fn new(
        layout: GBufferLayout,
        passes: &[PassKind],
    ) -> Result<Self, IllustrateError> {
        if passes.is_empty() {
            return Err(IllustrateError::InvalidSchedule(
                "no passes".to_owned(),
            ));
        }
        for (i, pass) in passes.iter().enumerate() {
            if passes[..i].contains(pass) {
                return Err(IllustrateError::InvalidSchedule(format!(
                    "{pass} pass scheduled twice"
                )));
            }
            if !layout.contains(*pass) {
                return Err(IllustrateError::InvalidSchedule(format!(
                    "{pass} pass does not belong to the {layout:?} layout"
                )));
            }
        }
        if let Some(missing) =
            layout.passes().iter().find(|p| !passes.contains(*p))
        {
            return Err(IllustrateError::InvalidSchedule(format!(
                "{missing} pass missing from the {layout:?} layout"
            )));
        }

        let steps = passes
            .iter()
            .enumerate()
            .map(|(i, &pass)| {
                if i == 0 {
                    PassStep {
                        pass,
                        clear: ClearMode::ColorAndDepth,
                        depth_compare: DepthCompare::Less,
                        depth_write: true,
                    }
                } else {
                    PassStep {
                        pass,
                        clear: ClearMode::ColorOnly,
                        depth_compare: DepthCompare::Equal,
                        depth_write: false,
                    }
                }
            })
            .collect::<Vec<_>>();

        log::debug!(
            "frame schedule ({layout:?}): {}",
            steps
                .iter()
                .map(|s| s.pass.name())
                .collect::<Vec<_>>()
                .join(" -> ")
        );

        Ok(Self { layout, steps })
    }

    /// The layout this schedule was built for.
    #[must_use]
    pub const fn layout(&self) -> GBufferLayout {
        self.layout
    }

    /// G-buffer passes in execution order.
    #[must_use]
    pub fn steps(&self) -> &[PassStep] {
        &self.steps
    }

    /// Check that every scheduled pass has a program and a target.
    ///
    /// # Errors
    ///
    /// Returns [`IllustrateError::MissingProgram`] or
    /// [`IllustrateError::MissingTarget`] for the first pass lacking one.
    pub fn validate(
        &self,
        has_program: impl Fn(PassKind) -> bool,
        has_target: impl Fn(PassKind) -> bool,
    ) -> Result<(), IllustrateError> {
        for step in &self.steps {
            if !has_program(step.pass) {
                return Err(IllustrateError::MissingProgram(step.pass));
            }
            if !has_target(step.pass) {
                return Err(IllustrateError::MissingTarget(step.pass));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_pass_clears_everything_and_tests_less() {
        let schedule = FrameSchedule::from_layout(GBufferLayout::Packed).unwrap();
        let first = schedule.steps()[0];
        assert_eq!(first.pass, PassKind::Color);
        assert_eq!(first.clear, ClearMode::ColorAndDepth);
        assert_eq!(first.depth_compare, DepthCompare::Less);
        assert!(first.depth_write);
    }

    #[test]
    fn later_passes_reuse_depth_with_equal() {
        let schedule = FrameSchedule::from_layout(GBufferLayout::Packed).unwrap();
        let later = &schedule.steps()[1..];
        assert_eq!(later.len(), 3);
        for step in later {
            assert_eq!(step.clear, ClearMode::ColorOnly);
            assert_eq!(step.depth_compare, DepthCompare::Equal);
            assert!(!step.depth_write);
        }
    }

    #[test]
    fn layered_layout_runs_two_passes() {
        let schedule = FrameSchedule::from_layout(GBufferLayout::Layered).unwrap();
        let passes: Vec<_> = schedule.steps().iter().map(|s| s.pass).collect();
        assert_eq!(passes, [PassKind::Color, PassKind::Layers]);
    }

    #[test]
    fn custom_order_moves_the_clearing_pass() {
        let schedule = FrameSchedule::new(
            GBufferLayout::Packed,
            &[PassKind::Depth, PassKind::Color, PassKind::Group, PassKind::Index],
        )
        .unwrap();
        assert_eq!(schedule.steps()[0].pass, PassKind::Depth);
        assert_eq!(schedule.steps()[0].clear, ClearMode::ColorAndDepth);
        assert_eq!(schedule.steps()[1].depth_compare, DepthCompare::Equal);
    }

    #[test]
    fn rejects_bad_pass_lists() {
        let layout = GBufferLayout::Packed;
        for passes in [
            &[][..],
            &[PassKind::Color, PassKind::Color][..],
            &[PassKind::Color, PassKind::Layers][..],
            &[PassKind::Color, PassKind::Depth, PassKind::Index][..],
        ] {
            assert!(matches!(
                FrameSchedule::new(layout, passes),
                Err(IllustrateError::InvalidSchedule(_))
            ));
        }
    }

    #[test]
    fn validate_reports_missing_program_then_target() {
        let schedule = FrameSchedule::from_layout(GBufferLayout::Packed).unwrap();
        assert!(schedule.validate(|_| true, |_| true).is_ok());
        assert!(matches!(
            schedule.validate(|p| p != PassKind::Index, |_| true),
            Err(IllustrateError::MissingProgram(PassKind::Index))
        ));
        assert!(matches!(
            schedule.validate(|_| true, |p| p != PassKind::Group),
            Err(IllustrateError::MissingTarget(PassKind::Group))
        ));
    }

    #[test]
    fn depth_compare_semantics() {
        assert!(DepthCompare::Less.passes(0.2, 0.5));
        assert!(!DepthCompare::Less.passes(0.5, 0.5));
        assert!(DepthCompare::Equal.passes(0.5, 0.5));
        assert!(!DepthCompare::Equal.passes(0.4, 0.5));
    }
}
