//! Offscreen targets written by the G-buffer passes.

use super::schedule::{GBufferLayout, PassKind};
use crate::gpu::texture::RenderTarget;

/// Format of the depth-test buffer shared by every G-buffer pass.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// One color target per pass in a layout, plus the shared depth buffer.
pub struct GBufferTargets {
    layout: GBufferLayout,
    width: u32,
    height: u32,
    targets: Vec<(PassKind, RenderTarget)>,
    depth: RenderTarget,
}

impl GBufferTargets {
    /// Allocate every target for `layout` at `width × height`.
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        layout: GBufferLayout,
        width: u32,
        height: u32,
    ) -> Self {
        let targets = layout
            .passes()
            .iter()
            .map(|&pass| {
                let label = format!("G-Buffer {pass} Target");
                (
                    pass,
                    RenderTarget::new(
                        device,
                        &label,
                        width,
                        height,
                        pass.target_format(),
                    ),
                )
            })
            .collect();
        let depth = RenderTarget::new(
            device,
            "G-Buffer Depth Test",
            width,
            height,
            DEPTH_FORMAT,
        );
        log::info!("created {layout:?} G-buffer targets at {width}x{height}");
        Self {
            layout,
            width,
            height,
            targets,
            depth,
        }
    }

    /// Replace every target with one of the new size. The old textures
    /// are destroyed; bind groups referencing them must be rebuilt.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let next = Self::new(device, self.layout, width, height);
        let old = std::mem::replace(self, next);
        old.destroy();
    }

    /// Layout these targets were built for.
    #[must_use]
    pub const fn layout(&self) -> GBufferLayout {
        self.layout
    }

    /// Current size in pixels.
    #[must_use]
    pub const fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The color target written by `pass`, if this layout has one.
    #[must_use]
    pub fn target(&self, pass: PassKind) -> Option<&RenderTarget> {
        self.targets
            .iter()
            .find(|(p, _)| *p == pass)
            .map(|(_, t)| t)
    }

    /// Whether `pass` has a target.
    #[must_use]
    pub fn has_target(&self, pass: PassKind) -> bool {
        self.target(pass).is_some()
    }

    /// The shared depth-test view.
    #[must_use]
    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth.view
    }

    fn destroy(&self) {
        for (_, target) in &self.targets {
            target.destroy();
        }
        self.depth.destroy();
    }
}
