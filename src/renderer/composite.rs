//! Composite pass: decodes the G-buffer and draws the shaded, outlined
//! image over the background.

use wgpu::util::DeviceExt;

use super::gbuffer::GBufferTargets;
use super::schedule::{GBufferLayout, PassKind};
use crate::compositor::CompositeSettings;
use crate::error::IllustrateError;
use crate::gpu::pipeline_helpers::{
    clear_color, create_screen_space_pipeline, texture_2d_unfilterable,
    uniform_buffer,
};
use crate::gpu::shader_composer::{Shader, ShaderComposer, PACKED_GBUFFER_DEF};

/// Uniform block mirrored by `CompositeParams` in `composite.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CompositeParams {
    /// AO window half-width in pixels.
    pub ao_radius: i32,
    /// AO sample spacing in pixels.
    pub ao_step: i32,
    /// AO depth margin.
    pub ao_bias: f32,
    /// AO margin per pixel of distance.
    pub ao_falloff: f32,
    /// Occlusion per vote.
    pub ao_strength: f32,
    /// Lower clamp of the shadow factor.
    pub min_shadow: f32,
    /// Non-zero enables the group outline.
    pub group_enabled: u32,
    /// Group outline ramp start.
    pub group_low: f32,
    /// Group outline ramp end.
    pub group_high: f32,
    /// Non-zero enables the depth outline.
    pub depth_enabled: u32,
    /// Depth difference multiplier.
    pub depth_scale: f32,
    /// Scaled differences at or below this are ignored.
    pub depth_diff_min: f32,
    /// Scaled difference giving a full contribution.
    pub depth_diff_max: f32,
    /// Depth outline ramp start.
    pub depth_low: f32,
    /// Depth outline ramp end.
    pub depth_high: f32,
    /// Non-zero enables the residue outline.
    pub residue_enabled: u32,
    /// Index jump that counts as a boundary.
    pub residue_min_diff: u32,
    /// Residue outline ramp start.
    pub residue_low: f32,
    /// Residue outline ramp end.
    pub residue_high: f32,
    /// Non-zero enables fog.
    pub fog_enabled: u32,
    /// Fog color.
    pub fog_color: [f32; 3],
    /// Fog amount at the nearest depth.
    pub fog_front: f32,
    /// Fog amount at the farthest depth.
    pub fog_back: f32,
    /// Padding for GPU alignment.
    pub _pad: [u32; 3],
}

impl From<&CompositeSettings> for CompositeParams {
    fn from(s: &CompositeSettings) -> Self {
        let mut params = Self {
            ao_radius: s.ao.radius,
            ao_step: s.ao.step,
            ao_bias: s.ao.bias,
            ao_falloff: s.ao.falloff,
            ao_strength: s.ao.strength,
            min_shadow: s.ao.min_shadow,
            ..<Self as bytemuck::Zeroable>::zeroed()
        };
        if let Some(t) = s.group_outline {
            params.group_enabled = 1;
            params.group_low = t.low;
            params.group_high = t.high;
        }
        if let Some(d) = s.depth_outline {
            params.depth_enabled = 1;
            params.depth_scale = d.scale;
            params.depth_diff_min = d.diff_min;
            params.depth_diff_max = d.diff_max;
            params.depth_low = d.thresholds.low;
            params.depth_high = d.thresholds.high;
        }
        if let Some(r) = s.residue_outline {
            params.residue_enabled = 1;
            params.residue_min_diff = r.min_diff;
            params.residue_low = r.thresholds.low;
            params.residue_high = r.thresholds.high;
        }
        if let Some(f) = s.fog {
            params.fog_enabled = 1;
            params.fog_color = f.color;
            params.fog_front = f.front;
            params.fog_back = f.back;
        }
        params
    }
}

/// Texture bindings read by the composite for `layout`, in binding order
/// starting at 1.
#[must_use]
pub const fn input_passes(layout: GBufferLayout) -> &'static [PassKind] {
    layout.passes()
}

/// Composite pipeline and the bind group over the current G-buffer.
pub struct CompositePass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    params_buffer: wgpu::Buffer,
    background: wgpu::Color,
}

impl CompositePass {
    /// Compose the composite shader for the targets' layout and bind them.
    ///
    /// # Errors
    ///
    /// Returns [`IllustrateError::ProgramBuild`] if the shader does not
    /// compose, or [`IllustrateError::MissingTarget`] if `targets` lacks a
    /// channel the layout composes from.
    pub fn new(
        device: &wgpu::Device,
        composer: &mut ShaderComposer,
        targets: &GBufferTargets,
        output_format: wgpu::TextureFormat,
        settings: &CompositeSettings,
        background: [f32; 3],
    ) -> Result<Self, IllustrateError> {
        let layout = targets.layout();
        let defs: &[&str] = match layout {
            GBufferLayout::Packed => &[PACKED_GBUFFER_DEF],
            GBufferLayout::Layered => &[],
        };
        let shader = composer.compose(device, Shader::Composite, defs)?;

        let mut entries =
            vec![uniform_buffer(0, wgpu::ShaderStages::FRAGMENT)];
        entries.extend(
            (1..=input_passes(layout).len() as u32).map(texture_2d_unfilterable),
        );
        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Composite Bind Group Layout"),
                entries: &entries,
            });

        let params_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Composite Params Buffer"),
                contents: bytemuck::cast_slice(&[CompositeParams::from(
                    settings,
                )]),
                usage: wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_DST,
            });

        let bind_group = Self::create_bind_group(
            device,
            &bind_group_layout,
            &params_buffer,
            targets,
        )?;

        let pipeline = create_screen_space_pipeline(
            device,
            "Composite",
            &shader,
            output_format,
            Some(wgpu::BlendState::ALPHA_BLENDING),
            &[&bind_group_layout],
        );

        Ok(Self {
            pipeline,
            bind_group_layout,
            bind_group,
            params_buffer,
            background: clear_color(background),
        })
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        params_buffer: &wgpu::Buffer,
        targets: &GBufferTargets,
    ) -> Result<wgpu::BindGroup, IllustrateError> {
        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: params_buffer.as_entire_binding(),
        }];
        for (binding, &pass) in (1u32..).zip(input_passes(targets.layout())) {
            let target = targets
                .target(pass)
                .ok_or(IllustrateError::MissingTarget(pass))?;
            entries.push(wgpu::BindGroupEntry {
                binding,
                resource: wgpu::BindingResource::TextureView(&target.view),
            });
        }
        Ok(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Composite Bind Group"),
            layout,
            entries: &entries,
        }))
    }

    /// Rebind after the G-buffer targets were recreated.
    ///
    /// # Errors
    ///
    /// Returns [`IllustrateError::MissingTarget`] if a channel is missing.
    pub fn rebind(
        &mut self,
        device: &wgpu::Device,
        targets: &GBufferTargets,
    ) -> Result<(), IllustrateError> {
        self.bind_group = Self::create_bind_group(
            device,
            &self.bind_group_layout,
            &self.params_buffer,
            targets,
        )?;
        Ok(())
    }

    /// Upload new effect parameters and background.
    pub fn update_settings(
        &mut self,
        queue: &wgpu::Queue,
        settings: &CompositeSettings,
        background: [f32; 3],
    ) {
        queue.write_buffer(
            &self.params_buffer,
            0,
            bytemuck::cast_slice(&[CompositeParams::from(settings)]),
        );
        self.background = clear_color(background);
    }

    /// Clear `output` to the background and draw the composite over it.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        output: &wgpu::TextureView,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Composite Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.background),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use std::mem::size_of;

    use super::*;
    use crate::options::{PostProcessingOptions, WorldOptions};

    #[test]
    fn params_match_the_wgsl_block_size() {
        assert_eq!(size_of::<CompositeParams>(), 112);
        assert_eq!(size_of::<CompositeParams>() % 16, 0);
    }

    #[test]
    fn default_settings_enable_ao_and_two_outlines() {
        let params = CompositeParams::from(&CompositeSettings::default());
        assert_eq!((params.ao_radius, params.ao_step), (50, 5));
        assert_eq!(params.min_shadow, 0.3);
        assert_eq!(params.group_enabled, 1);
        assert_eq!((params.group_low, params.group_high), (3.0, 10.0));
        assert_eq!(params.depth_enabled, 1);
        assert_eq!(params.depth_scale, 80.0);
        assert_eq!(params.residue_enabled, 0);
        assert_eq!(params.fog_enabled, 0);
    }

    #[test]
    fn disabled_effects_are_zeroed() {
        let post = PostProcessingOptions {
            group_outline: false,
            depth_outline: false,
            ..Default::default()
        };
        let world = WorldOptions {
            fog_front: 0.2,
            fog_back: 0.6,
            fog_color: [0.5, 0.5, 0.5],
            ..Default::default()
        };
        let params =
            CompositeParams::from(&CompositeSettings::from_options(&post, &world));
        assert_eq!(params.group_enabled, 0);
        assert_eq!(params.group_high, 0.0);
        assert_eq!(params.depth_enabled, 0);
        assert_eq!(params.fog_enabled, 1);
        assert_eq!(params.fog_color, [0.5, 0.5, 0.5]);
    }

    #[test]
    fn each_layout_binds_its_passes_after_the_uniform() {
        assert_eq!(
            input_passes(GBufferLayout::Packed),
            &[PassKind::Color, PassKind::Depth, PassKind::Index, PassKind::Group]
        );
        assert_eq!(
            input_passes(GBufferLayout::Layered),
            &[PassKind::Color, PassKind::Layers]
        );
    }
}
