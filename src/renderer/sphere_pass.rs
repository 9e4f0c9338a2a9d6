//! Instanced sphere pipelines, one per scheduled G-buffer pass.
//!
//! Every pipeline shares the vertex stage and the view uniform; they differ
//! in fragment entry point, target format and the depth state baked in from
//! the pass's [`PassStep`].

use wgpu::util::DeviceExt;

use super::gbuffer::{GBufferTargets, DEPTH_FORMAT};
use super::schedule::{ClearMode, FrameSchedule, PassKind, PassStep};
use crate::error::IllustrateError;
use crate::geometry::AttributeLayout;
use crate::gpu::instance_buffer::GpuInstanceBuffers;
use crate::gpu::pipeline_helpers::{depth_stencil_state, uniform_buffer};
use crate::gpu::shader_composer::{Shader, ShaderComposer};
use crate::math::Matrix4;

/// Sphere programs and their shared view uniform.
pub struct SpherePass {
    pipelines: Vec<(PassKind, wgpu::RenderPipeline)>,
    view_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl SpherePass {
    /// Compose the sphere shader and build one pipeline per step.
    ///
    /// # Errors
    ///
    /// Returns [`IllustrateError::ProgramBuild`] if the shader does not
    /// compose.
    pub fn new(
        device: &wgpu::Device,
        composer: &mut ShaderComposer,
        schedule: &FrameSchedule,
    ) -> Result<Self, IllustrateError> {
        let shader = composer.compose(device, Shader::Spheres, &[])?;

        let view_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Sphere View Buffer"),
                contents: bytemuck::cast_slice(&Matrix4::identity().to_gpu()),
                usage: wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_DST,
            });
        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Sphere View Layout"),
                entries: &[uniform_buffer(0, wgpu::ShaderStages::VERTEX)],
            });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sphere View Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: view_buffer.as_entire_binding(),
            }],
        });
        let pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Sphere Pipeline Layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let pipelines = schedule
            .steps()
            .iter()
            .map(|step| {
                (
                    step.pass,
                    Self::create_pipeline(device, &shader, &pipeline_layout, step),
                )
            })
            .collect();

        Ok(Self {
            pipelines,
            view_buffer,
            bind_group,
        })
    }

    fn create_pipeline(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        layout: &wgpu::PipelineLayout,
        step: &PassStep,
    ) -> wgpu::RenderPipeline {
        let buffers = AttributeLayout::vertex_buffer_layouts();
        let label = format!("Sphere {} Pipeline", step.pass);
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some(step.pass.fragment_entry()),
                targets: &[Some(wgpu::ColorTargetState {
                    format: step.pass.target_format(),
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            // Outward mesh triangles land clockwise in NDC because depth
            // grows away from the viewer along +z.
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Cw,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(depth_stencil_state(
                DEPTH_FORMAT,
                step.depth_compare.into(),
                step.depth_write,
            )),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    /// Whether a pipeline was built for `pass`.
    #[must_use]
    pub fn has_program(&self, pass: PassKind) -> bool {
        self.pipeline(pass).is_some()
    }

    fn pipeline(&self, pass: PassKind) -> Option<&wgpu::RenderPipeline> {
        self.pipelines
            .iter()
            .find(|(p, _)| *p == pass)
            .map(|(_, pipeline)| pipeline)
    }

    /// Upload the view matrix used by every following draw.
    pub fn update_view(&self, queue: &wgpu::Queue, view: &Matrix4) {
        queue.write_buffer(
            &self.view_buffer,
            0,
            bytemuck::cast_slice(&view.to_gpu()),
        );
    }

    /// Record every scheduled pass into `encoder`.
    ///
    /// # Errors
    ///
    /// Returns [`IllustrateError::MissingProgram`] or
    /// [`IllustrateError::MissingTarget`] if a step has no pipeline or
    /// target.
    pub fn record(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        schedule: &FrameSchedule,
        targets: &GBufferTargets,
        buffers: Option<&GpuInstanceBuffers>,
    ) -> Result<(), IllustrateError> {
        for step in schedule.steps() {
            let pipeline = self
                .pipeline(step.pass)
                .ok_or(IllustrateError::MissingProgram(step.pass))?;
            let target = targets
                .target(step.pass)
                .ok_or(IllustrateError::MissingTarget(step.pass))?;

            let depth_load = match step.clear {
                ClearMode::ColorAndDepth => wgpu::LoadOp::Clear(1.0),
                ClearMode::ColorOnly => wgpu::LoadOp::Load,
            };
            let label = format!("Sphere {} Pass", step.pass);
            let mut pass =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some(&label),
                    color_attachments: &[Some(
                        wgpu::RenderPassColorAttachment {
                            view: &target.view,
                            depth_slice: None,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(
                                    wgpu::Color::TRANSPARENT,
                                ),
                                store: wgpu::StoreOp::Store,
                            },
                        },
                    )],
                    depth_stencil_attachment: Some(
                        wgpu::RenderPassDepthStencilAttachment {
                            view: targets.depth_view(),
                            depth_ops: Some(wgpu::Operations {
                                load: depth_load,
                                store: wgpu::StoreOp::Store,
                            }),
                            stencil_ops: None,
                        },
                    ),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            if let Some(buffers) = buffers {
                buffers.draw(&mut pass);
            }
        }
        Ok(())
    }
}
