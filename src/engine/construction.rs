//! Building the per-layout GPU pipeline.

use crate::compositor::CompositeSettings;
use crate::error::IllustrateError;
use crate::gpu::capabilities;
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::ShaderComposer;
use crate::options::Options;
use crate::renderer::composite::CompositePass;
use crate::renderer::gbuffer::GBufferTargets;
use crate::renderer::schedule::FrameSchedule;
use crate::renderer::sphere_pass::SpherePass;

/// Everything that depends on the G-buffer layout: the schedule, its
/// targets, and the programs for both stages.
pub(super) struct FramePipeline {
    pub schedule: FrameSchedule,
    pub targets: GBufferTargets,
    pub spheres: SpherePass,
    pub composite: CompositePass,
}

impl FramePipeline {
    /// Build and validate a complete pipeline for `options`. Nothing is
    /// shared with an existing pipeline, so a failed build leaves the
    /// caller's current one untouched.
    pub fn build(
        context: &RenderContext,
        composer: &mut ShaderComposer,
        options: &Options,
    ) -> Result<Self, IllustrateError> {
        let layout = options.pipeline.gbuffer_layout;
        if let Some(report) = &context.capabilities {
            capabilities::check(report, layout)?;
        }

        let schedule = FrameSchedule::from_layout(layout)?;
        let targets = GBufferTargets::new(
            &context.device,
            layout,
            context.width(),
            context.height(),
        );
        let spheres = SpherePass::new(&context.device, composer, &schedule)?;
        schedule.validate(
            |pass| spheres.has_program(pass),
            |pass| targets.has_target(pass),
        )?;

        let composite = CompositePass::new(
            &context.device,
            composer,
            &targets,
            context.format(),
            &CompositeSettings::from_options(
                &options.post_processing,
                &options.world,
            ),
            options.world.background,
        )?;

        Ok(Self {
            schedule,
            targets,
            spheres,
            composite,
        })
    }
}
