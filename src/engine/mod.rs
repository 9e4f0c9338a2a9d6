//! The sphere rendering engine: owns every GPU resource and runs the
//! scheduled passes each frame.

mod construction;

use self::construction::FramePipeline;
use crate::camera::{ViewDelta, ViewState};
use crate::compositor::CompositeSettings;
use crate::error::IllustrateError;
use crate::geometry::{InstanceGeometry, InstanceRecord, SphereMesh};
use crate::gpu::instance_buffer::GpuInstanceBuffers;
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::ShaderComposer;
use crate::math::Matrix4;
use crate::options::Options;
use crate::renderer::schedule::FrameSchedule;

/// Deferred sphere renderer.
///
/// Rebuilds construct their replacement completely, swap it in, then
/// destroy what it replaced. A failed rebuild leaves the engine as it was.
pub struct SphereRenderEngine {
    /// Device, queue and (optional) surface.
    pub context: RenderContext,
    options: Options,
    composer: ShaderComposer,
    mesh: SphereMesh,
    pipeline: FramePipeline,
    records: Vec<InstanceRecord>,
    instances: Option<GpuInstanceBuffers>,
    view: ViewState,
}

impl SphereRenderEngine {
    /// Create a window-backed engine.
    ///
    /// # Errors
    ///
    /// Returns an error if GPU setup, the capability check, or program
    /// construction fails.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        size: (u32, u32),
        options: Options,
    ) -> Result<Self, IllustrateError> {
        let context = RenderContext::new(window, size).await?;
        Self::from_context(context, options)
    }

    /// Create an engine with no window. Frames are drawn with
    /// [`Self::render_to_view`] into textures of `format`.
    ///
    /// # Errors
    ///
    /// As for [`Self::new`].
    pub async fn headless(
        format: wgpu::TextureFormat,
        size: (u32, u32),
        options: Options,
    ) -> Result<Self, IllustrateError> {
        let context = RenderContext::headless(format, size.0, size.1).await?;
        Self::from_context(context, options)
    }

    /// Create an engine over an existing context.
    ///
    /// # Errors
    ///
    /// Returns an error if the capability check or program construction
    /// fails, or if the schedule is missing a program or target.
    pub fn from_context(
        context: RenderContext,
        options: Options,
    ) -> Result<Self, IllustrateError> {
        let mut composer = ShaderComposer::new()?;
        let pipeline = FramePipeline::build(&context, &mut composer, &options)?;
        let mesh = SphereMesh::icosphere(options.pipeline.sphere_subdivisions);

        let mut view = ViewState::new(options.camera.initial_zoom);
        view.set_viewport(context.width(), context.height());

        log::info!(
            "engine ready: {:?} layout, {} mesh vertices",
            options.pipeline.gbuffer_layout,
            mesh.vertex_count()
        );

        Ok(Self {
            context,
            options,
            composer,
            mesh,
            pipeline,
            records: Vec::new(),
            instances: None,
            view,
        })
    }

    /// Replace the instance set. An empty slice clears the scene.
    pub fn rebuild_instances(&mut self, instances: &[InstanceRecord]) {
        instances.clone_into(&mut self.records);
        self.upload_records();
    }

    fn upload_records(&mut self) {
        let geometry = InstanceGeometry::build(&self.mesh, &self.records);
        let buffers = GpuInstanceBuffers::upload(&self.context.device, &geometry);
        if let Some(old) = self.instances.replace(buffers) {
            old.destroy();
        }
    }

    /// Resize the surface and every G-buffer target, and rebind the
    /// composite to the new targets. Zero-sized dimensions are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`IllustrateError::MissingTarget`] if rebinding fails.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), IllustrateError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.context.resize(width, height);
        self.resize_targets()?;
        self.view.set_viewport(width, height);
        Ok(())
    }

    fn resize_targets(&mut self) -> Result<(), IllustrateError> {
        let (width, height) = (self.context.width(), self.context.height());
        self.pipeline
            .targets
            .resize(&self.context.device, width, height);
        self.pipeline
            .composite
            .rebind(&self.context.device, &self.pipeline.targets)
    }

    /// Whether the G-buffer targets match the current viewport size.
    #[must_use]
    pub fn targets_match_viewport(&self) -> bool {
        self.pipeline.targets.size() == (self.context.width(), self.context.height())
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Apply new options. Pipeline changes rebuild the G-buffer pipeline
    /// (and the sphere mesh when its detail changes); everything else is a
    /// uniform update.
    ///
    /// # Errors
    ///
    /// Returns an error if the rebuilt pipeline fails to construct; the
    /// previous options stay in effect.
    pub fn set_options(&mut self, options: Options) -> Result<(), IllustrateError> {
        if options.pipeline != self.options.pipeline {
            let pipeline =
                FramePipeline::build(&self.context, &mut self.composer, &options)?;
            self.pipeline = pipeline;
            if options.pipeline.sphere_subdivisions
                != self.options.pipeline.sphere_subdivisions
            {
                self.mesh = SphereMesh::icosphere(options.pipeline.sphere_subdivisions);
                self.upload_records();
            }
            log::info!("rebuilt pipeline for {:?}", options.pipeline);
        } else {
            self.pipeline.composite.update_settings(
                &self.context.queue,
                &CompositeSettings::from_options(&options.post_processing, &options.world),
                options.world.background,
            );
        }
        self.options = options;
        Ok(())
    }

    /// The active pass schedule.
    #[must_use]
    pub fn schedule(&self) -> &FrameSchedule {
        &self.pipeline.schedule
    }

    /// Number of spheres currently uploaded.
    #[must_use]
    pub fn instance_count(&self) -> u32 {
        self.instances.as_ref().map_or(0, |b| b.instance_count)
    }

    /// Accumulated view state.
    #[must_use]
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Fold one frame's pointer delta into the view.
    pub fn apply_view_delta(&mut self, delta: &ViewDelta) {
        self.view.apply(delta);
    }

    /// Render the engine's own view onto the surface.
    ///
    /// # Errors
    ///
    /// See [`Self::render_frame`].
    pub fn render(&mut self) -> Result<(), IllustrateError> {
        let view = self.view.view_matrix();
        self.render_frame(&view)
    }

    /// Render one frame under `view` onto the surface and present it.
    ///
    /// # Errors
    ///
    /// Returns [`IllustrateError::Surface`] if no frame could be acquired,
    /// or a missing program/target error from the passes.
    pub fn render_frame(&mut self, view: &Matrix4) -> Result<(), IllustrateError> {
        let frame = self.context.get_next_frame()?;
        let output = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.render_to_view(view, &output)?;
        frame.present();
        Ok(())
    }

    /// Render one frame under `view` into `output`, which must have the
    /// context's format and size.
    ///
    /// # Errors
    ///
    /// Returns a missing program/target error from the passes.
    pub fn render_to_view(
        &mut self,
        view: &Matrix4,
        output: &wgpu::TextureView,
    ) -> Result<(), IllustrateError> {
        if !self.targets_match_viewport() {
            log::warn!("G-buffer targets out of date; resizing before drawing");
            self.resize_targets()?;
        }
        self.pipeline.spheres.update_view(&self.context.queue, view);

        let mut encoder = self.context.create_encoder();
        self.pipeline.spheres.record(
            &mut encoder,
            &self.pipeline.schedule,
            &self.pipeline.targets,
            self.instances.as_ref(),
        )?;
        self.pipeline.composite.render(&mut encoder, output);
        self.context.submit(encoder);
        Ok(())
    }
}
