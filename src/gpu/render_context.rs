//! Device, queue and presentation state shared by every pass.
//!
//! A context is either window-backed (it owns a configured surface) or
//! texture-only, in which case frames are drawn into views the caller
//! provides and [`RenderContext::get_next_frame`] always fails.

use std::fmt;

use super::capabilities::CapabilityReport;

/// Errors that can occur while opening a GPU context.
#[derive(Debug)]
pub enum RenderContextError {
    /// The window handle could not be turned into a surface.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No adapter matched the request.
    AdapterRequest(wgpu::RequestAdapterError),
    /// The adapter refused the device request.
    DeviceRequest(wgpu::RequestDeviceError),
    /// The adapter cannot present to this surface.
    UnsupportedSurface,
    /// The adapter lacks something the sphere pipeline needs.
    MissingCapability(String),
}

impl fmt::Display for RenderContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SurfaceCreation(e) => write!(f, "surface creation failed: {e}"),
            Self::AdapterRequest(e) => write!(f, "no usable GPU adapter: {e}"),
            Self::DeviceRequest(e) => write!(f, "device request failed: {e}"),
            Self::UnsupportedSurface => {
                write!(f, "adapter cannot present to this surface")
            }
            Self::MissingCapability(what) => {
                write!(f, "adapter is missing a required capability: {what}")
            }
        }
    }
}

impl std::error::Error for RenderContextError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SurfaceCreation(e) => Some(e),
            Self::AdapterRequest(e) => Some(e),
            Self::DeviceRequest(e) => Some(e),
            Self::UnsupportedSurface | Self::MissingCapability(_) => None,
        }
    }
}

/// A configured window surface.
struct Presentation {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
}

/// Device and queue plus what we learned about the adapter they came from.
pub struct RenderContext {
    /// The logical device.
    pub device: wgpu::Device,
    /// The command queue.
    pub queue: wgpu::Queue,
    /// Adapter capabilities (`None` for an externally created device).
    pub capabilities: Option<CapabilityReport>,
    presentation: Option<Presentation>,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
}

async fn open_device(
    instance: &wgpu::Instance,
    surface: Option<&wgpu::Surface<'static>>,
) -> Result<(wgpu::Adapter, wgpu::Device, wgpu::Queue), RenderContextError> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            compatible_surface: surface,
            power_preference: wgpu::PowerPreference::HighPerformance,
            ..Default::default()
        })
        .await
        .map_err(RenderContextError::AdapterRequest)?;
    log::info!(
        "using adapter {:?} ({:?})",
        adapter.get_info().name,
        adapter.get_info().backend
    );

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("Illustrate Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            ..Default::default()
        })
        .await
        .map_err(RenderContextError::DeviceRequest)?;
    Ok((adapter, device, queue))
}

impl RenderContext {
    /// Open a context that presents to `window`.
    ///
    /// # Errors
    ///
    /// Fails if the surface, adapter or device cannot be created, or if the
    /// adapter cannot present to the surface.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        initial_size: (u32, u32),
    ) -> Result<Self, RenderContextError> {
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window)
            .map_err(RenderContextError::SurfaceCreation)?;
        let (adapter, device, queue) = open_device(&instance, Some(&surface)).await?;

        let (width, height) = (initial_size.0.max(1), initial_size.1.max(1));
        let mut config = surface
            .get_default_config(&adapter, width, height)
            .ok_or(RenderContextError::UnsupportedSurface)?;
        config.present_mode = wgpu::PresentMode::Fifo;
        surface.configure(&device, &config);

        Ok(Self {
            capabilities: Some(CapabilityReport::from_adapter(&adapter)),
            format: config.format,
            width,
            height,
            presentation: Some(Presentation { surface, config }),
            device,
            queue,
        })
    }

    /// Open a texture-only context on a freshly requested adapter. Frames
    /// go through `render_to_view` with targets of `format`.
    ///
    /// # Errors
    ///
    /// Fails if no adapter or device is available.
    pub async fn headless(
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderContextError> {
        let instance = wgpu::Instance::default();
        let (adapter, device, queue) = open_device(&instance, None).await?;
        Ok(Self {
            capabilities: Some(CapabilityReport::from_adapter(&adapter)),
            presentation: None,
            format,
            width: width.max(1),
            height: height.max(1),
            device,
            queue,
        })
    }

    /// Wrap a device and queue owned by someone else. No adapter is
    /// available, so the capability check is left to the caller.
    #[must_use]
    pub fn from_device(
        device: wgpu::Device,
        queue: wgpu::Queue,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            device,
            queue,
            capabilities: None,
            presentation: None,
            format,
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Format of the final color output.
    #[must_use]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Current width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Current height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether this context owns a window surface.
    #[must_use]
    pub fn is_presentable(&self) -> bool {
        self.presentation.is_some()
    }

    /// Record the new viewport size and reconfigure the surface, if any.
    /// Zero-sized dimensions are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.width = width;
        self.height = height;
        if let Some(p) = &mut self.presentation {
            p.config.width = width;
            p.config.height = height;
            p.surface.configure(&self.device, &p.config);
        }
    }

    /// Acquire the next surface texture.
    ///
    /// # Errors
    ///
    /// Returns the surface's error, or [`wgpu::SurfaceError::Lost`] for a
    /// texture-only context.
    pub fn get_next_frame(&self) -> Result<wgpu::SurfaceTexture, wgpu::SurfaceError> {
        self.presentation
            .as_ref()
            .map_or(Err(wgpu::SurfaceError::Lost), |p| {
                p.surface.get_current_texture()
            })
    }

    /// Start recording a frame.
    #[must_use]
    pub fn create_encoder(&self) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            })
    }

    /// Finish `encoder` and queue it.
    pub fn submit(&self, encoder: wgpu::CommandEncoder) {
        let _ = self.queue.submit(std::iter::once(encoder.finish()));
    }
}
