//! Interactive viewer: a random sphere cloud, drag to rotate, wheel to
//! zoom. An options TOML may be passed as the first argument.

use std::path::Path;
use std::sync::Arc;

use illustrate::engine::SphereRenderEngine;
use illustrate::error::IllustrateError;
use illustrate::geometry::demo::random_spheres;
use illustrate::input::DragTracker;
use illustrate::options::Options;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

const DEMO_SPHERES: u32 = 4000;
const DEMO_EXTENT: f32 = 24.0;
const DEMO_SEED: u64 = 0x5eed;
/// Wheel lines are converted to pixels at this rate.
const LINE_HEIGHT: f32 = 40.0;

struct ViewerApp {
    options: Options,
    window: Option<Arc<Window>>,
    engine: Option<SphereRenderEngine>,
    drag: DragTracker,
}

impl ViewerApp {
    fn new(options: Options) -> Self {
        let drag = DragTracker::new(&options.camera, 1, 1);
        Self {
            options,
            window: None,
            engine: None,
            drag,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<(), IllustrateError> {
        let attrs = Window::default_attributes()
            .with_title("illustrate")
            .with_inner_size(winit::dpi::LogicalSize::new(1024, 768));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .map_err(|e| IllustrateError::Viewer(e.to_string()))?,
        );
        let size = window.inner_size();
        let mut engine = pollster::block_on(SphereRenderEngine::new(
            Arc::clone(&window),
            (size.width, size.height),
            self.options.clone(),
        ))?;
        engine.rebuild_instances(&random_spheres(DEMO_SPHERES, DEMO_EXTENT, DEMO_SEED));
        self.drag.set_viewport(size.width, size.height);

        window.request_redraw();
        self.window = Some(window);
        self.engine = Some(engine);
        Ok(())
    }

    fn redraw(&mut self) {
        let (Some(window), Some(engine)) = (&self.window, &mut self.engine) else {
            return;
        };
        match engine.render() {
            Ok(()) => {}
            Err(IllustrateError::Surface(
                wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost,
            )) => {
                let inner = window.inner_size();
                log::warn!("surface lost; reconfiguring");
                if let Err(e) = engine.resize(inner.width, inner.height) {
                    log::error!("resize failed: {e}");
                }
            }
            Err(e) => log::error!("render error: {e}"),
        }
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            log::error!("failed to start viewer: {e}");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(size) => {
                self.drag.set_viewport(size.width, size.height);
                if let Some(engine) = &mut self.engine {
                    if let Err(e) = engine.resize(size.width, size.height) {
                        log::error!("resize failed: {e}");
                    }
                }
                self.request_redraw();
            }

            WindowEvent::RedrawRequested => self.redraw(),

            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.drag.set_pressed(state == ElementState::Pressed);
            }

            WindowEvent::CursorMoved { position, .. } => {
                if let Some(delta) =
                    self.drag.cursor_moved(position.x as f32, position.y as f32)
                {
                    if let Some(engine) = &mut self.engine {
                        engine.apply_view_delta(&delta);
                    }
                    self.request_redraw();
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                // winit reports scrolling up as positive.
                let pixels = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y * LINE_HEIGHT,
                    MouseScrollDelta::PixelDelta(pos) => -pos.y as f32,
                };
                let delta = self.drag.wheel(pixels);
                if let Some(engine) = &mut self.engine {
                    engine.apply_view_delta(&delta);
                }
                self.request_redraw();
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                self.drag.set_shift(modifiers.state().shift_key());
            }

            _ => (),
        }
    }
}

fn load_options() -> Options {
    let Some(arg) = std::env::args().nth(1) else {
        return Options::default();
    };
    match Options::load(Path::new(&arg)) {
        Ok(options) => {
            log::info!("loaded options from {arg}");
            options
        }
        Err(e) => {
            log::error!("could not load {arg}: {e}; using defaults");
            Options::default()
        }
    }
}

fn main() {
    env_logger::init();

    let options = load_options();
    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("failed to create event loop: {e}");
            return;
        }
    };
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = ViewerApp::new(options);
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("event loop error: {e}");
    }
}
