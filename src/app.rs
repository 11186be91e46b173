//! Application shell: window creation, the winit event loop and frame pacing.
//!
//! [`run`] builds the event loop and hands it an [`App`]. The window and all
//! GPU state are created in `resumed`; frames are driven by
//! `RedrawRequested`, which advances the game by the elapsed time, renders,
//! and requests the next redraw to keep the loop spinning.

use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

use crate::context::Context;
use crate::data_structures::registry::SceneRegistry;
use crate::game::{Game, WINDOW_HEIGHT, WINDOW_TITLE, WINDOW_WIDTH};
use crate::input::InputState;
use crate::renderer::Renderer;

/// Everything that exists once the window does.
struct AppState {
    ctx: Context,
    renderer: Renderer,
    registry: SceneRegistry,
    game: Game,
    input: InputState,
    is_surface_configured: bool,
}

impl AppState {
    fn new(window: Arc<Window>) -> Self {
        let setup = async {
            let ctx = Context::new(window).await?;
            let mut registry = SceneRegistry::new();
            let (renderer, handles) = Renderer::new(&ctx, &mut registry).await?;
            let game = Game::new(&handles);
            anyhow::Ok((ctx, renderer, registry, game))
        };
        match pollster::block_on(setup) {
            Ok((ctx, renderer, registry, game)) => Self {
                ctx,
                renderer,
                registry,
                game,
                input: InputState::new(),
                is_surface_configured: false,
            },
            Err(e) => panic!("App initialization failed. Cannot create the main context: {e}"),
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.resize(width, height);
            self.renderer.resize(&self.ctx);
            self.is_surface_configured = true;
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        self.renderer.render(&self.ctx, &self.registry, &self.game)
    }
}

pub struct App {
    state: Option<AppState>,
    last_time: Instant,
}

impl App {
    fn new() -> Self {
        Self {
            state: None,
            last_time: Instant::now(),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window_attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(LogicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT));
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => panic!("App initialization failed. Cannot create the window: {e}"),
        };
        self.state = Some(AppState::new(window));
        // Asset loading took a while; keep it out of the first frame's dt.
        self.last_time = Instant::now();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.input.handle_window_event(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                state.game.update(dt.as_secs_f32(), &state.input);
                if state.game.should_quit {
                    event_loop.exit();
                    return;
                }
                state.game.update_world_matrices();

                match state.render() {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of GPU memory, exiting");
                        event_loop.exit();
                    }
                    Err(e) => log::warn!("Dropped a frame: {e}"),
                }
            }
            _ => {}
        }
    }
}

pub fn run() -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    }

    let event_loop = EventLoop::new()?;
    let mut app = App::new();
    event_loop.run_app(&mut app)?;

    Ok(())
}
