//! Window, event loop and per-frame orchestration
//!
//! Each outer iteration (`about_to_wait`): sample the clock, run the steps the
//! pacing policy allows, and render once if any step ran. Rendering is
//! clear, sprite pass (bullets, centerpiece, HUD), end, present.

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::error::InitError;
use crate::frame::{DeadlinePacer, FpsCounter, FrameScheduler};
use crate::platform::Clock;
use crate::renderer::{GraphicsDevice, Pixels, SpriteInstance, SpriteRenderer, TextureHandle, text};
use crate::settings::{Pacing, Settings};
use crate::sim::Simulation;
use crate::trig;

/// Side length of the generated bullet texture (pixels)
const BULLET_TEXTURE_SIZE: u32 = 64;
/// HUD anchor, measured from the bottom-right corner
const HUD_OFFSET: Vec2 = Vec2::new(150.0, 40.0);
const HUD_LINE_HEIGHT: f32 = 18.0;

/// Everything that exists only once the window does
struct GpuState {
    window: Arc<Window>,
    gfx: GraphicsDevice,
    renderer: SpriteRenderer,
    bullet: TextureHandle,
    font: TextureHandle,
    centerpiece: Option<TextureHandle>,
}

pub struct App {
    settings: Settings,
    clock: Clock,
    scheduler: FrameScheduler,
    pacer: DeadlinePacer,
    fps: FpsCounter,
    sim: Simulation,
    gpu: Option<GpuState>,
    /// Set when the loop had to stop on an unrecoverable error
    fatal: Option<InitError>,
}

/// Open the window and run until it is closed
pub fn run(settings: Settings) -> Result<(), InitError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(settings);
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

impl App {
    pub fn new(settings: Settings) -> Self {
        let spf = settings.seconds_per_frame();
        let bounds = Vec2::new(settings.width as f32, settings.height as f32);
        let sim = Simulation::new(settings.bullet_capacity(), bounds, &settings.spawner);

        log::info!(
            "Pacing: {} at {} Hz, up to {} catch-up steps, vsync {}",
            settings.pacing.as_str(),
            settings.target_fps,
            settings.max_catch_up_steps,
            if settings.vsync { "on" } else { "off" }
        );

        Self {
            clock: Clock::with_max_delta(settings.max_frame_delta),
            scheduler: FrameScheduler::new(spf, settings.max_catch_up_steps, settings.max_frame_delta),
            pacer: DeadlinePacer::new(spf, 0.0),
            fps: FpsCounter::new(0.0),
            sim,
            gpu: None,
            fatal: None,
            settings,
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<GpuState, InitError> {
        let attrs = Window::default_attributes()
            .with_title(self.settings.title.clone())
            .with_inner_size(PhysicalSize::new(self.settings.width, self.settings.height));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let gfx = pollster::block_on(GraphicsDevice::new(window.clone(), self.settings.vsync))?;
        let mut renderer = SpriteRenderer::new(&gfx, self.settings.max_instances)?;

        let bullet = match &self.settings.bullet_texture {
            Some(path) => renderer.load_texture(&gfx, path)?,
            None => renderer.create_texture(&gfx, "bullet_disc", &Pixels::soft_disc(BULLET_TEXTURE_SIZE)),
        };
        let font = match &self.settings.font_atlas {
            Some(path) => renderer.load_texture(&gfx, path)?,
            None => renderer.create_texture(&gfx, "builtin_font", &text::builtin_atlas()),
        };
        let centerpiece = match &self.settings.centerpiece_texture {
            Some(path) => Some(renderer.load_texture(&gfx, path)?),
            None => None,
        };

        Ok(GpuState {
            window,
            gfx,
            renderer,
            bullet,
            font,
            centerpiece,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: InitError) {
        log::error!("{}", err);
        self.fatal = Some(err);
        event_loop.exit();
    }

    fn resize(&mut self, width: u32, height: u32) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        if width == 0 || height == 0 {
            return;
        }
        gpu.gfx.resize(width, height);
        gpu.renderer.set_projection(&gpu.gfx, width, height);
        self.sim.set_bounds(Vec2::new(width as f32, height as f32));
        log::debug!("Resized to {}x{}", width, height);
    }

    /// One outer iteration of the accumulator policy
    fn run_fixed_step(&mut self, event_loop: &ActiveEventLoop) {
        self.clock.tick();
        let budget = self.scheduler.advance(self.clock.delta_time());
        for _ in 0..budget.steps {
            self.sim.step();
        }

        if budget.render_due() {
            self.render(event_loop);
        } else {
            self.scheduler.idle(budget, self.settings.vsync);
        }
    }

    /// One outer iteration of the deadline policy
    fn run_deadline(&mut self, event_loop: &ActiveEventLoop) {
        self.sim.step();
        self.render(event_loop);
        self.pacer.wait(&mut self.clock, self.settings.vsync);
    }

    fn render(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        match gpu.gfx.clear(self.settings.clear_color) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.gfx.reconfigure();
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                self.fail(event_loop, InitError::OutOfMemory);
                return;
            }
            Err(e) => {
                log::warn!("Render error: {:?}", e);
                return;
            }
        }

        let (width, height) = gpu.gfx.size();
        let screen = Vec2::new(width as f32, height as f32);

        if let Some(mut pass) = gpu.renderer.begin(&gpu.gfx) {
            // Bullets first: one texture, so they coalesce into as few flushes as possible
            let bullet_size = Vec2::splat(self.settings.bullet_size);
            for p in self.sim.store.active() {
                pass.draw_sprite(&gpu.bullet, p.pos, p.angle - FRAC_PI_2, bullet_size);
            }

            if let Some(centerpiece) = &gpu.centerpiece {
                let size = Vec2::new(centerpiece.width() as f32, centerpiece.height() as f32) * 0.25;
                let rock = 0.2 * trig::sin(self.clock.total_time() as f32);
                // Negative x mirrors it horizontally
                pass.draw_sprite(centerpiece, screen * 0.5, rock, Vec2::new(-size.x, size.y));
            }

            if self.settings.show_fps {
                let hud = screen - HUD_OFFSET;
                let fps_line = format!("{:.2}FPS", self.fps.fps());
                let count_line = format!("B:{}", self.sim.store.len());
                pass.draw_text(&gpu.font, &fps_line, hud, 1.0, SpriteInstance::WHITE);
                pass.draw_text(
                    &gpu.font,
                    &count_line,
                    hud + Vec2::new(0.0, HUD_LINE_HEIGHT),
                    1.0,
                    SpriteInstance::WHITE,
                );
            }

            pass.end();
        }
        gpu.gfx.present();

        if let Some(fps) = self.fps.frame(self.clock.total_time()) {
            let stats = gpu.renderer.last_stats();
            log::debug!(
                "{:.2} FPS, {} bullets ({} spawns dropped), {} draw calls, {} instances, {} steps dropped",
                fps,
                self.sim.store.len(),
                self.sim.store.dropped(),
                stats.flushes,
                stats.instances,
                self.scheduler.dropped_total() + self.pacer.dropped_total()
            );
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        match self.init_gpu(event_loop) {
            Ok(gpu) => {
                let (width, height) = gpu.gfx.size();
                self.sim.set_bounds(Vec2::new(width as f32, height as f32));
                log::info!(
                    "Window {}x{}, {} bullets max, {} instances per flush",
                    width,
                    height,
                    self.sim.store.capacity(),
                    gpu.renderer.max_instances()
                );
                self.gpu = Some(gpu);

                // Start timing from here so setup time is not simulated
                let spf = self.settings.seconds_per_frame();
                self.clock = Clock::with_max_delta(self.settings.max_frame_delta);
                self.scheduler.reset();
                self.pacer = DeadlinePacer::new(spf, 0.0);
                self.fps = FpsCounter::new(0.0);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested after {} simulation steps", self.sim.ticks());
                event_loop.exit();
            }
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_none() || self.fatal.is_some() {
            return;
        }

        match self.settings.pacing {
            Pacing::FixedStep => self.run_fixed_step(event_loop),
            Pacing::Deadline => self.run_deadline(event_loop),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            log::info!("Shutting down window '{}'", gpu.window.title());
        }
    }
}
