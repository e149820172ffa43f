use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use lanternfield_common::{RenderConfig, SceneConfig};
use lanternfield_motion::{Population, SceneClock};
use lanternfield_render_wgpu::{LanternRenderer, OrbitCamera};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "lanternfield-desktop", about = "Floating lantern scene viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Population seed, overrides the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Number of lanterns, overrides the config file
    #[arg(long)]
    count: Option<usize>,
}

/// Application state that lives outside the GPU.
struct AppState {
    config: SceneConfig,
    population: Population,
    camera: OrbitCamera,
    clock: SceneClock,
    show_hud: bool,
    // Pointer state
    cursor: Option<PhysicalPosition<f64>>,
    rotating: bool,
    panning: bool,
    viewport_height: f32,
    // Frame timing
    last_frame: Instant,
    frame_time: f32,
    elapsed: f32,
}

impl AppState {
    fn new(config: SceneConfig) -> Self {
        let population = Population::from_config(&config.population);
        let camera = OrbitCamera::from_config(&config.camera);
        let clock = SceneClock::start(config.time_scale);

        tracing::info!(
            lanterns = population.len(),
            seed = population.seed(),
            "scene ready"
        );

        Self {
            config,
            population,
            camera,
            clock,
            show_hud: true,
            cursor: None,
            rotating: false,
            panning: false,
            viewport_height: 720.0,
            last_frame: Instant::now(),
            frame_time: 0.0,
            elapsed: 0.0,
        }
    }

    /// Advance one frame: apply camera input and sample the clock once.
    fn update(&mut self) {
        let now = Instant::now();
        self.frame_time = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.camera.update();
        self.elapsed = self.clock.elapsed();
    }

    /// Returns false for a zero-sized (minimised) viewport, which is ignored.
    fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            tracing::debug!(width, height, "ignoring zero-sized resize");
            return false;
        }
        self.camera.resize(width, height);
        self.viewport_height = height as f32;
        true
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if !pressed {
            return;
        }

        match key {
            KeyCode::Space => {
                let paused = self.clock.toggle_pause();
                tracing::info!("animation {}", if paused { "paused" } else { "resumed" });
            }
            KeyCode::F1 => {
                self.show_hud = !self.show_hud;
            }
            _ => {}
        }
    }

    fn handle_button(&mut self, button: MouseButton, pressed: bool) {
        match button {
            MouseButton::Left => self.rotating = pressed,
            MouseButton::Right => self.panning = pressed,
            _ => {}
        }
    }

    fn handle_cursor(&mut self, position: PhysicalPosition<f64>) {
        if let Some(last) = self.cursor {
            let dx = (position.x - last.x) as f32;
            let dy = (position.y - last.y) as f32;
            if self.rotating {
                self.camera.rotate(dx, dy, self.viewport_height);
            }
            if self.panning {
                self.camera.pan(dx, dy, self.viewport_height);
            }
        }
        self.cursor = Some(position);
    }

    /// The pointer is over the HUD. A later move must not jump from a stale
    /// position.
    fn pointer_captured_by_ui(&mut self) {
        self.cursor = None;
    }

    fn handle_wheel(&mut self, delta: MouseScrollDelta) {
        let steps = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(p) => p.y as f32 / 50.0,
        };
        self.camera.zoom(steps);
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.show_hud {
            return;
        }

        egui::Window::new("Lanternfield")
            .default_pos([12.0, 12.0])
            .resizable(false)
            .show(ctx, |ui| {
                let paused = if self.clock.is_paused() { " (paused)" } else { "" };
                ui.label(format!("Time: {:.2}s{paused}", self.elapsed));
                ui.label(format!("Frame: {:.2} ms", self.frame_time * 1000.0));
                ui.label(format!(
                    "Lanterns: {}  Seed: {}",
                    self.population.len(),
                    self.population.seed()
                ));
                let eye = self.camera.position();
                ui.label(format!(
                    "Camera: ({:.1}, {:.1}, {:.1}) dist {:.1}",
                    eye.x, eye.y, eye.z, self.camera.distance
                ));
                ui.separator();
                ui.small("LMB: Orbit | RMB: Pan | Wheel: Zoom | Space: Pause | F1: HUD");
            });
    }
}

/// Prefer a non-sRGB format: lantern colors are written to the screen as is,
/// without encoding.
fn pick_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .find(|f| !f.is_srgb())
        .or_else(|| formats.first())
        .copied()
}

/// Everything tied to the window and GPU device.
struct GpuContext {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: LanternRenderer,
    egui_ctx: EguiContext,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl GpuContext {
    fn new(event_loop: &ActiveEventLoop, state: &mut AppState) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Lanternfield")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("lanternfield_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = pick_surface_format(&surface_caps.formats)
            .context("surface reports no supported formats")?;
        if surface_format.is_srgb() {
            tracing::warn!(
                "no non-sRGB surface format available, lantern colors will look brighter"
            );
        }

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        state.resize(config.width, config.height);

        let mut render_config: RenderConfig = state.config.render.clone();
        let msaa_ok = adapter
            .get_texture_format_features(surface_format)
            .flags
            .sample_count_supported(render_config.msaa_samples);
        if !msaa_ok {
            tracing::warn!(
                "{}x MSAA unsupported for {surface_format:?}, rendering without it",
                render_config.msaa_samples
            );
            render_config.msaa_samples = 1;
        }

        let renderer = LanternRenderer::new(
            &device,
            surface_format,
            config.width,
            config.height,
            &state.population,
            state.config.palette,
            &render_config,
        )?;

        let egui_ctx = EguiContext::default();
        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend ({}x MSAA)",
            adapter.get_info().backend.to_str(),
            renderer.sample_count()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_ctx,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    fn render(&mut self, state: &mut AppState) {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.render(
            &self.device,
            &self.queue,
            &view,
            &state.camera,
            state.elapsed,
        );
        self.paint_ui(&view, state);

        output.present();
    }

    fn paint_ui(&mut self, view: &wgpu::TextureView, state: &mut AppState) {
        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx);
        });

        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<GpuContext>,
}

impl GpuApp {
    fn new(config: SceneConfig) -> Self {
        Self {
            state: AppState::new(config),
            gpu: None,
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        match GpuContext::new(event_loop, &mut self.state) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("failed to initialise GPU: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
        if response.consumed {
            // A drag that ends over the HUD still ends.
            match event {
                WindowEvent::MouseInput {
                    button,
                    state: ElementState::Released,
                    ..
                } => self.state.handle_button(button, false),
                WindowEvent::CursorMoved { .. } => self.state.pointer_captured_by_ui(),
                _ => {}
            }
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if self.state.resize(new_size.width, new_size.height) {
                    gpu.resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                if key == KeyCode::Escape {
                    event_loop.exit();
                    return;
                }
                self.state
                    .handle_key(key, key_state == ElementState::Pressed);
            }
            WindowEvent::MouseInput {
                button,
                state: btn_state,
                ..
            } => {
                self.state
                    .handle_button(button, btn_state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.state.handle_cursor(position);
            }
            WindowEvent::CursorLeft { .. } => {
                self.state.cursor = None;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.state.handle_wheel(delta);
            }
            WindowEvent::RedrawRequested => {
                self.state.update();
                gpu.render(&mut self.state);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    let config = SceneConfig::load_or_default(cli.config.as_deref())
        .context("load scene config")?
        .with_overrides(cli.seed, cli.count)
        .context("apply command-line overrides")?;

    tracing::info!("lanternfield-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(config);
    event_loop.run_app(&mut app)?;

    Ok(())
}
