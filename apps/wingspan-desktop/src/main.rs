use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec2;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};
use wingspan_assets::ModelData;
use wingspan_common::{AppConfig, PositionFeed};
use wingspan_input::{Key, KeyEventKind, KeyboardHub};
use wingspan_overlay::{DebugPanel, FrameStats, Instructions, loader_label};
use wingspan_render_wgpu::WgpuRenderer;
use wingspan_scene::{DragMode, FrameClock, Scene, SceneAssets, SceneGraph, SceneKind, compose};

/// Wheel pixels that count as one line.
const PIXELS_PER_LINE: f32 = 50.0;

#[derive(Parser)]
#[command(name = "wingspan-desktop", about = "Butterfly and city scenes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene to show: butterfly or city
    #[arg(short, long, default_value = "butterfly")]
    scene: SceneKind,

    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Asset root, overriding the configuration
    #[arg(long)]
    assets: Option<PathBuf>,
}

fn key_from_code(code: KeyCode) -> Key {
    match code {
        KeyCode::ArrowUp => Key::ArrowUp,
        KeyCode::ArrowDown => Key::ArrowDown,
        KeyCode::ArrowLeft => Key::ArrowLeft,
        KeyCode::ArrowRight => Key::ArrowRight,
        _ => Key::Other,
    }
}

/// Application state.
struct AppState {
    // Dropped before the hub so key listeners detach first.
    scene: Box<dyn Scene>,
    hub: KeyboardHub,
    loads: SceneAssets,
    clock: FrameClock,
    debug_panel: Option<DebugPanel>,
    stats: FrameStats,
    /// Loaded models waiting for GPU upload.
    uploads: Vec<Arc<ModelData>>,
    cursor: Option<Vec2>,
    viewport: Vec2,
    graph: Option<SceneGraph>,
}

impl AppState {
    fn new(kind: SceneKind, config: &AppConfig) -> Self {
        let hub = KeyboardHub::new();
        let feed = PositionFeed::new();
        let mut scene = compose(kind, &hub, feed.clone(), &config.assets);
        let loads = SceneAssets::request_all(scene.as_mut());
        let debug_panel = scene
            .overlays()
            .debug_panel
            .then(|| DebugPanel::start(feed, config.overlay.debug_interval()));

        Self {
            scene,
            hub,
            loads,
            clock: FrameClock::start(),
            debug_panel,
            stats: FrameStats::new(),
            uploads: Vec::new(),
            cursor: None,
            viewport: Vec2::new(config.window.width as f32, config.window.height as f32),
            graph: None,
        }
    }

    fn update(&mut self) {
        let tick = self.clock.tick();
        self.uploads.extend(self.loads.poll(self.scene.as_mut()));
        self.scene.update(&tick);
        if let Some(panel) = &mut self.debug_panel {
            panel.poll();
        }
        self.stats.record();
        self.graph = Some(self.scene.graph());
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.viewport = Vec2::new(width.max(1) as f32, height.max(1) as f32);
        self.scene.camera_mut().set_viewport(width, height);
    }

    fn handle_key(&mut self, code: KeyCode, pressed: bool, repeat: bool) {
        let event = wingspan_input::KeyEvent {
            key: key_from_code(code),
            kind: if pressed {
                KeyEventKind::Down
            } else {
                KeyEventKind::Up
            },
            repeat,
        };
        self.hub.dispatch(event);
    }

    fn handle_mouse_button(&mut self, button: MouseButton, pressed: bool) {
        let orbit = self.scene.orbit_mut();
        if !pressed {
            orbit.end_drag();
            return;
        }
        match button {
            MouseButton::Left => orbit.begin_drag(DragMode::Rotate),
            MouseButton::Right => orbit.begin_drag(DragMode::Pan),
            _ => {}
        }
    }

    fn handle_cursor(&mut self, position: Option<Vec2>) {
        if let (Some(prev), Some(next)) = (self.cursor, position) {
            let viewport = self.viewport;
            self.scene.orbit_mut().pointer_moved(next - prev, viewport);
        }
        self.cursor = position;
        self.scene.pointer_moved(position, self.viewport);
    }

    fn handle_wheel(&mut self, delta: MouseScrollDelta) {
        let lines = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
        };
        self.scene.orbit_mut().wheel(lines);
    }

    fn draw_ui(&self, ctx: &EguiContext) {
        let panel_frame = egui::Frame::NONE
            .fill(egui::Color32::from_black_alpha(128))
            .corner_radius(8.0)
            .inner_margin(12.0);
        let layout = self.scene.overlays();

        if layout.instructions {
            let lines = Instructions::BUTTERFLY.lines();
            egui::Area::new(egui::Id::new("instructions"))
                .anchor(egui::Align2::LEFT_TOP, [16.0, 16.0])
                .show(ctx, |ui| {
                    panel_frame.show(ui, |ui| {
                        for (i, line) in lines.iter().enumerate() {
                            let text = egui::RichText::new(line.as_str())
                                .color(egui::Color32::WHITE);
                            ui.label(if i == 0 { text.size(20.0).strong() } else { text });
                        }
                    });
                });
        }

        if let Some(panel) = self.debug_panel.as_ref().filter(|_| layout.debug_panel) {
            egui::Area::new(egui::Id::new("debug_panel"))
                .anchor(egui::Align2::LEFT_BOTTOM, [8.0, -8.0])
                .show(ctx, |ui| {
                    panel_frame.show(ui, |ui| {
                        ui.label(egui::RichText::new(panel.text()).color(egui::Color32::WHITE));
                    });
                });
        }

        if layout.stats {
            egui::Area::new(egui::Id::new("stats"))
                .anchor(egui::Align2::LEFT_TOP, [0.0, 0.0])
                .show(ctx, |ui| {
                    egui::Frame::NONE
                        .fill(egui::Color32::from_rgb(0, 0, 34))
                        .inner_margin(4.0)
                        .show(ui, |ui| {
                            ui.label(
                                egui::RichText::new(self.stats.text())
                                    .monospace()
                                    .color(egui::Color32::from_rgb(0, 255, 255)),
                            );
                        });
                });
        }

        let center = |id: &str, text: String, color: egui::Color32| {
            egui::Area::new(egui::Id::new(id.to_owned()))
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(egui::RichText::new(text).size(18.0).color(color));
                });
        };
        if layout.loader {
            if let Some(percent) = self.loads.percent() {
                center("loader", loader_label(percent), egui::Color32::WHITE);
            }
        }
        if let Some(message) = self.scene.load_failure() {
            center("load_failure", message.to_owned(), egui::Color32::LIGHT_RED);
        }

        // World-anchored labels, projected every frame.
        if let Some(graph) = &self.graph {
            let camera = self.scene.camera();
            let painter = ctx.layer_painter(egui::LayerId::background());
            let points_per_pixel = 1.0 / ctx.pixels_per_point();
            for label in &graph.labels {
                let Some(screen) = camera.project(label.position, self.viewport) else {
                    continue;
                };
                let size =
                    label.font_size * camera.pixels_per_unit(label.position, self.viewport.y);
                let [r, g, b] = label.color.map(|c| (c.clamp(0.0, 1.0) * 255.0) as u8);
                painter.text(
                    egui::pos2(screen.x * points_per_pixel, screen.y * points_per_pixel),
                    egui::Align2::CENTER_CENTER,
                    &label.text,
                    egui::FontId::proportional((size * points_per_pixel).clamp(4.0, 256.0)),
                    egui::Color32::from_rgb(r, g, b),
                );
            }
        }
    }
}

struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn init(
        event_loop: &ActiveEventLoop,
        window_config: &wingspan_common::WindowConfig,
        egui_ctx: &EguiContext,
    ) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title(window_config.title.clone())
            .with_inner_size(PhysicalSize::new(window_config.width, window_config.height));
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
        .context("find adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("wingspan_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

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

        let renderer = WgpuRenderer::new(&device, surface_format, config.width, config.height);

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
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }
}

struct GpuApp {
    config: AppConfig,
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(kind: SceneKind, config: AppConfig) -> Self {
        Self {
            state: AppState::new(kind, &config),
            config,
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }

    fn redraw(&mut self) {
        self.state.update();

        let Some(gpu) = &mut self.gpu else {
            return;
        };
        for model in self.state.uploads.drain(..) {
            gpu.renderer.upload_model(&gpu.device, &model);
        }

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
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

        if let Some(graph) = &self.state.graph {
            let seconds = self.state.clock.elapsed().as_secs_f32();
            gpu.renderer.render(
                &gpu.device,
                &gpu.queue,
                &view,
                graph,
                self.state.scene.camera(),
                seconds,
            );
        }

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.draw_ui(ctx);
        });

        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        gpu.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
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
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::init(event_loop, &self.config.window, &self.egui_ctx) {
            Ok(gpu) => {
                self.state.resize(gpu.config.width, gpu.config.height);
                self.gpu = Some(gpu);
            }
            Err(e) => {
                tracing::error!("failed to initialize graphics: {e:#}");
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
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.config.width = new_size.width.max(1);
                    gpu.config.height = new_size.height.max(1);
                    gpu.surface.configure(&gpu.device, &gpu.config);
                    gpu.renderer
                        .resize(&gpu.device, gpu.config.width, gpu.config.height);
                    self.state.resize(gpu.config.width, gpu.config.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key,
                        state: key_state,
                        repeat,
                        ..
                    },
                ..
            } => {
                let code = match physical_key {
                    PhysicalKey::Code(code) => code,
                    PhysicalKey::Unidentified(_) => KeyCode::Fn,
                };
                self.state
                    .handle_key(code, key_state == ElementState::Pressed, repeat);
            }
            WindowEvent::MouseInput {
                button,
                state: btn_state,
                ..
            } => {
                self.state
                    .handle_mouse_button(button, btn_state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.state
                    .handle_cursor(Some(Vec2::new(position.x as f32, position.y as f32)));
            }
            WindowEvent::CursorLeft { .. } => {
                self.state.handle_cursor(None);
                self.state.scene.orbit_mut().end_drag();
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.state.handle_wheel(delta);
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
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
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    if let Some(root) = cli.assets {
        config.assets.root = root;
    }

    tracing::info!(scene = %cli.scene, "wingspan-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(cli.scene, config);
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn missing_assets() -> AppConfig {
        let mut config = AppConfig::default();
        config.assets.root = PathBuf::from("/nonexistent/wingspan-assets");
        config
    }

    #[test]
    fn arrow_codes_map_to_keys() {
        assert_eq!(key_from_code(KeyCode::ArrowUp), Key::ArrowUp);
        assert_eq!(key_from_code(KeyCode::ArrowRight), Key::ArrowRight);
        assert_eq!(key_from_code(KeyCode::KeyW), Key::Other);
    }

    #[test]
    fn keys_reach_the_butterfly() {
        let mut state = AppState::new(SceneKind::Butterfly, &missing_assets());
        state.handle_key(KeyCode::ArrowLeft, true, false);
        state.handle_key(KeyCode::ArrowLeft, true, true);
        state.update();
        let position = state.scene.tracked_position().unwrap();
        assert!(position.abs_diff_eq(Vec3::new(-0.2, 2.0, 0.0), 1e-6));
        assert!(state.graph.as_ref().unwrap().node("terrain").is_some());
    }

    #[test]
    fn city_scene_has_no_debug_panel() {
        let state = AppState::new(SceneKind::City, &missing_assets());
        assert!(state.debug_panel.is_none());
        assert!(state.scene.overlays().stats);
    }
}
