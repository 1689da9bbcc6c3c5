use anyhow::Result;
use clap::Parser;
use cubeview_frame::{Deferral, FramePipeline, RenderScheduler, RenderSignal};
use cubeview_panel::ScenePanel;
use cubeview_render_wgpu::{OrbitCamera, OrbitConfig, OrbitController, SceneRenderer, needs_resize};
use cubeview_scene::Scene;
use egui::Context as EguiContext;
use glam::Vec2;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "cubeview-desktop", about = "Interactive lit-cube scene viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Apply pointer input immediately instead of easing it out over frames
    #[arg(long)]
    no_damping: bool,
}

/// Everything the viewer simulates, independent of the GPU objects.
struct ViewerState {
    scene: Scene,
    camera: OrbitCamera,
    controller: OrbitController,
    panel: ScenePanel,
}

impl ViewerState {
    fn new(orbit: OrbitConfig, signal: RenderSignal) -> Self {
        let scene = Scene::demo();
        let mut camera = OrbitCamera::default();
        let controller = OrbitController::new(orbit, &mut camera);
        let panel = ScenePanel::new(&scene, signal);
        Self {
            scene,
            camera,
            controller,
            panel,
        }
    }
}

/// Defers a frame to the compositor: the scheduled frame arrives back as
/// `RedrawRequested`.
struct WindowDeferral(Arc<Window>);

impl Deferral for WindowDeferral {
    fn schedule(&self) {
        self.0.request_redraw();
    }
}

/// One frame's worth of work over the live surface. Split out of the app so
/// the scheduler can drive it through the `FramePipeline` seams.
struct SurfaceFrame<'a> {
    state: &'a mut ViewerState,
    window: &'a Arc<Window>,
    surface: &'a wgpu::Surface<'static>,
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    config: &'a mut wgpu::SurfaceConfiguration,
    renderer: &'a mut SceneRenderer,
    egui_ctx: &'a EguiContext,
    egui_winit: &'a mut egui_winit::State,
    egui_renderer: &'a mut egui_wgpu::Renderer,
    signal: RenderSignal,
}

impl FramePipeline for SurfaceFrame<'_> {
    fn sync_viewport(&mut self) {
        let size = self.window.inner_size();
        if needs_resize(self.config, size.width, size.height) {
            self.config.width = size.width.max(1);
            self.config.height = size.height.max(1);
            self.surface.configure(self.device, self.config);
            self.renderer
                .resize(self.device, self.config.width, self.config.height);
            self.state
                .camera
                .set_aspect(self.config.width, self.config.height);
            self.state.controller.set_viewport_height(self.config.height);
        }
    }

    fn advance_camera(&mut self) -> bool {
        self.state.controller.update(&mut self.state.camera)
    }

    fn draw(&mut self) {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(self.device, self.config);
                // This frame is spent; ask for a fresh one on the new surface.
                self.signal.notify();
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
            self.device,
            self.queue,
            &view,
            &self.state.camera,
            &self.state.scene,
        );

        let raw_input = self.egui_winit.take_egui_input(self.window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.panel.show(ctx, &mut self.state.scene);
        });

        self.egui_winit
            .handle_platform_output(self.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(self.device, self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            self.device,
            self.queue,
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
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        output.present();

        // egui sometimes needs a follow-up frame of its own (an open color
        // picker, text being edited). Only immediate requests are honored;
        // timed repaints would need a wakeup timer this viewer does not run.
        let repaint_now = full_output
            .viewport_output
            .get(&egui::ViewportId::ROOT)
            .is_some_and(|out| out.repaint_delay == Duration::ZERO);
        if repaint_now {
            self.signal.notify();
        }
    }
}

struct ViewerApp {
    no_damping: bool,
    state: Option<ViewerState>,
    scheduler: Option<RenderScheduler<WindowDeferral>>,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    device: Option<wgpu::Device>,
    queue: Option<wgpu::Queue>,
    surface_config: Option<wgpu::SurfaceConfiguration>,
    renderer: Option<SceneRenderer>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
}

impl ViewerApp {
    fn new(cli: &Cli) -> Self {
        Self {
            no_damping: cli.no_damping,
            state: None,
            scheduler: None,
            window: None,
            surface: None,
            device: None,
            queue: None,
            surface_config: None,
            renderer: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
        }
    }

    /// Run one frame now, without going through the scheduler's wakeup.
    /// `RedrawRequested`, resize, and the startup seed all land here.
    fn render_frame(&mut self) {
        let ViewerApp {
            state: Some(state),
            scheduler: Some(scheduler),
            window: Some(window),
            surface: Some(surface),
            device: Some(device),
            queue: Some(queue),
            surface_config: Some(config),
            renderer: Some(renderer),
            egui_ctx,
            egui_winit: Some(egui_winit),
            egui_renderer: Some(egui_renderer),
            ..
        } = self
        else {
            return;
        };

        let signal = scheduler.signal();
        let mut frame = SurfaceFrame {
            state,
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_ctx,
            egui_winit,
            egui_renderer,
            signal,
        };
        scheduler.run_frame(&mut frame);
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Cube Viewer")
            .with_inner_size(PhysicalSize::new(1200u32, 600));
        let window = Arc::new(event_loop.create_window(attrs).expect("create window"));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .expect("create surface");

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .expect("find adapter");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("cubeview_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .expect("create device");

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let scheduler = RenderScheduler::new(WindowDeferral(window.clone()));

        let orbit = OrbitConfig {
            damping_enabled: !self.no_damping,
            ..OrbitConfig::default()
        };
        let mut state = ViewerState::new(orbit, scheduler.signal());
        state.camera.set_aspect(config.width, config.height);
        state.controller.set_viewport_height(config.height);

        let renderer = SceneRenderer::new(
            &device,
            surface_format,
            config.width,
            config.height,
            &state.scene,
        );

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        self.window = Some(window);
        self.surface = Some(surface);
        self.device = Some(device);
        self.queue = Some(queue);
        self.surface_config = Some(config);
        self.renderer = Some(renderer);
        self.scheduler = Some(scheduler);
        self.state = Some(state);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        // Seed frame: painted directly so the window is never blank while
        // nothing has requested a render yet.
        self.render_frame();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // A release must always reach the controller, even when the pointer
        // ends up over the panel, or an orbit drag would never end.
        if let WindowEvent::MouseInput {
            state: ElementState::Released,
            ..
        } = &event
        {
            if let Some(state) = &mut self.state {
                state.controller.end_drag();
            }
        }

        if let (Some(window), Some(egui_winit)) = (&self.window, &mut self.egui_winit) {
            let response = egui_winit.on_window_event(window, &event);
            if response.consumed {
                // The panel took this event; give it a frame to react in.
                if response.repaint {
                    if let Some(scheduler) = &mut self.scheduler {
                        scheduler.request_render();
                    }
                }
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("close requested, exiting");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                tracing::debug!(
                    width = new_size.width,
                    height = new_size.height,
                    "window resized"
                );
                // Resizes repaint immediately instead of waiting for a
                // scheduled wakeup; the frame itself reconciles the surface
                // with the new size.
                self.render_frame();
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button,
                ..
            } => {
                if let Some(state) = &mut self.state {
                    match button {
                        MouseButton::Left => state.controller.begin_rotate(),
                        MouseButton::Right => state.controller.begin_pan(),
                        _ => {}
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let (Some(state), Some(scheduler)) = (&mut self.state, &mut self.scheduler) {
                    state.controller.pointer_moved(
                        Vec2::new(position.x as f32, position.y as f32),
                        &state.camera,
                    );
                    if state.controller.is_dragging()
                        && state.controller.update(&mut state.camera)
                    {
                        scheduler.request_render();
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if let (Some(state), Some(scheduler)) = (&mut self.state, &mut self.scheduler) {
                    let steps = match delta {
                        MouseScrollDelta::LineDelta(_, rows) => rows,
                        MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
                    };
                    state.controller.zoom_steps(steps);
                    if state.controller.update(&mut state.camera) {
                        scheduler.request_render();
                    }
                }
            }
            WindowEvent::CursorLeft { .. } => {
                if let Some(state) = &mut self.state {
                    state.controller.end_drag();
                }
            }
            WindowEvent::RedrawRequested => {
                self.render_frame();
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("cubeview-desktop starting");

    let event_loop = EventLoop::new()?;
    // Frames are on demand; the loop sleeps until an event or a scheduled
    // redraw arrives.
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = ViewerApp::new(&cli);
    event_loop.run_app(&mut app)?;

    Ok(())
}
