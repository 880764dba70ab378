use anyhow::Context;
use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::animation::AnimationDriver;
use crate::config::{SceneConfig, Tunables};
use crate::gfx::{rendering::RenderEngine, scene::Scene};
use crate::scene_builder::{build_scene, BuiltScene};
use crate::texture_pipeline::TexturePipeline;
use crate::ui::{light_rig_panel, PanelInfo, UiManager};
use crate::viewport::Viewport;

/// The windowed application: owns the event loop and all scene state
pub struct SnowlightApp {
    event_loop: EventLoop<()>,
    app_state: AppState,
}

struct AppState {
    config: SceneConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    scene: Scene,
    driver: AnimationDriver,
    textures: TexturePipeline,
    viewport: Viewport,
    tunables: Tunables,
    started: Instant,
    last_frame: Instant,
    frame_rate: f32,
    /// Setup failure that stopped the event loop
    fatal: Option<anyhow::Error>,
}

impl SnowlightApp {
    /// Builds the scene and starts decoding textures; the window opens in `run`
    pub fn new(config: SceneConfig) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().context("failed to create event loop")?;

        let mut rng = rand::rng();
        let BuiltScene {
            scene,
            texture_requests,
        } = build_scene(&config, &mut rng);
        let textures = TexturePipeline::spawn(texture_requests);

        let now = Instant::now();
        Ok(Self {
            event_loop,
            app_state: AppState {
                viewport: Viewport::new(config.window_width, config.window_height),
                tunables: config.tunables,
                driver: AnimationDriver::new(config.group_yaw_policy()),
                config,
                window: None,
                render_engine: None,
                ui_manager: None,
                scene,
                textures,
                started: now,
                last_frame: now,
                frame_rate: 0.0,
                fatal: None,
            },
        })
    }

    /// Runs the event loop until the window closes
    pub fn run(self) -> anyhow::Result<()> {
        let Self {
            event_loop,
            mut app_state,
        } = self;
        event_loop.set_control_flow(ControlFlow::Poll);

        event_loop
            .run_app(&mut app_state)
            .context("event loop terminated with an error")?;

        match app_state.fatal.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let attributes = WindowAttributes::default()
            .with_title("snowlight")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("failed to create window")?,
        );

        let (width, height) = window.inner_size().into();
        let snow_capacity = self.scene.snow.len() as u32;
        let window_clone = window.clone();
        let renderer = pollster::block_on(async move {
            RenderEngine::new(window_clone, width, height, snow_capacity).await
        })?;

        self.viewport = Viewport::new(width, height);
        self.scene
            .camera_manager
            .camera
            .resize_projection(self.viewport.width, self.viewport.height);

        let ui_manager = UiManager::new(
            renderer.device(),
            renderer.queue(),
            renderer.surface_format(),
            &window,
        );

        self.ui_manager = Some(ui_manager);
        self.render_engine = Some(renderer);
        self.window = Some(window);
        Ok(())
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if let KeyEvent {
            physical_key: PhysicalKey::Code(KeyCode::Escape),
            state: ElementState::Pressed,
            ..
        } = event
        {
            event_loop.exit();
            return;
        }
        self.scene.camera_manager.process_keyboard_event(event);
    }

    fn resize(&mut self, width: u32, height: u32) {
        if !self.viewport.resize(width, height) {
            return;
        }
        self.scene
            .camera_manager
            .camera
            .resize_projection(self.viewport.width, self.viewport.height);
        if let Some(render_engine) = self.render_engine.as_mut() {
            render_engine.resize(self.viewport.width, self.viewport.height);
        }
        log::debug!("Viewport resized to {}x{}", width, height);
    }

    fn redraw(&mut self) {
        let (Some(window), Some(render_engine)) = (self.window.as_ref(), self.render_engine.as_mut())
        else {
            return;
        };

        let applied = self.textures.poll(&mut self.scene.material_manager);
        if applied > 0 {
            log::debug!(
                "Applied {} textures, {} still loading",
                applied,
                self.textures.pending()
            );
        }

        let now = Instant::now();
        let now_millis = (now - self.started).as_secs_f64() * 1000.0;
        let frame_time = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        if frame_time > 0.0 {
            self.frame_rate = self.frame_rate * 0.95 + 0.05 / frame_time;
        }

        if self.driver.tick(self.tunables, now_millis, &mut self.scene) {
            log::info!(
                "Shadows {}",
                if self.tunables.shadows_enabled { "enabled" } else { "disabled" }
            );
        }
        render_engine.prepare(&mut self.scene);

        let info = PanelInfo {
            stats: self.scene.get_statistics(),
            pending_textures: self.textures.pending(),
            frame_rate: self.frame_rate,
        };
        let tunables = &mut self.tunables;

        match self.ui_manager.as_mut() {
            Some(ui_manager) => {
                render_engine.render_frame(
                    &self.scene,
                    Some(
                        |device: &wgpu::Device,
                         queue: &wgpu::Queue,
                         encoder: &mut wgpu::CommandEncoder,
                         color_attachment: &wgpu::TextureView| {
                            ui_manager.draw(device, queue, encoder, window, color_attachment, |ui| {
                                if light_rig_panel(ui, tunables, Some(&info)) {
                                    log::debug!("Tunables changed: {:?}", tunables);
                                }
                            });
                        },
                    ),
                );
            }
            None => {
                render_engine.render_frame(
                    &self.scene,
                    None::<fn(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView)>,
                );
            }
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(err) = self.init_graphics(event_loop) {
            log::error!("Graphics setup failed: {:#}", err);
            self.fatal = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };

        // Handle UI input first
        if let Some(ui_manager) = self.ui_manager.as_mut() {
            if ui_manager.handle_window_event(&window, window_id, &event) {
                window.request_redraw();
                return;
            }
        }

        match event {
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event_loop, &event),
            WindowEvent::Resized(PhysicalSize { width, height }) => self.resize(width, height),
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::RedrawRequested => self.redraw(),
            _ => (),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        let Some(window) = self.window.as_ref() else {
            return;
        };

        // Don't process camera events when UI is active
        if let Some(ui_manager) = self.ui_manager.as_ref() {
            if ui_manager.input_capture().blocks_camera() {
                return;
            }
        }

        self.scene.camera_manager.process_event(&event, window);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
