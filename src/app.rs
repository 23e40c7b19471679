//! Application shell: window, event loop, and per-frame orchestration
//!
//! [`BrumeApp`] owns the winit event loop and all engine state (no hidden
//! singletons); the frame sequence is input, layer update, UI build, GPU
//! sync, render, present. One logical thread drives everything.

use std::sync::Arc;
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes},
};

use crate::event::Event;
use crate::gfx::{assets::Assets, camera::Camera, rendering::RenderEngine, scene::Scene};
use crate::layer::{EngineContext, Layer};
use crate::ui::UiManager;

/// Startup configuration, passed once
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: "Brume".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

/// The engine application: owns the event loop and engine state
pub struct BrumeApp {
    event_loop: Option<EventLoop<()>>,
    state: AppState,
}

struct AppState {
    config: EngineConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,

    scene: Scene,
    assets: Assets,
    camera: Camera,

    layer: Option<Box<dyn Layer>>,
    last_frame: Instant,
    quit_requested: bool,
}

impl BrumeApp {
    pub fn new(config: EngineConfig) -> Self {
        // Logging is part of the engine bootstrap; harmless if the host
        // application installed a logger already
        let _ = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or("info"),
        )
        .try_init();

        let event_loop = EventLoop::new().expect("Failed to create event loop");

        let aspect = config.width as f32 / config.height.max(1) as f32;
        let camera = Camera::new(45.0, aspect, 0.1, 100.0);

        Self {
            event_loop: Some(event_loop),
            state: AppState {
                config,
                window: None,
                render_engine: None,
                ui_manager: None,
                scene: Scene::new(),
                assets: Assets::new(),
                camera,
                layer: None,
                last_frame: Instant::now(),
                quit_requested: false,
            },
        }
    }

    /// Installs the application layer driven by the frame loop
    pub fn set_layer(&mut self, layer: impl Layer + 'static) {
        self.state.layer = Some(Box::new(layer));
    }

    /// Runs the application, consuming self and blocking until exit
    pub fn run(mut self) {
        let event_loop = self.event_loop.take().expect("Event loop already consumed");
        event_loop.set_control_flow(ControlFlow::Poll);

        event_loop
            .run_app(&mut self.state)
            .expect("Failed to run event loop");
    }
}

impl AppState {
    fn dispatch_event(&mut self, event: &Event) {
        let AppState {
            scene,
            assets,
            camera,
            render_engine,
            layer,
            quit_requested,
            ..
        } = self;
        let (Some(engine), Some(layer)) = (render_engine.as_mut(), layer.as_mut()) else {
            return;
        };
        let mut ctx = EngineContext {
            scene,
            assets,
            camera,
            renderer: &mut *engine,
            quit: quit_requested,
        };
        layer.on_event(event, &mut ctx);
    }

    fn render_frame(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        let AppState {
            window,
            render_engine,
            ui_manager,
            scene,
            assets,
            camera,
            layer,
            quit_requested,
            ..
        } = self;
        let (Some(window), Some(engine)) = (window.as_ref(), render_engine.as_mut()) else {
            return;
        };

        if let Some(layer) = layer.as_mut() {
            let mut ctx = EngineContext {
                scene: &mut *scene,
                assets: &mut *assets,
                camera: &mut *camera,
                renderer: &mut *engine,
                quit: &mut *quit_requested,
            };
            layer.on_update(dt, &mut ctx);
        }

        // Build the UI before GPU sync so panel edits land this frame
        if let (Some(ui_manager), Some(layer)) = (ui_manager.as_mut(), layer.as_mut()) {
            ui_manager.update_logic(window, |ui| {
                layer.on_ui(ui, &mut *scene, &mut *assets);
            });
        }

        if let Some(layer) = layer.as_mut() {
            let mut ctx = EngineContext {
                scene: &mut *scene,
                assets: &mut *assets,
                camera: &mut *camera,
                renderer: &mut *engine,
                quit: &mut *quit_requested,
            };
            layer.on_render(&mut ctx);
        }

        // GPU sync: upload new assets, create per-object state, write uniforms
        assets.upload(engine.device(), engine.queue());
        scene.ensure_gpu_resources(engine.device(), assets);
        engine.update(camera);
        scene.prepare(engine.queue(), camera);

        if let Some(ui_manager) = ui_manager.as_mut() {
            engine.render_frame(
                scene,
                assets,
                Some(
                    |device: &wgpu::Device,
                     queue: &wgpu::Queue,
                     encoder: &mut wgpu::CommandEncoder,
                     view: &wgpu::TextureView| {
                        ui_manager.render_display_only(device, queue, encoder, view);
                    },
                ),
            );
        } else {
            engine.render_frame_simple(scene, assets);
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = WindowAttributes::default()
            .with_title(self.config.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.width,
                self.config.height,
            ));

        if let Ok(window) = event_loop.create_window(attributes) {
            let window_handle = Arc::new(window);
            self.window = Some(window_handle.clone());

            let (width, height) = window_handle.inner_size().into();
            let vsync = self.config.vsync;

            let window_clone = window_handle.clone();
            let engine = pollster::block_on(async move {
                RenderEngine::new(window_clone, width, height, vsync).await
            });

            self.camera.resize(width, height);

            let ui_manager = UiManager::new(
                engine.device(),
                engine.queue(),
                engine.surface_format(),
                &window_handle,
            );

            self.ui_manager = Some(ui_manager);
            self.render_engine = Some(engine);
            self.last_frame = Instant::now();

            // Application setup hook, now that the GPU context exists
            let AppState {
                scene,
                assets,
                camera,
                render_engine,
                layer,
                quit_requested,
                ..
            } = self;
            if let (Some(engine), Some(layer)) = (render_engine.as_mut(), layer.as_mut()) {
                let mut ctx = EngineContext {
                    scene,
                    assets,
                    camera,
                    renderer: &mut *engine,
                    quit: quit_requested,
                };
                layer.on_create(&mut ctx);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        if self.render_engine.is_none() || self.window.is_none() {
            return;
        }

        // UI gets first refusal on input events
        if let (Some(ui_manager), Some(window)) = (self.ui_manager.as_mut(), self.window.as_ref()) {
            let ui_event: winit::event::Event<()> = winit::event::Event::WindowEvent {
                window_id,
                event: event.clone(),
            };
            if ui_manager.handle_input(window, &ui_event) {
                window.request_redraw();
                return;
            }
        }

        if let Some(engine_event) = Event::from_window_event(&event) {
            self.dispatch_event(&engine_event);
        }

        match event {
            WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        physical_key: winit::keyboard::PhysicalKey::Code(key_code),
                        ..
                    },
                ..
            } => {
                if matches!(key_code, winit::keyboard::KeyCode::Escape) {
                    event_loop.exit();
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.camera.resize(width, height);
                if let Some(engine) = self.render_engine.as_mut() {
                    engine.resize(width, height);
                }
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                self.render_frame();
            }
            _ => (),
        }

        // Quit flag is honored at the frame boundary, never mid-frame
        if self.quit_requested {
            event_loop.exit();
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: winit::event::DeviceEvent,
    ) {
        // Raw motion is skipped while the UI owns the mouse
        if let Some(ui_manager) = self.ui_manager.as_ref() {
            if ui_manager.wants_input() {
                return;
            }
        }

        if let Some(engine_event) = Event::from_device_event(&event) {
            self.dispatch_event(&engine_event);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(layer) = self.layer.as_mut() {
            layer.on_destroy();
        }
    }
}
