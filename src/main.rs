use std::sync::Arc;

use glam::Vec3;
use winit::{
    event::*,
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use paseo::{controller, logging, model, view};

use controller::{CollisionMesh, FirstPersonController, InputEvent, Key};
use model::{load_bundled_points, Mesh, MeshBuffer, SceneModel};
use view::render::MarkerInstance;
use view::{CameraResources, GpuContext, RenderState};

const SCENE_PATH: &str = "assets/scene.json";

fn key_from_keycode(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::KeyW | KeyCode::ArrowUp => Some(Key::Forward),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(Key::Backward),
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::KeyE => Some(Key::Interact),
        _ => None,
    }
}

fn load_scene() -> SceneModel {
    match std::fs::read_to_string(SCENE_PATH) {
        Ok(json) => match SceneModel::from_json(&json) {
            Ok(model) => {
                tracing::info!(nodes = model.nodes.len(), "scene model loaded");
                model
            }
            Err(e) => {
                tracing::error!("scene model failed to parse: {e}");
                SceneModel::fallback()
            }
        },
        Err(e) => {
            tracing::warn!("no scene model at {SCENE_PATH} ({e}), using fallback floor");
            SceneModel::fallback()
        }
    }
}

struct App {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    window: Arc<Window>,

    render_state: RenderState,
    camera_resources: CameraResources,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    scene_meshes: Vec<MeshBuffer>,

    controller: FirstPersonController,
    last_frame_time: std::time::Instant,
}

impl App {
    async fn new(window: Arc<Window>) -> Self {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone()).unwrap();
        let gpu = GpuContext::new_native(instance, surface, size.width, size.height).await;

        let device = gpu.device.clone();
        let queue = gpu.queue.clone();
        let config = gpu.config.clone();

        let depth_format = wgpu::TextureFormat::Depth32Float;
        let (depth_texture, depth_view) =
            view::create_depth_texture(&device, size.width, size.height);

        let camera_resources = view::create_camera_resources(&device);
        let scene_pipeline = view::create_scene_pipeline(
            &device,
            config.format,
            &camera_resources.bind_group_layout,
            depth_format,
        );
        let markers = view::create_marker_resources(&device, config.format, depth_format);

        let render_state = RenderState {
            format: config.format,
            alpha_mode: config.alpha_mode,
            width: size.width,
            height: size.height,
            scene_pipeline,
            markers,
        };

        let mut controller = FirstPersonController::new(size.width, size.height, false);
        controller.set_interest_points(load_bundled_points());

        let scene = load_scene();
        let meshes: Vec<Mesh> = scene.nodes.iter().map(|n| n.to_mesh()).collect();
        let solid: Vec<&Mesh> = scene
            .nodes
            .iter()
            .zip(meshes.iter())
            .filter(|(node, _)| !node.is_interactive())
            .map(|(_, mesh)| mesh)
            .collect();
        controller.set_collision_mesh(CollisionMesh::from_meshes(solid.into_iter()));
        let scene_meshes = meshes.iter().map(|m| m.upload(&device)).collect();

        Self {
            surface: gpu.surface,
            device,
            queue,
            config,
            size,
            window,
            render_state,
            camera_resources,
            depth_texture,
            depth_view,
            scene_meshes,
            controller,
            last_frame_time: std::time::Instant::now(),
        }
    }

    fn grab_pointer(&mut self, grab: bool) {
        let mode = if grab {
            winit::window::CursorGrabMode::Locked
        } else {
            winit::window::CursorGrabMode::None
        };
        self.window.set_cursor_visible(!grab);
        if let Err(e) = self.window.set_cursor_grab(mode) {
            tracing::warn!("cursor grab failed: {e}");
        }
        self.controller
            .handle_event(&InputEvent::PointerLockChanged { locked: grab });
    }

    fn input(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event: KeyEvent { state, physical_key, repeat, .. },
                ..
            } => {
                if let PhysicalKey::Code(code) = physical_key {
                    match state {
                        ElementState::Pressed => match code {
                            KeyCode::Escape => self.grab_pointer(false),
                            KeyCode::Space => {
                                if !repeat {
                                    self.controller.jump();
                                }
                            }
                            _ => {
                                if let Some(key) = key_from_keycode(*code) {
                                    self.controller.handle_event(&InputEvent::KeyDown(key));
                                }
                            }
                        },
                        ElementState::Released => {
                            if let Some(key) = key_from_keycode(*code) {
                                self.controller.handle_event(&InputEvent::KeyUp(key));
                            }
                        }
                    }
                }
                true
            }
            WindowEvent::MouseInput { state: ElementState::Pressed, button: MouseButton::Left, .. } => {
                self.grab_pointer(true);
                true
            }
            WindowEvent::Focused(false) => {
                self.controller.handle_event(&InputEvent::FocusLost);
                true
            }
            _ => false,
        }
    }

    fn handle_mouse_motion(&mut self, dx: f64, dy: f64) {
        self.controller
            .handle_event(&InputEvent::MouseMove { dx: dx as f32, dy: dy as f32 });
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);

        let (depth_texture, depth_view) =
            view::create_depth_texture(&self.device, new_size.width, new_size.height);
        self.depth_texture = depth_texture;
        self.depth_view = depth_view;

        self.render_state.width = new_size.width;
        self.render_state.height = new_size.height;
        self.controller.resize(new_size.width, new_size.height);
    }

    fn update(&mut self, dt: f32) {
        self.controller.update(dt);

        if let Some(payload) = self.controller.poll_interaction() {
            // the native build has no modal; interactions just log
            tracing::info!(id = %payload.id, title = %payload.title, "{}", payload.description);
        }

        let view_proj = self.controller.camera.view_proj();
        self.queue.write_buffer(
            &self.camera_resources.camera_buffer,
            0,
            bytemuck::cast_slice(&view_proj.to_cols_array_2d()),
        );
        self.render_state.markers.write_uniform(
            &self.queue,
            view_proj,
            self.controller.camera.right_flat(),
            Vec3::Y,
        );

        let target_id = self
            .controller
            .probe
            .current(self.controller.points())
            .map(|p| p.id.clone());
        let instances: Vec<MarkerInstance> = self
            .controller
            .points()
            .iter()
            .map(|p| MarkerInstance {
                position: p.position,
                highlight: if target_id.as_deref() == Some(p.id.as_str()) { 1.0 } else { 0.0 },
            })
            .collect();
        self.render_state.markers.set_instances(&self.queue, &instances);
    }

    fn render(&mut self) {
        self.render_state.draw_frame(
            &self.device,
            &self.queue,
            &self.surface,
            &self.scene_meshes,
            &self.depth_view,
            &self.camera_resources.camera_bind_group,
        );
    }
}

fn main() {
    logging::init();

    let event_loop = EventLoop::new().unwrap();
    let window_attributes = Window::default_attributes()
        .with_title("paseo")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
    let window = event_loop.create_window(window_attributes).unwrap();
    let window = Arc::new(window);

    let mut app = pollster::block_on(App::new(window.clone()));

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { ref event, window_id } if window_id == app.window.id() => {
                if !app.input(event) {
                    match event {
                        WindowEvent::CloseRequested => elwt.exit(),
                        WindowEvent::Resized(physical_size) => app.resize(*physical_size),
                        WindowEvent::RedrawRequested => {
                            let now = std::time::Instant::now();
                            let dt = (now - app.last_frame_time).as_secs_f32();
                            app.last_frame_time = now;

                            app.update(dt);
                            app.render();
                        }
                        _ => {}
                    }
                }
            }
            Event::DeviceEvent { event: DeviceEvent::MouseMotion { delta }, .. } => {
                app.handle_mouse_motion(delta.0, delta.1);
            }
            Event::AboutToWait => {
                app.window.request_redraw();
            }
            _ => {}
        })
        .unwrap();
}
