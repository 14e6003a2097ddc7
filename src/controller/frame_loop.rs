use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use web_sys::Window;
use wgpu::{Device, Queue, Surface, TextureView};

use crate::controller::FirstPersonController;
use crate::model::MeshBuffer;
use crate::view::render::MarkerInstance;
use crate::view::{CameraResources, RenderState};
use crate::{api, ui};

/// Per-frame driver for the web build: advances the controller, mirrors its
/// state into GPU uniforms and keeps the DOM overlay in sync.
pub struct FrameLoopContext {
    pub controller: Rc<RefCell<FirstPersonController>>,
    pub camera_resources: CameraResources,
    pub depth_view_cell: Rc<RefCell<TextureView>>,
    pub scene_meshes: Rc<RefCell<Vec<MeshBuffer>>>,
    pub last_time: Rc<RefCell<f64>>,
}

impl FrameLoopContext {
    pub fn update(
        &mut self,
        device: &Device,
        queue: &Queue,
        window: &Window,
        surface: &Surface,
        render_state: &mut RenderState,
    ) {
        let now = window.performance().map(|p| p.now()).unwrap_or(0.0);
        let mut last = self.last_time.borrow_mut();
        let dt = ((now - *last) / 1000.0) as f32;
        *last = now;
        drop(last);

        let modal_open = ui::is_modal_open();
        let mut ctrl = self.controller.borrow_mut();

        if !modal_open {
            ctrl.update(dt);

            if let Some(payload) = ctrl.poll_interaction() {
                tracing::info!(id = %payload.id, "interaction triggered");
                api::report_interaction(&payload.id, ctrl.position());
                ui::show_modal(&payload);
                // release the pointer so the modal is clickable
                if let Some(document) = window.document() {
                    document.exit_pointer_lock();
                }
            }
        }

        self.handle_resize(window, device, surface, render_state, &mut ctrl);

        // camera + lighting uniforms
        let view_proj = ctrl.camera.view_proj();
        queue.write_buffer(
            &self.camera_resources.camera_buffer,
            0,
            bytemuck::cast_slice(&view_proj.to_cols_array_2d()),
        );

        // markers billboard around the vertical axis only
        render_state
            .markers
            .write_uniform(queue, view_proj, ctrl.camera.right_flat(), Vec3::Y);

        let target_id = ctrl.probe.current(ctrl.points()).map(|p| p.id.clone());
        let instances: Vec<MarkerInstance> = ctrl
            .points()
            .iter()
            .map(|p| MarkerInstance {
                position: p.position,
                highlight: if target_id.as_deref() == Some(p.id.as_str()) { 1.0 } else { 0.0 },
            })
            .collect();
        render_state.markers.set_instances(queue, &instances);

        // overlay sync
        ui::set_prompt_visible(!modal_open && ctrl.can_interact());
        ui::set_coords(ctrl.position());
        ui::set_joystick_thumb(ctrl.input.joystick.displacement());
    }

    fn handle_resize(
        &self,
        window: &Window,
        device: &Device,
        surface: &Surface,
        render_state: &mut RenderState,
        ctrl: &mut FirstPersonController,
    ) {
        if let (Ok(w), Ok(h)) = (window.inner_width(), window.inner_height()) {
            let nw = w.as_f64().unwrap_or(800.0) as u32;
            let nh = h.as_f64().unwrap_or(600.0) as u32;
            if nw == render_state.width && nh == render_state.height {
                return;
            }
            ctrl.resize(nw, nh);
            render_state.width = nw;
            render_state.height = nh;

            let config = wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format: render_state.format,
                width: nw,
                height: nh,
                present_mode: wgpu::PresentMode::Fifo,
                alpha_mode: render_state.alpha_mode,
                view_formats: vec![],
                desired_maximum_frame_latency: 2,
            };
            surface.configure(device, &config);

            let (_, depth_view) = crate::view::create_depth_texture(device, nw, nh);
            *self.depth_view_cell.borrow_mut() = depth_view;

            // the pad may have moved with the layout
            if let Some((center, radius)) = ui::measure_joystick() {
                ctrl.input.joystick.set_geometry(center, radius);
            }
        }
    }
}
