pub mod logging;

// MVC architecture
pub mod controller;
pub mod model;
pub mod view;

#[cfg(target_arch = "wasm32")]
pub mod api;
#[cfg(target_arch = "wasm32")]
pub mod ui;

#[cfg(target_arch = "wasm32")]
use std::cell::RefCell;
#[cfg(target_arch = "wasm32")]
use std::rc::Rc;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::closure::Closure;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{prelude::wasm_bindgen, JsCast, JsValue};
#[cfg(target_arch = "wasm32")]
use web_sys::{
    Document, Event, HtmlCanvasElement, HtmlElement, KeyboardEvent, MouseEvent, TouchEvent, Window,
};

#[cfg(target_arch = "wasm32")]
use controller::{
    key_from_code, CollisionMesh, FirstPersonController, FrameLoopContext, InputEvent, TouchChannel,
};
#[cfg(target_arch = "wasm32")]
use model::{load_bundled_points, Mesh, SceneModel};
#[cfg(target_arch = "wasm32")]
use view::GpuContext;

#[cfg(target_arch = "wasm32")]
const SCENE_URL: &str = "/assets/scene.json";

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    logging::init();
    let (window, document, canvas) = init_canvas()?;
    setup_app(&window, &document, &canvas).await
}

/// Main application setup for the web build.
#[cfg(target_arch = "wasm32")]
async fn setup_app(
    window: &Window,
    document: &Document,
    canvas: &HtmlCanvasElement,
) -> Result<(), JsValue> {
    let width = canvas.width();
    let height = canvas.height();

    let gpu = GpuContext::new(canvas, width, height)
        .await
        .map_err(|e| js_error(format!("GPU init failed: {e:?}")))?;

    // touch capability decides the movement source for the whole session
    let touch_device = js_sys::Reflect::has(window.as_ref(), &JsValue::from_str("ontouchstart"))
        .unwrap_or(false);
    tracing::info!(touch_device, "controls selected");
    ui::configure_for_device(touch_device);

    let controller = Rc::new(RefCell::new(FirstPersonController::new(
        width,
        height,
        touch_device,
    )));
    if let Some((center, radius)) = ui::measure_joystick() {
        controller.borrow_mut().input.joystick.set_geometry(center, radius);
    }
    controller.borrow_mut().set_interest_points(load_bundled_points());

    // GPU-side resources
    let camera_resources = view::create_camera_resources(gpu.device.as_ref());
    let depth_format = wgpu::TextureFormat::Depth32Float;
    let (_depth_tex, depth_view) = view::create_depth_texture(gpu.device.as_ref(), width, height);
    let depth_view_cell = Rc::new(RefCell::new(depth_view));

    let scene_pipeline = view::create_scene_pipeline(
        gpu.device.as_ref(),
        gpu.format,
        &camera_resources.bind_group_layout,
        depth_format,
    );
    let markers = view::create_marker_resources(gpu.device.as_ref(), gpu.format, depth_format);

    let mut render_state = view::RenderState {
        format: gpu.format,
        alpha_mode: gpu.config.alpha_mode,
        width,
        height,
        scene_pipeline,
        markers,
    };

    // Scene model: downloaded, or the fallback floor if anything goes wrong.
    let scene = load_scene(window).await;
    let meshes: Vec<Mesh> = scene.nodes.iter().map(|n| n.to_mesh()).collect();

    // interactive props never block movement
    let solid: Vec<&Mesh> = scene
        .nodes
        .iter()
        .zip(meshes.iter())
        .filter(|(node, _)| !node.is_interactive())
        .map(|(_, mesh)| mesh)
        .collect();
    controller
        .borrow_mut()
        .set_collision_mesh(CollisionMesh::from_meshes(solid.into_iter()));

    let scene_meshes = Rc::new(RefCell::new(
        meshes.iter().map(|m| m.upload(gpu.device.as_ref())).collect::<Vec<_>>(),
    ));

    setup_input_listeners(document, window, canvas, controller.clone(), touch_device)?;

    let mut frame_ctx = FrameLoopContext {
        controller,
        camera_resources,
        depth_view_cell,
        scene_meshes,
        last_time: Rc::new(RefCell::new(
            window.performance().map(|p| p.now()).unwrap_or(0.0),
        )),
    };

    // Continuous redraw via requestAnimationFrame
    let raf = RafLoop::new(window.clone(), {
        let window_for_loop = window.clone();
        move || {
            frame_ctx.update(
                gpu.device.as_ref(),
                gpu.queue.as_ref(),
                &window_for_loop,
                &gpu.surface,
                &mut render_state,
            );

            let meshes = frame_ctx.scene_meshes.borrow();
            let dv = frame_ctx.depth_view_cell.borrow();
            render_state.draw_frame(
                gpu.device.as_ref(),
                gpu.queue.as_ref(),
                &gpu.surface,
                &meshes,
                &dv,
                &frame_ctx.camera_resources.camera_bind_group,
            );
        }
    });
    raf.start();

    Ok(())
}

#[cfg(target_arch = "wasm32")]
async fn load_scene(window: &Window) -> SceneModel {
    match fetch_text(window, SCENE_URL).await {
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
            tracing::error!(?e, "scene model download failed");
            SceneModel::fallback()
        }
    }
}

#[cfg(target_arch = "wasm32")]
async fn fetch_text(window: &Window, url: &str) -> Result<String, JsValue> {
    use wasm_bindgen_futures::JsFuture;

    let response = JsFuture::from(window.fetch_with_str(url)).await?;
    let response: web_sys::Response = response.dyn_into()?;
    if !response.ok() {
        return Err(js_error(format!("{url}: HTTP {}", response.status())));
    }
    let text = JsFuture::from(response.text()?).await?;
    text.as_string().ok_or_else(|| js_error("response body is not text"))
}

/// Wire up all DOM event listeners feeding the controller.
#[cfg(target_arch = "wasm32")]
fn setup_input_listeners(
    document: &Document,
    window: &Window,
    canvas: &HtmlCanvasElement,
    controller: Rc<RefCell<FirstPersonController>>,
    touch_device: bool,
) -> Result<(), JsValue> {
    // Keyboard down
    {
        let controller = controller.clone();
        let document_for_exit = document.clone();
        let keydown = Closure::wrap(Box::new(move |e: KeyboardEvent| {
            let code = e.code();
            match code.as_str() {
                "Escape" => {
                    document_for_exit.exit_pointer_lock();
                    ui::hide_modal();
                }
                "Space" => {
                    let mut ctrl = controller.borrow_mut();
                    if !ui::is_modal_open() && ctrl.is_locked() {
                        ctrl.jump();
                        e.prevent_default();
                    }
                }
                _ => {
                    if let Some(key) = key_from_code(&code) {
                        controller.borrow_mut().handle_event(&InputEvent::KeyDown(key));
                        e.prevent_default();
                    }
                }
            }
        }) as Box<dyn FnMut(KeyboardEvent)>);
        document.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
        keydown.forget();
    }

    // Keyboard up
    {
        let controller = controller.clone();
        let keyup = Closure::wrap(Box::new(move |e: KeyboardEvent| {
            if let Some(key) = key_from_code(&e.code()) {
                controller.borrow_mut().handle_event(&InputEvent::KeyUp(key));
            }
        }) as Box<dyn FnMut(KeyboardEvent)>);
        document.add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref())?;
        keyup.forget();
    }

    // Focus loss and tab switches release every held key
    {
        let controller = controller.clone();
        let blur = Closure::wrap(Box::new(move |_e: Event| {
            controller.borrow_mut().handle_event(&InputEvent::FocusLost);
        }) as Box<dyn FnMut(Event)>);
        window.add_event_listener_with_callback("blur", blur.as_ref().unchecked_ref())?;
        blur.forget();
    }
    {
        let controller = controller.clone();
        let visibility = Closure::wrap(Box::new(move |_e: Event| {
            controller.borrow_mut().handle_event(&InputEvent::FocusLost);
        }) as Box<dyn FnMut(Event)>);
        document
            .add_event_listener_with_callback("visibilitychange", visibility.as_ref().unchecked_ref())?;
        visibility.forget();
    }

    // Pointer lock change
    {
        let controller = controller.clone();
        let doc_pl = document.clone();
        let plc = Closure::wrap(Box::new(move |_e: Event| {
            let locked = doc_pl.pointer_lock_element().is_some();
            controller
                .borrow_mut()
                .handle_event(&InputEvent::PointerLockChanged { locked });
        }) as Box<dyn FnMut(Event)>);
        document.add_event_listener_with_callback("pointerlockchange", plc.as_ref().unchecked_ref())?;
        plc.forget();
    }

    // Canvas click enters pointer lock on desktop
    if !touch_device {
        let canvas_click = canvas.clone();
        let click = Closure::wrap(Box::new(move |_e: MouseEvent| {
            if ui::is_modal_open() {
                return;
            }
            if let Ok(html_el) = canvas_click.clone().dyn_into::<HtmlElement>() {
                html_el.request_pointer_lock();
            }
        }) as Box<dyn FnMut(MouseEvent)>);
        canvas.add_event_listener_with_callback("click", click.as_ref().unchecked_ref())?;
        click.forget();
    }

    // Mouse move (the controller ignores it while unlocked)
    {
        let controller = controller.clone();
        let mm = Closure::wrap(Box::new(move |e: MouseEvent| {
            controller.borrow_mut().handle_event(&InputEvent::MouseMove {
                dx: e.movement_x() as f32,
                dy: e.movement_y() as f32,
            });
        }) as Box<dyn FnMut(MouseEvent)>);
        document.add_event_listener_with_callback("mousemove", mm.as_ref().unchecked_ref())?;
        mm.forget();
    }

    // Modal close button: closing hands the pointer back on desktop
    if let Some(close) = document.get_element_by_id("modal-close") {
        let canvas_for_close = canvas.clone();
        let click = Closure::wrap(Box::new(move |_e: MouseEvent| {
            ui::hide_modal();
            if !touch_device {
                if let Ok(html_el) = canvas_for_close.clone().dyn_into::<HtmlElement>() {
                    html_el.request_pointer_lock();
                }
            }
        }) as Box<dyn FnMut(MouseEvent)>);
        close.add_event_listener_with_callback("click", click.as_ref().unchecked_ref())?;
        click.forget();
    }

    // Mobile action button doubles for the interact key
    if touch_device {
        if let Some(button) = document.get_element_by_id(ui::ACTION_BUTTON_ID) {
            let controller = controller.clone();
            let click = Closure::wrap(Box::new(move |_e: Event| {
                controller
                    .borrow_mut()
                    .handle_event(&InputEvent::KeyDown(crate::controller::Key::Interact));
            }) as Box<dyn FnMut(Event)>);
            button.add_event_listener_with_callback("click", click.as_ref().unchecked_ref())?;
            click.forget();
        }

        setup_touch_listeners(document, canvas, controller)?;
    }

    Ok(())
}

/// Joystick pad touches drive movement, canvas touches drive the look.
#[cfg(target_arch = "wasm32")]
fn setup_touch_listeners(
    document: &Document,
    canvas: &HtmlCanvasElement,
    controller: Rc<RefCell<FirstPersonController>>,
) -> Result<(), JsValue> {
    fn forward_touches(
        controller: &Rc<RefCell<FirstPersonController>>,
        e: &TouchEvent,
        channel: TouchChannel,
        phase: fn(TouchChannel, i32, f32, f32) -> InputEvent,
    ) {
        let touches = e.changed_touches();
        for i in 0..touches.length() {
            if let Some(touch) = touches.item(i) {
                let event = phase(
                    channel,
                    touch.identifier(),
                    touch.client_x() as f32,
                    touch.client_y() as f32,
                );
                controller.borrow_mut().handle_event(&event);
            }
        }
    }

    type Phase = fn(TouchChannel, i32, f32, f32) -> InputEvent;
    let start: Phase = |channel, id, x, y| InputEvent::TouchStart { channel, id, x, y };
    let moved: Phase = |channel, id, x, y| InputEvent::TouchMove { channel, id, x, y };
    let end: Phase = |channel, id, _x, _y| InputEvent::TouchEnd { channel, id };

    // first touch on the viewport asks for fullscreen
    {
        let doc = document.clone();
        let fullscreen = Closure::wrap(Box::new(move |_e: TouchEvent| {
            if doc.fullscreen_element().is_none() {
                if let Some(root) = doc.document_element() {
                    let _ = root.request_fullscreen();
                }
            }
        }) as Box<dyn FnMut(TouchEvent)>);
        canvas.add_event_listener_with_callback("touchstart", fullscreen.as_ref().unchecked_ref())?;
        fullscreen.forget();
    }

    let joystick_el = document
        .get_element_by_id(ui::JOYSTICK_ID)
        .ok_or_else(|| js_error("joystick element missing"))?;
    let targets: [(web_sys::EventTarget, TouchChannel); 2] = [
        (joystick_el.into(), TouchChannel::Joystick),
        (canvas.clone().into(), TouchChannel::Look),
    ];

    for (target, channel) in &targets {
        let channel = *channel;
        for (name, phase) in [("touchstart", start), ("touchmove", moved), ("touchend", end)] {
            let controller = controller.clone();
            let cb = Closure::wrap(Box::new(move |e: TouchEvent| {
                e.prevent_default();
                forward_touches(&controller, &e, channel, phase);
            }) as Box<dyn FnMut(TouchEvent)>);
            target.add_event_listener_with_callback(name, cb.as_ref().unchecked_ref())?;
            cb.forget();
        }
        // a cancelled touch behaves like a lift
        let controller = controller.clone();
        let cancel = Closure::wrap(Box::new(move |e: TouchEvent| {
            forward_touches(&controller, &e, channel, end);
        }) as Box<dyn FnMut(TouchEvent)>);
        target.add_event_listener_with_callback("touchcancel", cancel.as_ref().unchecked_ref())?;
        cancel.forget();
    }

    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn init_canvas() -> Result<(Window, Document, HtmlCanvasElement), JsValue> {
    let window = web_sys::window().ok_or_else(|| js_error("no global `window`"))?;
    let document = window.document().ok_or_else(|| js_error("no document on window"))?;

    let width = window
        .inner_width()?
        .as_f64()
        .unwrap_or(800.0) as u32;
    let height = window
        .inner_height()?
        .as_f64()
        .unwrap_or(600.0) as u32;

    // use the host page's canvas when present, otherwise make our own
    let canvas = match document.get_element_by_id("viewport") {
        Some(el) => el
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| js_error("#viewport is not a canvas"))?,
        None => {
            let body = document.body().ok_or_else(|| js_error("no body on document"))?;
            let el = document
                .create_element("canvas")?
                .dyn_into::<HtmlCanvasElement>()
                .map_err(|_| js_error("failed to create canvas"))?;
            body.append_child(&el)?;
            el
        }
    };
    canvas.set_width(width);
    canvas.set_height(height);

    Ok((window, document, canvas))
}

#[cfg(target_arch = "wasm32")]
fn js_error<E: Into<String>>(msg: E) -> JsValue {
    JsValue::from_str(&msg.into())
}

#[cfg(target_arch = "wasm32")]
struct RafLoop {
    inner: Rc<RefCell<Box<dyn FnMut()>>>,
    window: Window,
}

#[cfg(target_arch = "wasm32")]
impl RafLoop {
    fn new(window: Window, f: impl FnMut() + 'static) -> Self {
        Self { inner: Rc::new(RefCell::new(Box::new(f))), window }
    }

    fn start(self) {
        let inner = self.inner.clone();
        let window = self.window.clone();

        let callback = Rc::new(RefCell::new(None::<Closure<dyn FnMut()>>));
        let callback_clone = callback.clone();

        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            inner.borrow_mut().as_mut()();

            let cb_ref = callback_clone.borrow();
            window
                .request_animation_frame(cb_ref.as_ref().unwrap().as_ref().unchecked_ref())
                .expect("RAF failed");
        }) as Box<dyn FnMut()>));

        self.window
            .request_animation_frame(callback.borrow().as_ref().unwrap().as_ref().unchecked_ref())
            .expect("RAF start failed");

        // keep the closure alive for the page lifetime
        std::mem::forget(callback);
    }
}
