//! Fire-and-forget interaction reporting. Failures are logged and never
//! surface to the walk loop.

use glam::Vec3;
use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Request, RequestInit, Response};

const INTERACTION_ENDPOINT: &str = "/api/interaction";

#[derive(Serialize)]
struct InteractionReport<'a> {
    object_id: &'a str,
    position: [f32; 3],
}

/// POST one interaction event to the backend, off the frame loop.
pub fn report_interaction(object_id: &str, position: Vec3) {
    let report = InteractionReport { object_id, position: position.to_array() };
    let body = match serde_json::to_string(&report) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!("interaction report failed to serialize: {e}");
            return;
        }
    };

    spawn_local(async move {
        if let Err(err) = post_json(INTERACTION_ENDPOINT, &body).await {
            tracing::warn!(?err, "interaction report failed");
        }
    });
}

async fn post_json(url: &str, body: &str) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;

    let opts = RequestInit::new();
    opts.set_method("POST");
    opts.set_body(&JsValue::from_str(body));

    let request = Request::new_with_str_and_init(url, &opts)?;
    request.headers().set("Content-Type", "application/json")?;

    let response = JsFuture::from(window.fetch_with_request(&request)).await?;
    let response: Response = response.dyn_into()?;
    if !response.ok() {
        tracing::warn!(status = response.status(), "interaction endpoint rejected the report");
    }
    Ok(())
}
