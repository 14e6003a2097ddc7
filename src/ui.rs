//! DOM overlay: modal card, interaction prompt, joystick pad and the little
//! coordinate readout. All lookups are by element id and tolerate a page
//! that ships without some of them.

use glam::{Vec2, Vec3};
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement};

use crate::model::InterestPayload;

pub const MODAL_ID: &str = "modal";
pub const MODAL_TITLE_ID: &str = "modal-title";
pub const MODAL_TEXT_ID: &str = "modal-text";
pub const PROMPT_ID: &str = "interaction-prompt";
pub const COORDS_ID: &str = "coords";
pub const JOYSTICK_ID: &str = "joystick";
pub const JOYSTICK_THUMB_ID: &str = "joystick-thumb";
pub const ACTION_BUTTON_ID: &str = "action-button";

const HIDDEN_CLASS: &str = "hidden";

fn document() -> Option<Document> {
    web_sys::window()?.document()
}

fn element(id: &str) -> Option<HtmlElement> {
    document()?.get_element_by_id(id)?.dyn_into::<HtmlElement>().ok()
}

fn set_hidden(id: &str, hidden: bool) {
    if let Some(el) = element(id) {
        let classes = el.class_list();
        let result = if hidden {
            classes.add_1(HIDDEN_CLASS)
        } else {
            classes.remove_1(HIDDEN_CLASS)
        };
        if result.is_err() {
            tracing::warn!(id, "failed to toggle overlay element");
        }
    }
}

/// Fill and open the modal card for an interest point.
pub fn show_modal(payload: &InterestPayload) {
    if let Some(title) = element(MODAL_TITLE_ID) {
        title.set_text_content(Some(&payload.title));
    }
    if let Some(text) = element(MODAL_TEXT_ID) {
        text.set_text_content(Some(&payload.description));
    }
    set_hidden(MODAL_ID, false);
}

pub fn hide_modal() {
    set_hidden(MODAL_ID, true);
}

pub fn is_modal_open() -> bool {
    element(MODAL_ID)
        .map(|el| !el.class_list().contains(HIDDEN_CLASS))
        .unwrap_or(false)
}

pub fn set_prompt_visible(visible: bool) {
    set_hidden(PROMPT_ID, !visible);
}

pub fn set_coords(position: Vec3) {
    if let Some(el) = element(COORDS_ID) {
        el.set_text_content(Some(&format!(
            "x {:.1}  y {:.1}  z {:.1}",
            position.x, position.y, position.z
        )));
    }
}

/// Pad center and radius in page coordinates, for joystick touch mapping.
pub fn measure_joystick() -> Option<(Vec2, f32)> {
    let el = element(JOYSTICK_ID)?;
    let rect = el.get_bounding_client_rect();
    let center = Vec2::new(
        (rect.left() + rect.width() / 2.0) as f32,
        (rect.top() + rect.height() / 2.0) as f32,
    );
    Some((center, (rect.width() / 2.0) as f32))
}

/// Move the joystick thumb to mirror the current drag.
pub fn set_joystick_thumb(displacement: Vec2) {
    if let Some(el) = element(JOYSTICK_THUMB_ID) {
        let transform = format!(
            "translate(calc(-50% + {}px), calc(-50% + {}px))",
            displacement.x, displacement.y
        );
        if el.style().set_property("transform", &transform).is_err() {
            tracing::warn!("failed to move joystick thumb");
        }
    }
}

/// Hide the mobile-only overlay elements on pointer devices.
pub fn configure_for_device(touch_device: bool) {
    set_hidden(JOYSTICK_ID, !touch_device);
    set_hidden(ACTION_BUTTON_ID, !touch_device);
}
