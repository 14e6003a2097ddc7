/// Platform-agnostic input aggregation: keyboard edges, virtual joystick
/// touches and look-drag touches all funnel into one `InputState`, read once
/// per frame by the controller.
use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Forward,
    Backward,
    Left,
    Right,
    Interact,
}

/// Map a DOM `KeyboardEvent.code` string onto a movement key.
pub fn key_from_code(code: &str) -> Option<Key> {
    match code {
        "KeyW" | "ArrowUp" => Some(Key::Forward),
        "KeyS" | "ArrowDown" => Some(Key::Backward),
        "KeyA" | "ArrowLeft" => Some(Key::Left),
        "KeyD" | "ArrowRight" => Some(Key::Right),
        "KeyE" => Some(Key::Interact),
        _ => None,
    }
}

/// The two touch regions. A touch belongs to exactly one channel for its
/// whole lifetime, keyed by its platform identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchChannel {
    Joystick,
    Look,
}

#[derive(Debug, Clone)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    MouseMove { dx: f32, dy: f32 },
    TouchStart { channel: TouchChannel, id: i32, x: f32, y: f32 },
    TouchMove { channel: TouchChannel, id: i32, x: f32, y: f32 },
    TouchEnd { channel: TouchChannel, id: i32 },
    FocusLost,
    PointerLockChanged { locked: bool },
}

/// Virtual joystick state. Pad geometry (center, radius) is pushed in by the
/// UI layer once the pad element is measured.
#[derive(Debug, Clone)]
pub struct JoystickChannel {
    touch_id: Option<i32>,
    pub center: Vec2,
    pub radius: f32,
    current: Vec2,
}

impl JoystickChannel {
    fn new() -> Self {
        Self { touch_id: None, center: Vec2::ZERO, radius: 1.0, current: Vec2::ZERO }
    }

    pub fn set_geometry(&mut self, center: Vec2, radius: f32) {
        self.center = center;
        self.radius = radius.max(1.0);
    }

    pub fn active(&self) -> bool {
        self.touch_id.is_some()
    }

    /// Drag vector from pad center, clamped to the pad radius. Zero while no
    /// touch owns the channel.
    pub fn displacement(&self) -> Vec2 {
        if !self.active() {
            return Vec2::ZERO;
        }
        let delta = self.current - self.center;
        if delta.length() > self.radius {
            delta.normalize() * self.radius
        } else {
            delta
        }
    }

    fn reset(&mut self) {
        self.touch_id = None;
        self.current = self.center;
    }
}

#[derive(Debug, Clone)]
struct LookChannel {
    touch_id: Option<i32>,
    last: Vec2,
}

pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub pointer_locked: bool,
    /// Accumulated pointer deltas, damped by the look controller.
    look_delta: Vec2,
    /// Accumulated touch-drag deltas, applied undamped.
    touch_look_delta: Vec2,
    pub joystick: JoystickChannel,
    look_touch: LookChannel,
    interact_pressed: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            forward: false,
            backward: false,
            left: false,
            right: false,
            pointer_locked: false,
            look_delta: Vec2::ZERO,
            touch_look_delta: Vec2::ZERO,
            joystick: JoystickChannel::new(),
            look_touch: LookChannel { touch_id: None, last: Vec2::ZERO },
            interact_pressed: false,
        }
    }

    /// O(1) per event. Unknown or stale identifiers reset at most their own
    /// channel and never propagate an error.
    pub fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(key) => match key {
                Key::Forward => self.forward = true,
                Key::Backward => self.backward = true,
                Key::Left => self.left = true,
                Key::Right => self.right = true,
                Key::Interact => self.interact_pressed = true,
            },
            InputEvent::KeyUp(key) => match key {
                Key::Forward => self.forward = false,
                Key::Backward => self.backward = false,
                Key::Left => self.left = false,
                Key::Right => self.right = false,
                Key::Interact => {}
            },
            InputEvent::MouseMove { dx, dy } => {
                if self.pointer_locked {
                    self.look_delta += Vec2::new(*dx, *dy);
                }
            }
            InputEvent::TouchStart { channel, id, x, y } => {
                let point = Vec2::new(*x, *y);
                match channel {
                    TouchChannel::Joystick => {
                        if self.joystick.touch_id.is_none() {
                            self.joystick.touch_id = Some(*id);
                            self.joystick.current = point;
                        }
                    }
                    TouchChannel::Look => {
                        if self.look_touch.touch_id.is_none() {
                            self.look_touch.touch_id = Some(*id);
                            self.look_touch.last = point;
                        }
                    }
                }
            }
            InputEvent::TouchMove { channel, id, x, y } => {
                let point = Vec2::new(*x, *y);
                match channel {
                    TouchChannel::Joystick => {
                        if self.joystick.touch_id == Some(*id) {
                            self.joystick.current = point;
                        }
                    }
                    TouchChannel::Look => {
                        if self.look_touch.touch_id == Some(*id) {
                            self.touch_look_delta += point - self.look_touch.last;
                            self.look_touch.last = point;
                        }
                    }
                }
            }
            InputEvent::TouchEnd { channel, id } => match channel {
                TouchChannel::Joystick => {
                    if self.joystick.touch_id == Some(*id) || self.joystick.touch_id.is_none() {
                        self.joystick.reset();
                    }
                }
                TouchChannel::Look => {
                    if self.look_touch.touch_id == Some(*id) || self.look_touch.touch_id.is_none() {
                        self.look_touch.touch_id = None;
                    }
                }
            },
            InputEvent::FocusLost => self.clear_movement(),
            InputEvent::PointerLockChanged { locked } => {
                self.pointer_locked = *locked;
                if !locked {
                    // no key-up is guaranteed to arrive after losing the lock
                    self.clear_movement();
                }
            }
        }
    }

    /// Release all held movement and pending look input.
    pub fn clear_movement(&mut self) {
        self.forward = false;
        self.backward = false;
        self.left = false;
        self.right = false;
        self.look_delta = Vec2::ZERO;
        self.touch_look_delta = Vec2::ZERO;
    }

    /// Take the accumulated (mouse, touch) look deltas, zeroing both.
    pub fn consume_look(&mut self) -> (Vec2, Vec2) {
        let out = (self.look_delta, self.touch_look_delta);
        self.look_delta = Vec2::ZERO;
        self.touch_look_delta = Vec2::ZERO;
        out
    }

    /// Edge-triggered interact request, consumed once per frame.
    pub fn take_interact(&mut self) -> bool {
        std::mem::replace(&mut self.interact_pressed, false)
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

/// Capability interface over the two movement sources. The concrete source
/// is picked once at construction from device touch capability, never
/// re-evaluated per frame.
pub trait DirectionSource {
    /// Desired planar direction, unit length or zero.
    /// x: strafe right, y: forward.
    fn sample_direction(&self, input: &InputState) -> Vec2;
}

/// WASD / arrow keys.
pub struct DigitalInput;

impl DirectionSource for DigitalInput {
    fn sample_direction(&self, input: &InputState) -> Vec2 {
        let dir = Vec2::new(
            (input.right as i8 - input.left as i8) as f32,
            (input.forward as i8 - input.backward as i8) as f32,
        );
        if dir.length_squared() > 0.0 {
            dir.normalize()
        } else {
            Vec2::ZERO
        }
    }
}

/// On-screen joystick pad. Screen y grows downward, so forward is the
/// negated vertical displacement.
pub struct JoystickInput {
    pub dead_zone: f32,
}

impl JoystickInput {
    pub fn new() -> Self {
        Self { dead_zone: 0.1 }
    }
}

impl Default for JoystickInput {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectionSource for JoystickInput {
    fn sample_direction(&self, input: &InputState) -> Vec2 {
        let d = input.joystick.displacement() / input.joystick.radius;
        if d.length() < self.dead_zone {
            return Vec2::ZERO;
        }
        Vec2::new(d.x, -d.y).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digital_diagonal_is_unit_length() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown(Key::Forward));
        input.process_event(&InputEvent::KeyDown(Key::Right));
        let dir = DigitalInput.sample_direction(&input);
        assert!((dir.length() - 1.0).abs() < 1e-5);
        assert!(dir.x > 0.0 && dir.y > 0.0);
    }

    #[test]
    fn opposing_keys_cancel_without_nan() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown(Key::Forward));
        input.process_event(&InputEvent::KeyDown(Key::Backward));
        let dir = DigitalInput.sample_direction(&input);
        assert_eq!(dir, Vec2::ZERO);
    }

    #[test]
    fn joystick_dead_zone_yields_zero() {
        let mut input = InputState::new();
        input.joystick.set_geometry(Vec2::new(100.0, 100.0), 50.0);
        input.process_event(&InputEvent::TouchStart {
            channel: TouchChannel::Joystick, id: 7, x: 100.0, y: 100.0,
        });
        input.process_event(&InputEvent::TouchMove {
            channel: TouchChannel::Joystick, id: 7, x: 103.0, y: 100.0,
        });
        let dir = JoystickInput::new().sample_direction(&input);
        assert_eq!(dir, Vec2::ZERO, "3px of a 50px pad is inside the dead zone");
    }

    #[test]
    fn joystick_up_drag_means_forward() {
        let mut input = InputState::new();
        input.joystick.set_geometry(Vec2::new(100.0, 100.0), 50.0);
        input.process_event(&InputEvent::TouchStart {
            channel: TouchChannel::Joystick, id: 1, x: 100.0, y: 100.0,
        });
        input.process_event(&InputEvent::TouchMove {
            channel: TouchChannel::Joystick, id: 1, x: 100.0, y: 60.0,
        });
        let dir = JoystickInput::new().sample_direction(&input);
        assert!(dir.y > 0.99, "screen-up drag maps to forward");
        assert!(dir.x.abs() < 1e-5);
    }

    #[test]
    fn concurrent_channels_track_independently() {
        let mut input = InputState::new();
        input.joystick.set_geometry(Vec2::new(100.0, 100.0), 50.0);
        input.process_event(&InputEvent::TouchStart {
            channel: TouchChannel::Joystick, id: 1, x: 100.0, y: 100.0,
        });
        input.process_event(&InputEvent::TouchStart {
            channel: TouchChannel::Look, id: 2, x: 400.0, y: 200.0,
        });
        input.process_event(&InputEvent::TouchMove {
            channel: TouchChannel::Joystick, id: 1, x: 130.0, y: 100.0,
        });
        input.process_event(&InputEvent::TouchMove {
            channel: TouchChannel::Look, id: 2, x: 420.0, y: 190.0,
        });

        assert!(input.joystick.active());
        let (_, touch_look) = input.consume_look();
        assert_eq!(touch_look, Vec2::new(20.0, -10.0));

        // ending the look touch must not disturb the joystick
        input.process_event(&InputEvent::TouchEnd { channel: TouchChannel::Look, id: 2 });
        assert!(input.joystick.active());
    }

    #[test]
    fn foreign_touch_cannot_steal_an_owned_channel() {
        let mut input = InputState::new();
        input.joystick.set_geometry(Vec2::new(100.0, 100.0), 50.0);
        input.process_event(&InputEvent::TouchStart {
            channel: TouchChannel::Joystick, id: 1, x: 100.0, y: 100.0,
        });
        input.process_event(&InputEvent::TouchMove {
            channel: TouchChannel::Joystick, id: 1, x: 140.0, y: 100.0,
        });
        // a second finger lands on the pad and lifts again
        input.process_event(&InputEvent::TouchStart {
            channel: TouchChannel::Joystick, id: 9, x: 100.0, y: 100.0,
        });
        input.process_event(&InputEvent::TouchMove {
            channel: TouchChannel::Joystick, id: 9, x: 60.0, y: 100.0,
        });
        input.process_event(&InputEvent::TouchEnd { channel: TouchChannel::Joystick, id: 9 });
        assert!(input.joystick.active(), "owner touch is still down");
        assert!(input.joystick.displacement().x > 0.0, "owner's drag survives");
    }

    #[test]
    fn stale_touch_end_is_a_safe_reset() {
        let mut input = InputState::new();
        // end without a matching start record
        input.process_event(&InputEvent::TouchEnd { channel: TouchChannel::Joystick, id: 42 });
        assert!(!input.joystick.active());
        assert_eq!(JoystickInput::new().sample_direction(&input), Vec2::ZERO);
    }

    #[test]
    fn focus_loss_releases_held_keys() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown(Key::Forward));
        input.process_event(&InputEvent::PointerLockChanged { locked: true });
        input.process_event(&InputEvent::MouseMove { dx: 5.0, dy: 2.0 });
        input.process_event(&InputEvent::FocusLost);
        assert!(!input.forward);
        assert_eq!(input.consume_look().0, Vec2::ZERO);
    }

    #[test]
    fn pointer_unlock_releases_held_keys() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::PointerLockChanged { locked: true });
        input.process_event(&InputEvent::KeyDown(Key::Forward));
        input.process_event(&InputEvent::PointerLockChanged { locked: false });
        assert!(!input.forward);
    }

    #[test]
    fn mouse_deltas_ignored_while_unlocked() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::MouseMove { dx: 10.0, dy: 10.0 });
        assert_eq!(input.consume_look().0, Vec2::ZERO);
    }

    #[test]
    fn interact_is_edge_triggered() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown(Key::Interact));
        assert!(input.take_interact());
        assert!(!input.take_interact(), "consumed once per frame");
    }
}
