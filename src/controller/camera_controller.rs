use glam::Vec2;

use crate::model::Camera;

/// Applies look input to the camera orientation.
///
/// Desktop pointer deltas accumulate into a velocity that decays
/// geometrically each frame (damped look: smooths per-event jitter at the
/// cost of a little latency). Touch drags are scaled by a higher sensitivity
/// and applied immediately, undamped.
pub struct LookController {
    pub desktop_speed: f32,
    pub touch_speed: f32,
    pub damping: f32,
    /// Polar-angle range for pitch; defaults allow looking straight up and
    /// down without inverting.
    pub min_polar: f32,
    pub max_polar: f32,
    look_velocity: Vec2,
}

impl LookController {
    pub fn new() -> Self {
        Self {
            desktop_speed: 0.0012,
            touch_speed: 0.0022,
            damping: 0.2,
            min_polar: 0.0,
            max_polar: std::f32::consts::PI,
            look_velocity: Vec2::ZERO,
        }
    }

    /// Per-frame orientation update from the accumulated deltas.
    pub fn apply(&mut self, camera: &mut Camera, mouse_delta: Vec2, touch_delta: Vec2) {
        self.look_velocity += mouse_delta * self.desktop_speed;

        camera.yaw += self.look_velocity.x + touch_delta.x * self.touch_speed;
        camera.pitch -= self.look_velocity.y + touch_delta.y * self.touch_speed;
        camera.pitch = camera.pitch.clamp(
            std::f32::consts::FRAC_PI_2 - self.max_polar,
            std::f32::consts::FRAC_PI_2 - self.min_polar,
        );

        self.look_velocity *= 1.0 - self.damping;
    }

    /// Drop any in-flight look momentum (focus loss, unlock).
    pub fn reset(&mut self) {
        self.look_velocity = Vec2::ZERO;
    }
}

impl Default for LookController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mouse_look_is_damped_over_frames() {
        let mut look = LookController::new();
        let mut cam = Camera::new(800, 600);
        look.apply(&mut cam, Vec2::new(100.0, 0.0), Vec2::ZERO);
        let first = cam.yaw;
        assert!(first > 0.0);

        // no new input: residual velocity keeps turning, but less each frame
        look.apply(&mut cam, Vec2::ZERO, Vec2::ZERO);
        let second_step = cam.yaw - first;
        assert!(second_step > 0.0);
        assert!(second_step < first);
    }

    #[test]
    fn touch_look_has_no_residual_momentum() {
        let mut look = LookController::new();
        let mut cam = Camera::new(800, 600);
        look.apply(&mut cam, Vec2::ZERO, Vec2::new(50.0, 0.0));
        let after_drag = cam.yaw;
        look.apply(&mut cam, Vec2::ZERO, Vec2::ZERO);
        assert!((cam.yaw - after_drag).abs() < 1e-6, "touch deltas must not coast");
    }

    #[test]
    fn pitch_clamps_at_polar_limits() {
        let mut look = LookController::new();
        let mut cam = Camera::new(800, 600);
        for _ in 0..200 {
            look.apply(&mut cam, Vec2::new(0.0, -10000.0), Vec2::ZERO);
        }
        assert!(cam.pitch <= std::f32::consts::FRAC_PI_2 + 1e-5);
        for _ in 0..400 {
            look.apply(&mut cam, Vec2::new(0.0, 10000.0), Vec2::ZERO);
        }
        assert!(cam.pitch >= -std::f32::consts::FRAC_PI_2 - 1e-5);
    }

    #[test]
    fn narrowed_polar_range_is_respected() {
        let mut look = LookController::new();
        look.min_polar = 1.0;
        look.max_polar = 2.0;
        let mut cam = Camera::new(800, 600);
        for _ in 0..200 {
            look.apply(&mut cam, Vec2::new(0.0, -10000.0), Vec2::ZERO);
        }
        assert!(cam.pitch <= std::f32::consts::FRAC_PI_2 - 1.0 + 1e-5);
    }

    #[test]
    fn reset_drops_momentum() {
        let mut look = LookController::new();
        let mut cam = Camera::new(800, 600);
        look.apply(&mut cam, Vec2::new(500.0, 0.0), Vec2::ZERO);
        look.reset();
        let yaw = cam.yaw;
        look.apply(&mut cam, Vec2::ZERO, Vec2::ZERO);
        assert!((cam.yaw - yaw).abs() < 1e-6);
    }
}
