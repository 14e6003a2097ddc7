use glam::{Vec2, Vec3};
use tracing::info;

use crate::controller::camera_controller::LookController;
use crate::controller::collision::CollisionMesh;
use crate::controller::head_bob::HeadBob;
use crate::controller::input::{DigitalInput, DirectionSource, InputEvent, InputState, JoystickInput};
use crate::controller::interact::InteractionProbe;
use crate::controller::physics::{PlayerState, WalkPhysics};
use crate::model::{Camera, InterestPayload, InterestPoint};

/// The one controller instance per session: owns the player state, the
/// camera orientation and every per-frame subsystem. Constructed before any
/// geometry exists and fed the collision mesh later, once the model loads.
pub struct FirstPersonController {
    pub camera: Camera,
    pub player: PlayerState,
    pub physics: WalkPhysics,
    pub look: LookController,
    pub head_bob: HeadBob,
    pub probe: InteractionProbe,
    pub input: InputState,
    direction_source: Box<dyn DirectionSource>,
    collision: CollisionMesh,
    points: Vec<InterestPoint>,
    touch_device: bool,
}

impl FirstPersonController {
    /// `touch_device` is decided once at startup; it fixes the movement
    /// source (keyboard vs. joystick) and the lock semantics for the whole
    /// session.
    pub fn new(width: u32, height: u32, touch_device: bool) -> Self {
        let direction_source: Box<dyn DirectionSource> = if touch_device {
            Box::new(JoystickInput::new())
        } else {
            Box::new(DigitalInput)
        };
        let camera = Camera::new(width, height);
        let player = PlayerState::new(camera.eye);
        Self {
            camera,
            player,
            physics: WalkPhysics::new(),
            look: LookController::new(),
            head_bob: HeadBob::new(),
            probe: InteractionProbe::new(),
            input: InputState::new(),
            direction_source,
            collision: CollisionMesh::empty(),
            points: Vec::new(),
            touch_device,
        }
    }

    pub fn handle_event(&mut self, event: &InputEvent) {
        if matches!(
            event,
            InputEvent::FocusLost | InputEvent::PointerLockChanged { locked: false }
        ) {
            self.look.reset();
        }
        self.input.process_event(event);
    }

    /// Desktop: true while the pointer is captured. Touch devices have no
    /// pointer capture, so they count as always locked.
    pub fn is_locked(&self) -> bool {
        self.input.pointer_locked || self.touch_device
    }

    pub fn position(&self) -> Vec3 {
        self.player.position
    }

    pub fn grounded(&self) -> bool {
        self.player.grounded
    }

    /// Replace the probe working set. A non-empty injection settles the
    /// player onto the new geometry once, so nobody falls through a model
    /// that arrived mid-session.
    pub fn set_collision_mesh(&mut self, mesh: CollisionMesh) {
        self.collision = mesh;
        if !self.collision.is_empty() {
            self.physics.snap_to_ground(&mut self.player, &self.collision);
            info!(triangles = self.collision.triangle_count(), "collision geometry ready");
        }
    }

    pub fn collision_mesh(&self) -> &CollisionMesh {
        &self.collision
    }

    pub fn set_interest_points(&mut self, points: Vec<InterestPoint>) {
        info!(count = points.len(), "interest points loaded");
        self.points = points;
    }

    pub fn points(&self) -> &[InterestPoint] {
        &self.points
    }

    /// One frame: look, walk, bob, probe. Safe before geometry arrives and
    /// against oversized `dt` (clamped inside the integrator).
    pub fn update(&mut self, dt: f32) {
        if !self.is_locked() {
            return;
        }

        let (mouse_delta, touch_delta) = self.input.consume_look();
        self.look.apply(&mut self.camera, mouse_delta, touch_delta);

        let direction = self.direction_source.sample_direction(&self.input);
        self.physics
            .update(&mut self.player, direction, self.camera.yaw, &self.collision, dt);

        self.head_bob.update(
            dt.min(crate::controller::physics::MAX_FRAME_DT),
            self.player.grounded,
            self.player.velocity.x,
            self.player.velocity.z,
        );
        // The bob offset lives on the camera only; probes keep reading the
        // physics position.
        self.camera.eye = self.player.position + Vec3::Y * self.head_bob.offset();

        self.probe.update(self.camera.eye, self.camera.forward(), &self.points);
    }

    /// Consume a pending interact key edge, if any, against the current
    /// probe target.
    pub fn poll_interaction(&mut self) -> Option<InterestPayload> {
        if self.input.take_interact() {
            self.attempt_interact()
        } else {
            None
        }
    }

    /// The single interaction surface: consume the currently identified
    /// target. With nothing in view this is a silent no-op.
    pub fn attempt_interact(&self) -> Option<InterestPayload> {
        self.probe.current(&self.points).map(InterestPoint::payload)
    }

    pub fn can_interact(&self) -> bool {
        self.probe.has_target()
    }

    /// Same gate as `update`: an unlocked controller swallows the request.
    pub fn jump(&mut self) {
        if self.is_locked() {
            self.physics.jump(&mut self.player);
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_aspect(width, height);
    }

    #[allow(unused)]
    pub fn direction(&self) -> Vec2 {
        self.direction_source.sample_direction(&self.input)
    }
}
