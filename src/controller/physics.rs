use glam::{Vec2, Vec3};

use crate::controller::collision::CollisionMesh;

/// Oversized frame deltas (backgrounded tab, debugger pause) are clamped so a
/// single step can never tunnel the player through geometry.
pub const MAX_FRAME_DT: f32 = 0.1;

/// Lift applied to the foot-height step probe so it does not graze the floor
/// it starts on.
const STEP_PROBE_LIFT: f32 = 0.05;

/// Nudge applied past the step-probe contact before measuring ground height,
/// so the secondary downward cast lands on the surface instead of its edge.
const CONTACT_NUDGE: f32 = 0.01;

/// Mutable per-session player state. The physics step is the sole writer of
/// position and velocity; `grounded` is recomputed from scratch every frame.
#[derive(Debug, Clone)]
pub struct PlayerState {
    /// Eye-level position (standing height above the supporting ground).
    pub position: Vec3,
    /// x: strafe axis, z: forward axis (look-local), y: world vertical.
    pub velocity: Vec3,
    pub grounded: bool,
}

impl PlayerState {
    pub fn new(spawn: Vec3) -> Self {
        Self { position: spawn, velocity: Vec3::ZERO, grounded: false }
    }

    pub fn horizontal_speed(&self) -> f32 {
        self.velocity.x.hypot(self.velocity.z)
    }
}

/// Per-frame walking integrator: drag/acceleration model, raycast collision
/// response (block vs. step-up), ground detection and gravity.
pub struct WalkPhysics {
    pub player_height: f32,
    pub ground_epsilon: f32,
    pub snap_tolerance: f32,
    pub gravity: f32,
    pub acceleration: f32,
    pub deceleration: f32,
    pub max_step_height: f32,
    pub body_threshold: f32,
    pub jump_speed: f32,
}

impl WalkPhysics {
    pub fn new() -> Self {
        Self {
            player_height: 1.7,
            ground_epsilon: 0.1,
            snap_tolerance: 0.01,
            gravity: 30.0,
            acceleration: 50.0,
            deceleration: 10.0,
            max_step_height: 0.4,
            body_threshold: 0.5,
            jump_speed: 8.0,
        }
    }

    /// Advance the player by one frame.
    ///
    /// `direction` is the desired planar direction (x: strafe right,
    /// y: forward), unit length or zero. `yaw` orients the look-local
    /// velocity axes in the world. Safe to call with an empty mesh: no
    /// collision response, no ground snap, gravity integrates freely.
    pub fn update(
        &self,
        player: &mut PlayerState,
        direction: Vec2,
        yaw: f32,
        mesh: &CollisionMesh,
        dt: f32,
    ) {
        let dt = dt.clamp(0.0, MAX_FRAME_DT);
        let forward = Vec3::new(yaw.cos(), 0.0, yaw.sin());
        let right = forward.cross(Vec3::Y);

        // Drag term, applied even while accelerating.
        player.velocity.x -= player.velocity.x * self.deceleration * dt;
        player.velocity.z -= player.velocity.z * self.deceleration * dt;

        // Positive-forward convention: velocity.z grows toward the facing
        // direction. Zero direction is never normalized upstream; the guard
        // here keeps the check local.
        if direction.length_squared() > 0.0 {
            player.velocity.x += direction.x * self.acceleration * dt;
            player.velocity.z += direction.y * self.acceleration * dt;
        }

        self.resolve_horizontal(player, right, forward, mesh);
        self.update_vertical(player, mesh, dt);

        // Horizontal motion follows the look-relative axes; vertical motion
        // is world-up, never look-relative.
        let horizontal = right * player.velocity.x + forward * player.velocity.z;
        player.position += horizontal * dt;
        player.position.y += player.velocity.y * dt;
    }

    /// Launch upward if standing.
    pub fn jump(&self, player: &mut PlayerState) {
        if player.grounded {
            player.velocity.y = self.jump_speed;
            player.grounded = false;
        }
    }

    /// One-shot settle onto freshly injected geometry: probe down from high
    /// above the current column and stand on whatever is found.
    pub fn snap_to_ground(&self, player: &mut PlayerState, mesh: &CollisionMesh) {
        let origin = Vec3::new(player.position.x, player.position.y + 100.0, player.position.z);
        if let Some(hit) = mesh.raycast(origin, Vec3::NEG_Y, f32::INFINITY) {
            player.position.y = hit.point.y + self.player_height;
        }
    }

    fn resolve_horizontal(
        &self,
        player: &mut PlayerState,
        right: Vec3,
        forward: Vec3,
        mesh: &CollisionMesh,
    ) {
        if mesh.is_empty() {
            return;
        }
        let horizontal = right * player.velocity.x + forward * player.velocity.z;
        if horizontal.length_squared() < 1e-12 {
            return;
        }
        let dir = horizontal.normalize();

        // Body probe takes precedence: an obstacle at torso height blocks
        // outright, even if its base would have read as a climbable step.
        let body_origin = player.position - Vec3::Y * (self.player_height * 0.5);
        if mesh.raycast(body_origin, dir, self.body_threshold).is_some() {
            player.velocity.x = 0.0;
            player.velocity.z = 0.0;
            return;
        }

        // Step probe at foot height.
        let current_ground = player.position.y - self.player_height;
        let foot_origin = Vec3::new(player.position.x, current_ground + STEP_PROBE_LIFT, player.position.z);
        if let Some(contact) = mesh.raycast(foot_origin, dir, self.body_threshold) {
            let ground_at_contact = self.ground_height_at(contact.point + dir * CONTACT_NUDGE, current_ground, mesh);
            let delta = ground_at_contact - current_ground;
            if delta > 0.0 && delta < self.max_step_height {
                // Climbable: raise without killing momentum.
                player.position.y += delta;
            } else {
                player.velocity.x = 0.0;
                player.velocity.z = 0.0;
            }
        }
    }

    /// Ground height in the column at `at`, measured by a downward cast from
    /// just above the highest climbable step. No hit means a drop-off.
    fn ground_height_at(&self, at: Vec3, current_ground: f32, mesh: &CollisionMesh) -> f32 {
        let origin = Vec3::new(at.x, current_ground + self.max_step_height + 1e-3, at.z);
        match mesh.raycast(origin, Vec3::NEG_Y, f32::INFINITY) {
            Some(hit) => hit.point.y,
            None => f32::NEG_INFINITY,
        }
    }

    fn update_vertical(&self, player: &mut PlayerState, mesh: &CollisionMesh, dt: f32) {
        player.grounded = false;
        // An upward launch has to survive its first frames: the floor is
        // still within probe reach, and grounding here would erase it.
        if player.velocity.y > 0.0 {
            player.velocity.y -= self.gravity * dt;
            return;
        }
        let reach = self.player_height + self.ground_epsilon;
        if let Some(hit) = mesh.raycast(player.position, Vec3::NEG_Y, reach) {
            // Only snap when clearly below standing height; re-snapping every
            // frame would fight the cosmetic head bob.
            if hit.distance < self.player_height - self.snap_tolerance {
                player.position.y = hit.point.y + self.player_height;
            }
            player.velocity.y = 0.0;
            player.grounded = true;
        } else {
            player.velocity.y -= self.gravity * dt;
        }
    }
}

impl Default for WalkPhysics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::collision::fixtures::*;

    const DT: f32 = 1.0 / 60.0;
    // yaw such that forward is +Z
    const YAW_POS_Z: f32 = std::f32::consts::FRAC_PI_2;

    fn flat_world() -> CollisionMesh {
        mesh_from(floor_at(0.0, 50.0))
    }

    fn spawn() -> PlayerState {
        PlayerState::new(Vec3::new(0.0, 1.7, 0.0))
    }

    #[test]
    fn rest_on_flat_plane() {
        // spawn at standing height, no input
        let physics = WalkPhysics::new();
        let mesh = flat_world();
        let mut player = spawn();
        physics.update(&mut player, Vec2::ZERO, 0.0, &mesh, DT);
        assert!(player.grounded);
        assert_eq!(player.velocity.y, 0.0);
        assert!((player.position.y - 1.7).abs() < 1e-4);
    }

    #[test]
    fn forward_input_moves_toward_facing() {
        let physics = WalkPhysics::new();
        let mesh = flat_world();
        let mut player = spawn();
        // yaw = 0 faces +X
        for _ in 0..10 {
            physics.update(&mut player, Vec2::new(0.0, 1.0), 0.0, &mesh, DT);
        }
        assert!(player.position.x > 0.1, "forward must move along the facing direction");
        assert!(player.position.z.abs() < 1e-3);
    }

    #[test]
    fn velocity_decays_monotonically_without_input() {
        let physics = WalkPhysics::new();
        let mesh = flat_world();
        let mut player = spawn();
        player.velocity = Vec3::new(3.0, 0.0, 4.0);
        let mut prev = player.horizontal_speed();
        for _ in 0..120 {
            physics.update(&mut player, Vec2::ZERO, 0.0, &mesh, DT);
            let speed = player.horizontal_speed();
            assert!(speed <= prev + 1e-6, "speed must not grow without input");
            assert!(player.velocity.x >= 0.0 && player.velocity.z >= 0.0, "decay must not flip sign");
            prev = speed;
        }
        assert!(prev < 0.05);
    }

    #[test]
    fn body_obstacle_blocks_fully() {
        // full-height wall 0.3 ahead
        let physics = WalkPhysics::new();
        let mut tris = floor_at(0.0, 50.0);
        tris.extend(wall_at_z(0.3, -5.0, 5.0, 0.0, 3.0));
        let mesh = mesh_from(tris);
        let mut player = spawn();
        physics.update(&mut player, Vec2::new(0.0, 1.0), YAW_POS_Z, &mesh, DT);
        assert_eq!(player.velocity.x, 0.0);
        assert_eq!(player.velocity.z, 0.0);
        assert!(player.position.z.abs() < 1e-6, "blocked player must not advance");
    }

    #[test]
    fn low_step_is_climbed_with_velocity_retained() {
        // 0.2 step ahead, nothing at body height
        let physics = WalkPhysics::new();
        let mut tris = floor_at(0.0, 50.0);
        tris.extend(wall_at_z(0.3, -5.0, 5.0, 0.0, 0.2)); // riser
        tris.extend(step_top(0.2, -5.0, 5.0, 0.3, 5.0)); // tread
        let mesh = mesh_from(tris);
        let mut player = spawn();
        physics.update(&mut player, Vec2::new(0.0, 1.0), YAW_POS_Z, &mesh, DT);
        assert!((player.position.y - 1.9).abs() < 0.02, "position should rise by the step height");
        assert!(player.horizontal_speed() > 0.0, "step-up must not zero velocity");
    }

    #[test]
    fn step_at_max_height_blocks() {
        let physics = WalkPhysics::new();
        let mut tris = floor_at(0.0, 50.0);
        tris.extend(wall_at_z(0.3, -5.0, 5.0, 0.0, 0.4));
        tris.extend(step_top(0.4, -5.0, 5.0, 0.3, 5.0));
        let mesh = mesh_from(tris);
        let mut player = spawn();
        physics.update(&mut player, Vec2::new(0.0, 1.0), YAW_POS_Z, &mesh, DT);
        assert_eq!(player.horizontal_speed(), 0.0, "delta == max step height must block");
        assert!((player.position.y - 1.7).abs() < 1e-4);
    }

    #[test]
    fn drop_off_edge_blocks_instead_of_partial_climb() {
        // step probe contact whose far side has no ground at all
        let physics = WalkPhysics::new();
        // floor only behind the wall; beyond it, a pit
        let mut tris = floor_at(0.0, 0.305);
        tris.extend(wall_at_z(0.3, -5.0, 5.0, -2.0, 0.1));
        let mesh = mesh_from(tris);
        let mut player = spawn();
        physics.update(&mut player, Vec2::new(0.0, 1.0), YAW_POS_Z, &mesh, DT);
        assert_eq!(player.horizontal_speed(), 0.0);
    }

    #[test]
    fn body_block_beats_climbable_step() {
        // base reads as a climbable 0.2 step, but a torso-height ledge sits
        // right above it; the body probe must win
        let physics = WalkPhysics::new();
        let mut tris = floor_at(0.0, 50.0);
        tris.extend(wall_at_z(0.3, -5.0, 5.0, 0.0, 0.2));
        tris.extend(step_top(0.2, -5.0, 5.0, 0.3, 5.0));
        tris.extend(wall_at_z(0.4, -5.0, 5.0, 0.7, 1.0)); // table edge
        let mesh = mesh_from(tris);
        let mut player = spawn();
        physics.update(&mut player, Vec2::new(0.0, 1.0), YAW_POS_Z, &mesh, DT);
        assert_eq!(player.horizontal_speed(), 0.0, "body hit must fully stop the player");
        assert!((player.position.y - 1.7).abs() < 1e-4, "no partial climb on body block");
    }

    #[test]
    fn ground_snap_is_idempotent() {
        let physics = WalkPhysics::new();
        let mesh = flat_world();
        let mut player = PlayerState::new(Vec3::new(0.0, 1.6, 0.0)); // sunk below standing height
        physics.update(&mut player, Vec2::ZERO, 0.0, &mesh, DT);
        let snapped = player.position.y;
        assert!((snapped - 1.7).abs() < 1e-4);
        for _ in 0..10 {
            physics.update(&mut player, Vec2::ZERO, 0.0, &mesh, DT);
            assert_eq!(player.position.y, snapped, "repeated probes must not oscillate");
            assert!(player.grounded);
        }
    }

    #[test]
    fn hover_within_epsilon_is_grounded_without_snap() {
        let physics = WalkPhysics::new();
        let mesh = flat_world();
        let mut player = PlayerState::new(Vec3::new(0.0, 1.75, 0.0));
        physics.update(&mut player, Vec2::ZERO, 0.0, &mesh, DT);
        assert!(player.grounded);
        assert!((player.position.y - 1.75).abs() < 1e-4, "within tolerance no snap happens");
    }

    #[test]
    fn empty_mesh_free_falls_without_panic() {
        let physics = WalkPhysics::new();
        let mesh = CollisionMesh::empty();
        let mut player = spawn();
        physics.update(&mut player, Vec2::new(1.0, 0.0), 0.0, &mesh, DT);
        assert!(!player.grounded);
        assert!(player.velocity.y < 0.0, "gravity applies in free fall");
    }

    #[test]
    fn transient_empty_geometry_leaves_no_corruption() {
        let physics = WalkPhysics::new();
        let mesh = flat_world();
        let mut player = spawn();
        physics.update(&mut player, Vec2::ZERO, 0.0, &mesh, DT);
        assert!(player.grounded);

        let saved = player.position;
        let empty = CollisionMesh::empty();
        physics.update(&mut player, Vec2::ZERO, 0.0, &empty, DT);
        assert!(!player.grounded);

        // restore position and the original set: same verdict as before
        player.position = saved;
        player.velocity = Vec3::ZERO;
        physics.update(&mut player, Vec2::ZERO, 0.0, &mesh, DT);
        assert!(player.grounded);
        assert!((player.position.y - saved.y).abs() < 1e-4);
    }

    #[test]
    fn oversized_dt_is_clamped() {
        // wall 2 units ahead; an unclamped 10 s step at walking speed would
        // pass straight through it
        let physics = WalkPhysics::new();
        let mut tris = floor_at(0.0, 50.0);
        tris.extend(wall_at_z(2.0, -5.0, 5.0, 0.0, 3.0));
        let mesh = mesh_from(tris);
        let mut player = spawn();
        player.velocity.z = 4.0;
        physics.update(&mut player, Vec2::ZERO, YAW_POS_Z, &mesh, 10.0);
        assert!(player.position.z < 1.5, "clamped step must stay short of the wall");
    }

    #[test]
    fn jump_only_when_grounded() {
        let physics = WalkPhysics::new();
        let mesh = flat_world();
        let mut player = spawn();
        physics.update(&mut player, Vec2::ZERO, 0.0, &mesh, DT);
        assert!(player.grounded);
        physics.jump(&mut player);
        assert_eq!(player.velocity.y, physics.jump_speed);

        // the launch survives the next frame instead of being re-grounded
        physics.update(&mut player, Vec2::ZERO, 0.0, &mesh, DT);
        assert!(!player.grounded);
        assert!(player.position.y > 1.7, "launch must lift the player off the floor");

        // already airborne: a second jump is ignored
        player.velocity.y = 1.0;
        physics.jump(&mut player);
        assert_eq!(player.velocity.y, 1.0);
    }

    #[test]
    fn jump_rises_then_lands_back() {
        let physics = WalkPhysics::new();
        let mesh = flat_world();
        let mut player = spawn();
        physics.update(&mut player, Vec2::ZERO, 0.0, &mesh, DT);
        physics.jump(&mut player);

        let mut peak = player.position.y;
        for _ in 0..30 {
            physics.update(&mut player, Vec2::ZERO, 0.0, &mesh, DT);
            peak = peak.max(player.position.y);
        }
        assert!(peak > 2.3, "launch speed 8 should carry the player well off the floor");

        // gravity brings them home onto the same floor
        for _ in 0..60 {
            physics.update(&mut player, Vec2::ZERO, 0.0, &mesh, DT);
        }
        assert!(player.grounded);
        assert_eq!(player.velocity.y, 0.0);
        assert!(player.position.y >= 1.7 - 1e-3);
        assert!(player.position.y <= 1.7 + physics.ground_epsilon + 1e-3);
    }

    #[test]
    fn snap_to_ground_on_geometry_injection() {
        let physics = WalkPhysics::new();
        let mesh = flat_world();
        let mut player = PlayerState::new(Vec3::new(3.0, 20.0, 3.0));
        physics.snap_to_ground(&mut player, &mesh);
        assert!((player.position.y - 1.7).abs() < 1e-4);
    }
}
