use glam::{Mat4, Vec3};

/// First-person camera. Orientation is stored as a yaw/pitch pair and turned
/// into a basis fresh every frame; compound rotations are never read back.
pub struct Camera {
    pub eye: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub up: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            eye: Vec3::new(0.0, 1.7, 5.0),
            yaw: 0.0,
            pitch: 0.0,
            up: Vec3::Y,
            fov_y: 75f32.to_radians(),
            aspect: width as f32 / height as f32,
            z_near: 0.1,
            z_far: 1000.0,
        }
    }

    pub fn forward(&self) -> Vec3 {
        let cy = self.yaw;
        let cp = self.pitch.clamp(-1.5533, 1.5533); // Slightly less than π/2 to avoid gimbal lock
        Vec3::new(cy.cos() * cp.cos(), cp.sin(), cy.sin() * cp.cos()).normalize()
    }

    /// Forward direction projected onto the ground plane.
    pub fn forward_flat(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, self.yaw.sin())
    }

    /// Right direction on the ground plane.
    pub fn right_flat(&self) -> Vec3 {
        self.forward_flat().cross(Vec3::Y)
    }

    pub fn target(&self) -> Vec3 { self.eye + self.forward() }

    pub fn set_aspect(&mut self, width: u32, height: u32) { self.aspect = width as f32 / height as f32; }

    pub fn view_proj(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye, self.target(), self.up);
        let proj = Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far);
        proj * view
    }

    pub fn set_look_at(&mut self, target: Vec3) {
        let dir = (target - self.eye).normalize();
        self.yaw = dir.z.atan2(dir.x);
        self.pitch = dir.y.asin().clamp(-1.4, 1.4);
    }
}
