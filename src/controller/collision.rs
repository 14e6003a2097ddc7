use glam::Vec3;

use crate::model::Mesh;

/// Nearest intersection of a ray with the collision set.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub distance: f32,
    pub point: Vec3,
}

/// Static triangle soup all probes raycast against. Injected once after the
/// building model finishes loading; starts empty so the controller can be
/// driven before any geometry exists (every probe simply misses).
#[derive(Debug, Clone, Default)]
pub struct CollisionMesh {
    triangles: Vec<[Vec3; 3]>,
}

impl CollisionMesh {
    pub fn empty() -> Self {
        Self { triangles: Vec::new() }
    }

    pub fn from_meshes<'a>(meshes: impl IntoIterator<Item = &'a Mesh>) -> Self {
        let mut triangles = Vec::new();
        for mesh in meshes {
            triangles.extend(mesh.triangles());
        }
        Self { triangles }
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Nearest hit along `dir` within `max_dist`, or None. `dir` must be
    /// unit length; triangles are treated as double-sided.
    pub fn raycast(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<RayHit> {
        let mut best: Option<RayHit> = None;
        for tri in &self.triangles {
            if let Some(hit) = ray_triangle(origin, dir, max_dist, tri[0], tri[1], tri[2]) {
                match best {
                    Some(b) if b.distance <= hit.distance => {}
                    _ => best = Some(hit),
                }
            }
        }
        best
    }
}

/// Möller–Trumbore ray-triangle intersection, double-sided.
fn ray_triangle(
    origin: Vec3,
    dir: Vec3,
    max_t: f32,
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
) -> Option<RayHit> {
    const EPSILON: f32 = 1e-6;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = dir.cross(edge2);
    let a = edge1.dot(h);

    if a.abs() < EPSILON {
        return None; // Ray is parallel to triangle
    }

    let f = 1.0 / a;
    let s = origin - v0;
    let u = f * s.dot(h);

    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * dir.dot(q);

    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);

    if t > EPSILON && t <= max_t {
        Some(RayHit { distance: t, point: origin + dir * t })
    } else {
        None
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn downward_ray_hits_floor() {
        let mesh = mesh_from(floor_at(0.0, 10.0));
        let hit = mesh
            .raycast(Vec3::new(1.0, 1.7, 2.0), Vec3::NEG_Y, f32::INFINITY)
            .expect("should hit the floor");
        assert!((hit.distance - 1.7).abs() < 1e-4);
        assert!(hit.point.y.abs() < 1e-4);
    }

    #[test]
    fn empty_mesh_never_hits() {
        let mesh = CollisionMesh::empty();
        assert!(mesh.raycast(Vec3::ZERO, Vec3::NEG_Y, f32::INFINITY).is_none());
    }

    #[test]
    fn nearest_of_two_stacked_walls_wins() {
        let mut tris = wall_at_z(2.0, -1.0, 1.0, 0.0, 3.0);
        tris.extend(wall_at_z(5.0, -1.0, 1.0, 0.0, 3.0));
        let mesh = mesh_from(tris);
        let hit = mesh
            .raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::Z, f32::INFINITY)
            .expect("should hit the near wall");
        assert!((hit.distance - 2.0).abs() < 1e-4);
    }

    #[test]
    fn range_limit_is_respected() {
        let mesh = mesh_from(wall_at_z(5.0, -1.0, 1.0, 0.0, 3.0));
        assert!(mesh.raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::Z, 4.0).is_none());
        assert!(mesh.raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::Z, 6.0).is_some());
    }

    #[test]
    fn backface_is_not_culled() {
        // approach the wall from its back side
        let mesh = mesh_from(wall_at_z(2.0, -1.0, 1.0, 0.0, 3.0));
        let hit = mesh.raycast(Vec3::new(0.0, 1.0, 4.0), Vec3::NEG_Z, f32::INFINITY);
        assert!(hit.is_some());
    }
}
