use glam::Vec3;

use crate::model::InterestPoint;

/// Forward ray from the camera that discovers at most one interest point per
/// frame. Points are billboarded sprites, so the pick test treats them as
/// spheres around their world position.
pub struct InteractionProbe {
    pub range: f32,
    pub target_radius: f32,
    current: Option<usize>,
}

impl InteractionProbe {
    pub fn new() -> Self {
        Self { range: 3.0, target_radius: 0.3, current: None }
    }

    /// Re-evaluate the probe for this frame. `dir` must be unit length.
    pub fn update(&mut self, origin: Vec3, dir: Vec3, points: &[InterestPoint]) {
        let mut best: Option<(usize, f32)> = None;
        for (i, point) in points.iter().enumerate() {
            let to_center = point.position() - origin;
            let along = to_center.dot(dir);
            if along <= 0.0 || along > self.range {
                continue;
            }
            let off_axis_sq = to_center.length_squared() - along * along;
            if off_axis_sq > self.target_radius * self.target_radius {
                continue;
            }
            match best {
                Some((_, t)) if t <= along => {}
                _ => best = Some((i, along)),
            }
        }
        self.current = best.map(|(i, _)| i);
    }

    pub fn has_target(&self) -> bool {
        self.current.is_some()
    }

    pub fn current<'a>(&self, points: &'a [InterestPoint]) -> Option<&'a InterestPoint> {
        self.current.and_then(|i| points.get(i))
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

impl Default for InteractionProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_at(id: &str, pos: Vec3) -> InterestPoint {
        InterestPoint {
            id: id.to_string(),
            position: pos.to_array(),
            title: id.to_uppercase(),
            description: String::new(),
        }
    }

    #[test]
    fn detects_target_inside_range() {
        // just inside the 3.0 range
        let points = vec![point_at("near", Vec3::new(2.9, 1.7, 0.0))];
        let mut probe = InteractionProbe::new();
        probe.update(Vec3::new(0.0, 1.7, 0.0), Vec3::X, &points);
        assert!(probe.has_target());
        assert_eq!(probe.current(&points).unwrap().id, "near");
    }

    #[test]
    fn ignores_target_beyond_range() {
        let points = vec![point_at("far", Vec3::new(3.1, 1.7, 0.0))];
        let mut probe = InteractionProbe::new();
        probe.update(Vec3::new(0.0, 1.7, 0.0), Vec3::X, &points);
        assert!(!probe.has_target());
    }

    #[test]
    fn nearest_of_two_aligned_targets_wins() {
        let points = vec![
            point_at("far", Vec3::new(2.5, 1.7, 0.0)),
            point_at("near", Vec3::new(1.5, 1.7, 0.0)),
        ];
        let mut probe = InteractionProbe::new();
        probe.update(Vec3::new(0.0, 1.7, 0.0), Vec3::X, &points);
        assert_eq!(probe.current(&points).unwrap().id, "near");
    }

    #[test]
    fn target_behind_camera_is_ignored() {
        let points = vec![point_at("behind", Vec3::new(-1.0, 1.7, 0.0))];
        let mut probe = InteractionProbe::new();
        probe.update(Vec3::new(0.0, 1.7, 0.0), Vec3::X, &points);
        assert!(!probe.has_target());
    }

    #[test]
    fn off_axis_target_outside_radius_is_ignored() {
        let points = vec![point_at("aside", Vec3::new(2.0, 1.7, 0.5))];
        let mut probe = InteractionProbe::new();
        probe.update(Vec3::new(0.0, 1.7, 0.0), Vec3::X, &points);
        assert!(!probe.has_target());

        // but within the sprite radius it picks up
        let close = vec![point_at("aside", Vec3::new(2.0, 1.7, 0.2))];
        probe.update(Vec3::new(0.0, 1.7, 0.0), Vec3::X, &close);
        assert!(probe.has_target());
    }
}
