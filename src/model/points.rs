use glam::Vec3;
use serde::Deserialize;

/// A tagged point of interest. Created at scene-load time, immutable after.
#[derive(Debug, Clone, Deserialize)]
pub struct InterestPoint {
    pub id: String,
    pub position: [f32; 3],
    pub title: String,
    pub description: String,
}

impl InterestPoint {
    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }

    pub fn payload(&self) -> InterestPayload {
        InterestPayload {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
        }
    }
}

/// What the UI layer receives when an interaction consumes a point.
#[derive(Debug, Clone)]
pub struct InterestPayload {
    pub id: String,
    pub title: String,
    pub description: String,
}

/// Bundled point-of-interest data set for the building model.
pub fn load_bundled_points() -> Vec<InterestPoint> {
    let json = include_str!("../data/points.json");
    match serde_json::from_str(json) {
        Ok(points) => points,
        Err(e) => {
            tracing::error!("bundled points data failed to parse: {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_points_parse() {
        let points = load_bundled_points();
        assert!(!points.is_empty());
        for p in &points {
            assert!(!p.id.is_empty());
            assert!(!p.title.is_empty());
        }
    }
}
