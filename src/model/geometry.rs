use bytemuck::NoUninit;
use glam::Vec3;
use serde::Deserialize;
use wgpu::util::DeviceExt;

/// Node names carrying this prefix are tagged as interactive by the modeler.
pub const INTERACTIVE_PREFIX: &str = "interactive_";

#[repr(C)]
#[derive(Debug, Clone, Copy, NoUninit)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn empty() -> Self {
        Self { vertices: Vec::new(), indices: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn upload(&self, device: &wgpu::Device) -> MeshBuffer {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        }
    }

    /// World-space triangles of this mesh, in index order.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                Vec3::from(self.vertices[tri[0] as usize].pos),
                Vec3::from(self.vertices[tri[1] as usize].pos),
                Vec3::from(self.vertices[tri[2] as usize].pos),
            ]
        })
    }
}

/// One named mesh of the exported building model. Normals are not shipped in
/// the file; they are reconstructed on load.
#[derive(Debug, Clone, Deserialize)]
pub struct SceneNode {
    pub name: String,
    /// Flat [x, y, z, x, y, z, ...] position stream.
    pub positions: Vec<f32>,
    pub indices: Vec<u32>,
    #[serde(default = "default_color")]
    pub color: [f32; 4],
}

fn default_color() -> [f32; 4] {
    [0.8, 0.8, 0.8, 1.0]
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneModel {
    pub nodes: Vec<SceneNode>,
}

impl SceneNode {
    pub fn is_interactive(&self) -> bool {
        self.name.starts_with(INTERACTIVE_PREFIX)
    }

    /// Build a renderable mesh with area-weighted vertex normals.
    pub fn to_mesh(&self) -> Mesh {
        let positions: Vec<Vec3> = self
            .positions
            .chunks_exact(3)
            .map(|p| Vec3::new(p[0], p[1], p[2]))
            .collect();

        let mut normals = vec![Vec3::ZERO; positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            // cross product length carries the area weighting
            let n = (positions[i1] - positions[i0]).cross(positions[i2] - positions[i0]);
            normals[i0] += n;
            normals[i1] += n;
            normals[i2] += n;
        }

        let vertices = positions
            .iter()
            .zip(normals.iter())
            .map(|(p, n)| Vertex {
                pos: p.to_array(),
                normal: if n.length_squared() > 0.0 {
                    n.normalize().to_array()
                } else {
                    [0.0, 1.0, 0.0]
                },
                color: self.color,
            })
            .collect();

        Mesh { vertices, indices: self.indices.clone() }
    }
}

impl SceneModel {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Minimal stand-in scene used when the model download fails: a flat
    /// floor large enough to walk on. Keeps the experience driveable so the
    /// host page can decide how loudly to complain.
    pub fn fallback() -> Self {
        let half = 25.0;
        Self {
            nodes: vec![SceneNode {
                name: "fallback_floor".to_string(),
                positions: vec![
                    -half, 0.0, -half,
                    half, 0.0, -half,
                    half, 0.0, half,
                    -half, 0.0, half,
                ],
                indices: vec![0, 2, 1, 0, 3, 2],
                color: [0.45, 0.45, 0.5, 1.0],
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_normals_point_up_for_floor() {
        let model = SceneModel::fallback();
        let mesh = model.nodes[0].to_mesh();
        for v in &mesh.vertices {
            assert!((v.normal[1] - 1.0).abs() < 1e-5, "floor normal should be +Y");
        }
        assert_eq!(mesh.indices.len(), 6);
    }

    #[test]
    fn interactive_prefix_detection() {
        let mut node = SceneModel::fallback().nodes[0].clone();
        assert!(!node.is_interactive());
        node.name = "interactive_door".to_string();
        assert!(node.is_interactive());
    }

    #[test]
    fn scene_json_roundtrip() {
        let json = r#"{ "nodes": [ { "name": "wall",
            "positions": [0,0,0, 1,0,0, 1,1,0],
            "indices": [0,1,2],
            "color": [0.2, 0.3, 0.4, 1.0] } ] }"#;
        let model = SceneModel::from_json(json).unwrap();
        assert_eq!(model.nodes.len(), 1);
        let mesh = model.nodes[0].to_mesh();
        assert_eq!(mesh.triangles().count(), 1);
    }
}
