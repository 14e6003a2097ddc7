// MODEL: camera, scene geometry and interest point data
pub mod camera;
pub mod geometry;
pub mod points;

pub use camera::Camera;
pub use geometry::{Mesh, MeshBuffer, SceneModel, SceneNode, Vertex, INTERACTIVE_PREFIX};
pub use points::{load_bundled_points, InterestPayload, InterestPoint};
