// VIEW: rendering and graphics
pub mod gpu_init;
pub mod render;

pub use gpu_init::GpuContext;
pub use render::{
    create_camera_resources, create_depth_texture, create_marker_resources, create_scene_pipeline,
    CameraResources, MarkerInstance, MarkerResources, RenderState,
};
