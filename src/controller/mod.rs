pub mod camera_controller;
pub mod collision;
pub mod first_person;
pub mod head_bob;
pub mod input;
pub mod interact;
pub mod physics;

#[cfg(target_arch = "wasm32")]
pub mod frame_loop;

#[cfg(target_arch = "wasm32")]
pub use frame_loop::FrameLoopContext;

pub use camera_controller::LookController;
pub use collision::{CollisionMesh, RayHit};
pub use first_person::FirstPersonController;
pub use head_bob::HeadBob;
pub use input::{
    key_from_code, DigitalInput, DirectionSource, InputEvent, InputState, JoystickInput, Key,
    TouchChannel,
};
pub use interact::InteractionProbe;
pub use physics::{PlayerState, WalkPhysics};
