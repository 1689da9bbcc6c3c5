//! wgpu render backend for the cube viewer.
//!
//! Renders the scene's cubes in one instanced pass, lit by the scene's
//! directional light. Camera uses an orbit model: pointer drags rotate and
//! pan around a fixed target, the wheel dollies in and out.
//!
//! # Invariants
//! - The renderer never mutates scene state.
//! - Camera parameters change only through `OrbitController`.
//! - Controller motion is inertial: `update` must keep being called until it
//!   reports the camera has settled.

mod camera;
mod controls;
mod gpu;
mod shaders;

pub use camera::OrbitCamera;
pub use controls::{OrbitConfig, OrbitController};
pub use gpu::{SceneRenderer, needs_resize};
