//! Scene model: a fixed set of lit, colored cube meshes and one directional light.
//!
//! # Invariants
//! - Cube count, geometry table, and light are fixed once the scene is built.
//! - Mutation happens only through `Scene::cube_mut` (panel-driven field edits).
//! - Geometry is shared by handle; each cube exclusively owns its material.

pub mod color;
pub mod scene;

pub use color::Color;
pub use scene::{BoxGeometry, Cube, DirectionalLight, GeometryHandle, Material, Scene, Transform};
