//! wgpu render backend for the lantern scene.
//!
//! Draws the merged lantern mesh once per instance in a single indexed,
//! instanced draw. All motion happens in the vertex shader; the CPU only
//! writes the camera matrix and the elapsed time each frame.
//!
//! # Invariants
//! - Renderer never mutates the population.
//! - Instance data is uploaded once; per-frame uploads are uniform-only.
//! - Camera aspect tracks the surface size after every resize.

mod camera;
mod gpu;
mod shaders;

pub use camera::OrbitCamera;
pub use gpu::{LanternRenderer, RenderError};
