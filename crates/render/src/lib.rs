//! Rendering layer that does not depend on a GPU.
//!
//! # Invariants
//! - Renderers never mutate the lantern population.
//! - Render state derives from the population, the palette and the frame view.
//!
//! The lantern mesh is built here so that both the wgpu backend and headless
//! tools agree on vertex layout and counts.

pub mod mesh;
mod renderer;

pub use mesh::{MeshData, MeshError, cylinder, lantern_mesh, lathe, merge};
pub use renderer::{DebugTextRenderer, FrameView, Renderer};

pub fn crate_info() -> &'static str {
    "lanternfield-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
