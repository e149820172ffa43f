//! Lantern motion model.
//!
//! Pure per-instance arithmetic mirrored by the WGSL vertex and fragment
//! shaders: horizontal oscillation, a vertical sawtooth loop, and a
//! phase-derived flicker color. Also owns the fixed instance population and
//! the scene clock that feeds the shader its single time value.
//!
//! # Invariants
//! - Instance count and parameters are fixed once generated.
//! - Vertical position always lies in `[-BAND_HALF_HEIGHT, BAND_HALF_HEIGHT)`.
//! - Clock output never decreases.

pub mod clock;
pub mod evaluator;
pub mod population;

pub use clock::SceneClock;
pub use evaluator::{
    BAND_HALF_HEIGHT, BAND_HEIGHT, FLAME_MIX, LanternInstance, displace, flicker, shade,
    vertex_world, vertical_loop,
};
pub use population::Population;

pub fn crate_info() -> &'static str {
    "lanternfield-motion v0.1.0"
}
