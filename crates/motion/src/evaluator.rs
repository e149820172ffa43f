use glam::Vec3;
use lanternfield_common::{Palette, Rgb};

/// Half the height of the vertical band lanterns loop through.
pub const BAND_HALF_HEIGHT: f32 = 200.0;
/// Full band height; also the distance a lantern travels before wrapping.
pub const BAND_HEIGHT: f32 = 2.0 * BAND_HALF_HEIGHT;
/// How strongly the flame color overrides the paper color near the base.
pub const FLAME_MIX: f32 = 0.8;

/// Per-instance animation parameters. Assigned once, read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LanternInstance {
    pub base: Vec3,
    pub speed: f32,
    /// Phase of the horizontal X oscillation.
    pub orbit_phase: f32,
    /// Phase of the horizontal Z oscillation.
    pub vertical_phase: f32,
}

impl LanternInstance {
    pub fn new(base: Vec3, speed: f32, orbit_phase: f32, vertical_phase: f32) -> Self {
        Self {
            base,
            speed,
            orbit_phase,
            vertical_phase,
        }
    }

    /// Position of this lantern's origin at `elapsed` seconds.
    pub fn displaced(&self, elapsed: f32) -> Vec3 {
        displace(self, elapsed)
    }

    pub fn flicker(&self) -> f32 {
        flicker(self.orbit_phase, self.vertical_phase)
    }

    /// Seconds for one full trip through the band. `None` for a stationary lantern.
    pub fn loop_period(&self) -> Option<f32> {
        (self.speed > 0.0).then(|| BAND_HEIGHT / self.speed)
    }
}

/// Evaluate the motion model for one instance.
///
/// X and Z oscillate on a unit circle-ish path around the base position while
/// Y rises at `speed` units per second and wraps inside the band.
pub fn displace(instance: &LanternInstance, elapsed: f32) -> Vec3 {
    let travelled = elapsed * instance.speed;
    Vec3::new(
        instance.base.x + (instance.orbit_phase + travelled).cos(),
        vertical_loop(instance.base.y, travelled),
        instance.base.z + (instance.vertical_phase + travelled).sin(),
    )
}

/// Sawtooth wrap of `base_y + travelled` into `[-BAND_HALF_HEIGHT, BAND_HALF_HEIGHT)`.
pub fn vertical_loop(base_y: f32, travelled: f32) -> f32 {
    let shifted = (base_y + BAND_HALF_HEIGHT + travelled).rem_euclid(BAND_HEIGHT);
    // rem_euclid can round up to exactly the divisor for tiny negative inputs.
    let shifted = if shifted >= BAND_HEIGHT { 0.0 } else { shifted };
    shifted - BAND_HALF_HEIGHT
}

/// Flicker factor in `[0, 1]` derived from the two phases.
pub fn flicker(orbit_phase: f32, vertical_phase: f32) -> f32 {
    ((orbit_phase + vertical_phase).sin() * 0.5 + 0.5).clamp(0.0, 1.0)
}

/// World position of a mesh vertex for an instance.
pub fn vertex_world(local: Vec3, mesh_scale: f32, displaced: Vec3) -> Vec3 {
    local * mesh_scale + displaced
}

/// Fragment color for a point at unscaled mesh height `local_y`.
pub fn shade(palette: &Palette, flicker: f32, local_y: f32, flame_threshold: f32) -> Rgb {
    let col = palette.light.mix(palette.color, flicker);
    if local_y < flame_threshold {
        col.mix(palette.fire, FLAME_MIX)
    } else {
        col
    }
}
