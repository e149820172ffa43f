/// WGSL shader for the instanced lanterns.
///
/// Vertex stage: scales the lantern mesh, oscillates each instance in X/Z and
/// loops it vertically through the band. Fragment stage: flicker blend between
/// the light and paper colors, with the flame tint near the base.
pub const LANTERN_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    light: vec4<f32>,
    color: vec4<f32>,
    fire: vec4<f32>,
    // x: elapsed seconds, y: flame threshold, z: mesh scale
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

const BAND_HALF_HEIGHT: f32 = 200.0;
const BAND_HEIGHT: f32 = 400.0;
const FLAME_MIX: f32 = 0.8;

struct VertexInput {
    @location(0) position: vec3<f32>,
};

struct InstanceInput {
    @location(1) base: vec3<f32>,
    @location(2) speed: f32,
    // x: orbit phase, y: vertical phase
    @location(3) phase: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) @interpolate(flat) phase: vec2<f32>,
    @location(1) local_y: f32,
};

// GLSL-style mod: result takes the sign of the divisor.
fn floored_mod(x: f32, y: f32) -> f32 {
    return x - y * floor(x / y);
}

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let travelled = uniforms.params.x * instance.speed;

    var offset = instance.base;
    offset.x += cos(instance.phase.x + travelled);
    offset.z += sin(instance.phase.y + travelled);
    offset.y = floored_mod(offset.y + BAND_HALF_HEIGHT + travelled, BAND_HEIGHT) - BAND_HALF_HEIGHT;

    let world_pos = vertex.position * uniforms.params.z + offset;

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * vec4<f32>(world_pos, 1.0);
    out.phase = instance.phase;
    out.local_y = vertex.position.y;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let flicker = sin(in.phase.x + in.phase.y) * 0.5 + 0.5;
    var col = mix(uniforms.light.rgb, uniforms.color.rgb, flicker);
    if (in.local_y < uniforms.params.y) {
        col = mix(col, uniforms.fire.rgb, FLAME_MIX);
    }
    return vec4<f32>(col, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use lanternfield_motion::{BAND_HALF_HEIGHT, BAND_HEIGHT, FLAME_MIX};

    #[test]
    fn shader_constants_match_motion_model() {
        assert!(LANTERN_SHADER.contains(&format!(
            "const BAND_HALF_HEIGHT: f32 = {BAND_HALF_HEIGHT:.1};"
        )));
        assert!(LANTERN_SHADER.contains(&format!("const BAND_HEIGHT: f32 = {BAND_HEIGHT:.1};")));
        assert!(LANTERN_SHADER.contains(&format!("const FLAME_MIX: f32 = {FLAME_MIX:.1};")));
    }

    #[test]
    fn shader_has_entry_points() {
        assert!(LANTERN_SHADER.contains("fn vs_main"));
        assert!(LANTERN_SHADER.contains("fn fs_main"));
    }
}
