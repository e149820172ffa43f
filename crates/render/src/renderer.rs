use std::fmt::Write;

use glam::Vec3;
use lanternfield_common::Palette;
use lanternfield_motion::{Population, shade};

/// Per-frame view state handed to a renderer.
#[derive(Debug, Clone, Copy)]
pub struct FrameView {
    /// Seconds of animation time for this frame.
    pub elapsed: f32,
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Field of view in degrees.
    pub fov_degrees: f32,
}

impl Default for FrameView {
    fn default() -> Self {
        Self {
            elapsed: 0.0,
            eye: Vec3::new(0.0, -25.0, 80.0),
            target: Vec3::ZERO,
            fov_degrees: 60.0,
        }
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer reads the (immutable) population and a view, then produces
/// output. Nothing it does feeds back into the population.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given population and view.
    fn render(&self, population: &Population, view: &FrameView) -> Self::Output;
}

/// Text renderer evaluating the motion model on the CPU.
///
/// Prints each lantern's displaced position, flicker and body color, which
/// is what the GPU shader computes per vertex. Used by the CLI and in tests.
#[derive(Debug, Clone)]
pub struct DebugTextRenderer {
    palette: Palette,
    flame_threshold: f32,
    limit: Option<usize>,
}

impl Default for DebugTextRenderer {
    fn default() -> Self {
        Self::new(Palette::default(), 0.2)
    }
}

impl DebugTextRenderer {
    pub fn new(palette: Palette, flame_threshold: f32) -> Self {
        Self {
            palette,
            flame_threshold,
            limit: None,
        }
    }

    /// Only list the first `limit` lanterns.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, population: &Population, view: &FrameView) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Lantern frame (t={:.3}s, seed={}) ===",
            view.elapsed,
            population.seed()
        );
        let _ = writeln!(out, "Lanterns: {}", population.len());
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}",
            view.eye.x, view.eye.y, view.eye.z, view.target.x, view.target.y, view.target.z,
            view.fov_degrees
        );
        if let Some((min, max)) = population.bounds(view.elapsed) {
            let _ = writeln!(
                out,
                "Bounds: min=({:.1}, {:.1}, {:.1}) max=({:.1}, {:.1}, {:.1})",
                min.x, min.y, min.z, max.x, max.y, max.z
            );
        }

        let shown = self.limit.unwrap_or(population.len());
        for (index, inst) in population.instances().iter().take(shown).enumerate() {
            let p = inst.displaced(view.elapsed);
            let flicker = inst.flicker();
            // Body color: sampled above the flame band.
            let body = shade(&self.palette, flicker, self.flame_threshold + 1.0, self.flame_threshold);
            let _ = writeln!(
                out,
                "  [{index:>4}] pos=({:.2}, {:.2}, {:.2}) speed={:.3} flicker={:.3} color=({:.3}, {:.3}, {:.3})",
                p.x, p.y, p.z, inst.speed, flicker, body.r, body.g, body.b
            );
        }
        if shown < population.len() {
            let _ = writeln!(out, "  ... {} more", population.len() - shown);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanternfield_common::PopulationConfig;
    use lanternfield_motion::LanternInstance;

    fn population(count: usize) -> Population {
        let config = PopulationConfig {
            instance_count: count,
            ..PopulationConfig::default()
        };
        Population::generate(&config, 11)
    }

    #[test]
    fn debug_renderer_empty_population() {
        let pop = Population::from_instances(Vec::new(), 0);
        let output = DebugTextRenderer::default().render(&pop, &FrameView::default());

        assert!(output.contains("t=0.000s"));
        assert!(output.contains("Lanterns: 0"));
        assert!(!output.contains("Bounds"));
    }

    #[test]
    fn debug_renderer_lists_every_lantern() {
        let pop = population(3);
        let output = DebugTextRenderer::default().render(&pop, &FrameView::default());

        assert!(output.contains("Lanterns: 3"));
        assert_eq!(output.matches("pos=").count(), 3);
        assert!(output.contains("seed=11"));
    }

    #[test]
    fn debug_renderer_respects_limit() {
        let pop = population(10);
        let output = DebugTextRenderer::default()
            .with_limit(4)
            .render(&pop, &FrameView::default());

        assert_eq!(output.matches("pos=").count(), 4);
        assert!(output.contains("... 6 more"));
    }

    #[test]
    fn debug_renderer_uses_elapsed_time() {
        let inst = LanternInstance::new(Vec3::new(0.0, 190.0, 0.0), 1.0, 0.0, 0.0);
        let pop = Population::from_instances(vec![inst], 0);
        let view = FrameView {
            elapsed: 15.0,
            ..FrameView::default()
        };
        let output = DebugTextRenderer::default().render(&pop, &view);
        assert!(output.contains("-195.00"), "{output}");
    }

    #[test]
    fn frame_view_default() {
        let view = FrameView::default();
        assert_eq!(view.fov_degrees, 60.0);
        assert_eq!(view.target, Vec3::ZERO);
        assert_eq!(view.elapsed, 0.0);
    }
}
