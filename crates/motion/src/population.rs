use std::f32::consts::{PI, TAU};

use glam::Vec3;
use lanternfield_common::PopulationConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::evaluator::LanternInstance;

/// The fixed set of lanterns for one run.
///
/// Instances are generated once from a seed and never change afterwards;
/// the same seed and config always produce the same population.
#[derive(Debug, Clone)]
pub struct Population {
    instances: Vec<LanternInstance>,
    seed: u64,
}

impl Population {
    /// Generate `config.instance_count` lanterns from `seed`.
    pub fn generate(config: &PopulationConfig, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let centered = |rng: &mut StdRng| (rng.random::<f32>() - 0.5) * config.spread;

        let instances = (0..config.instance_count)
            .map(|_| {
                let base = Vec3::new(centered(&mut rng), centered(&mut rng), centered(&mut rng));
                let speed = config.speed_min + rng.random::<f32>() * config.speed_range;
                let orbit_phase = TAU * rng.random::<f32>();
                let vertical_phase = PI * rng.random::<f32>() * 5.0;
                LanternInstance::new(base, speed, orbit_phase, vertical_phase)
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            count = instances.len(),
            seed,
            "generated lantern population"
        );
        Self { instances, seed }
    }

    /// Generate using the configured seed, or a fresh random one.
    pub fn from_config(config: &PopulationConfig) -> Self {
        let seed = match config.seed {
            Some(seed) => seed,
            None => {
                let seed = rand::random::<u64>();
                tracing::info!("no population seed configured, using {seed}");
                seed
            }
        };
        Self::generate(config, seed)
    }

    /// Wrap an explicit instance list (useful for fixtures).
    pub fn from_instances(instances: Vec<LanternInstance>, seed: u64) -> Self {
        Self { instances, seed }
    }

    pub fn instances(&self) -> &[LanternInstance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Displaced positions of every lantern at `elapsed`, in instance order.
    pub fn displaced(&self, elapsed: f32) -> impl Iterator<Item = Vec3> + '_ {
        self.instances.iter().map(move |inst| inst.displaced(elapsed))
    }

    /// Axis-aligned bounds `(min, max)` of all displaced positions.
    pub fn bounds(&self, elapsed: f32) -> Option<(Vec3, Vec3)> {
        let mut positions = self.displaced(elapsed);
        let first = positions.next()?;
        Some(positions.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::BAND_HALF_HEIGHT;

    fn config(count: usize) -> PopulationConfig {
        PopulationConfig {
            instance_count: count,
            ..PopulationConfig::default()
        }
    }

    #[test]
    fn same_seed_same_population() {
        let a = Population::generate(&config(64), 42);
        let b = Population::generate(&config(64), 42);
        assert_eq!(a.instances(), b.instances());
        assert_eq!(a.seed(), 42);
    }

    #[test]
    fn different_seed_different_population() {
        let a = Population::generate(&config(16), 1);
        let b = Population::generate(&config(16), 2);
        assert_ne!(a.instances(), b.instances());
    }

    #[test]
    fn generates_requested_count() {
        let pop = Population::generate(&PopulationConfig::default(), 7);
        assert_eq!(pop.len(), 500);
        assert!(!pop.is_empty());
    }

    #[test]
    fn parameters_within_configured_ranges() {
        let cfg = PopulationConfig::default();
        let pop = Population::generate(&cfg, 99);
        let half = cfg.spread / 2.0;
        for inst in pop.instances() {
            for c in inst.base.to_array() {
                assert!((-half..half).contains(&c), "base component {c} outside spread");
            }
            assert!(inst.speed >= cfg.speed_min);
            assert!(inst.speed < cfg.speed_min + cfg.speed_range + 1e-6);
            assert!((0.0..TAU).contains(&inst.orbit_phase));
            assert!((0.0..5.0 * PI).contains(&inst.vertical_phase));
        }
    }

    #[test]
    fn configured_seed_is_used() {
        let cfg = PopulationConfig {
            seed: Some(1234),
            ..config(8)
        };
        let pop = Population::from_config(&cfg);
        assert_eq!(pop.seed(), 1234);
        assert_eq!(pop.instances(), Population::generate(&cfg, 1234).instances());
    }

    #[test]
    fn displaced_follows_instance_order() {
        let pop = Population::generate(&config(10), 3);
        let positions: Vec<Vec3> = pop.displaced(12.5).collect();
        assert_eq!(positions.len(), 10);
        for (inst, p) in pop.instances().iter().zip(&positions) {
            assert_eq!(inst.displaced(12.5), *p);
        }
    }

    #[test]
    fn bounds_contain_every_lantern() {
        let pop = Population::generate(&config(100), 5);
        let (min, max) = pop.bounds(30.0).unwrap();
        for p in pop.displaced(30.0) {
            assert!(p.cmpge(min).all() && p.cmple(max).all());
        }
        assert!(min.y >= -BAND_HALF_HEIGHT && max.y < BAND_HALF_HEIGHT);
    }

    #[test]
    fn empty_population_has_no_bounds() {
        let pop = Population::from_instances(Vec::new(), 0);
        assert!(pop.bounds(0.0).is_none());
    }
}
