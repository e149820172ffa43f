use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::types::Palette;

/// Errors from loading or validating a scene configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// How the lantern population is laid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub instance_count: usize,
    /// Edge length of the cube base positions are drawn from, centered on the origin.
    pub spread: f32,
    pub speed_min: f32,
    pub speed_range: f32,
    /// Fixed seed; a random one is drawn when absent.
    pub seed: Option<u64>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            instance_count: 500,
            spread: 200.0,
            speed_min: 0.25,
            speed_range: 0.5,
            seed: None,
        }
    }
}

/// Orbit camera setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    /// Closest zoom. Must stay positive so the eye never reaches the target.
    pub min_distance: f32,
    pub max_distance: f32,
    /// Fraction of pending rotation/pan applied per frame. 0 disables damping.
    pub damping: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            near: 0.1,
            far: 500.0,
            position: Vec3::new(0.0, -25.0, 80.0),
            target: Vec3::ZERO,
            min_distance: 1.0,
            max_distance: 150.0,
            damping: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub msaa_samples: u32,
    /// Local mesh height below which the flame tint is applied.
    pub flame_threshold: f32,
    pub mesh_scale: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            msaa_samples: 4,
            flame_threshold: 0.2,
            mesh_scale: 2.0,
        }
    }
}

/// Top-level scene configuration. Every field has a default, so an empty
/// file (or no file) is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub population: PopulationConfig,
    pub palette: Palette,
    pub camera: CameraConfig,
    pub render: RenderConfig,
    /// Multiplier applied to wall-clock time before it reaches the shader.
    pub time_scale: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            population: PopulationConfig::default(),
            palette: Palette::default(),
            camera: CameraConfig::default(),
            render: RenderConfig::default(),
            time_scale: 1.0,
        }
    }
}

impl SceneConfig {
    /// Read and validate a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!("loaded scene config from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides and re-validate.
    pub fn with_overrides(
        mut self,
        seed: Option<u64>,
        instance_count: Option<usize>,
    ) -> Result<Self, ConfigError> {
        if let Some(seed) = seed {
            self.population.seed = Some(seed);
        }
        if let Some(count) = instance_count {
            self.population.instance_count = count;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        // serde_yaml rejects an empty document; treat it as all defaults.
        let config: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(text)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.population;
        if p.instance_count == 0 {
            return Err(ConfigError::invalid(
                "population.instance_count",
                "must be at least 1",
            ));
        }
        if u32::try_from(p.instance_count).is_err() {
            return Err(ConfigError::invalid(
                "population.instance_count",
                format!("{} does not fit a GPU instance range", p.instance_count),
            ));
        }
        if !(p.spread.is_finite() && p.spread > 0.0) {
            return Err(ConfigError::invalid(
                "population.spread",
                format!("must be positive, got {}", p.spread),
            ));
        }
        if !(p.speed_min.is_finite() && p.speed_min >= 0.0) {
            return Err(ConfigError::invalid(
                "population.speed_min",
                format!("must be non-negative, got {}", p.speed_min),
            ));
        }
        if !(p.speed_range.is_finite() && p.speed_range >= 0.0) {
            return Err(ConfigError::invalid(
                "population.speed_range",
                format!("must be non-negative, got {}", p.speed_range),
            ));
        }

        let c = &self.camera;
        if !(c.fov_degrees > 0.0 && c.fov_degrees < 180.0) {
            return Err(ConfigError::invalid(
                "camera.fov_degrees",
                format!("must be in (0, 180), got {}", c.fov_degrees),
            ));
        }
        if !(c.near > 0.0) {
            return Err(ConfigError::invalid(
                "camera.near",
                format!("must be positive, got {}", c.near),
            ));
        }
        if !(c.far > c.near) {
            return Err(ConfigError::invalid(
                "camera.far",
                format!("must exceed near ({}), got {}", c.near, c.far),
            ));
        }
        if !(c.min_distance.is_finite() && c.min_distance > 0.0) {
            return Err(ConfigError::invalid(
                "camera.min_distance",
                format!("must be positive, got {}", c.min_distance),
            ));
        }
        if !(c.max_distance >= c.min_distance) {
            return Err(ConfigError::invalid(
                "camera.max_distance",
                format!(
                    "must be at least min_distance ({}), got {}",
                    c.min_distance, c.max_distance
                ),
            ));
        }
        if !(0.0..=1.0).contains(&c.damping) {
            return Err(ConfigError::invalid(
                "camera.damping",
                format!("must be in [0, 1], got {}", c.damping),
            ));
        }

        let r = &self.render;
        if !matches!(r.msaa_samples, 1 | 4) {
            return Err(ConfigError::invalid(
                "render.msaa_samples",
                format!("must be 1 or 4, got {}", r.msaa_samples),
            ));
        }
        if !(r.mesh_scale.is_finite() && r.mesh_scale > 0.0) {
            return Err(ConfigError::invalid(
                "render.mesh_scale",
                format!("must be positive, got {}", r.mesh_scale),
            ));
        }
        if !r.flame_threshold.is_finite() {
            return Err(ConfigError::invalid(
                "render.flame_threshold",
                format!("must be finite, got {}", r.flame_threshold),
            ));
        }

        let pal = &self.palette;
        for (field, color) in [
            ("palette.light", pal.light),
            ("palette.color", pal.color),
            ("palette.fire", pal.fire),
            ("palette.background", pal.background),
        ] {
            if !color.is_finite() {
                return Err(ConfigError::invalid(
                    field,
                    format!("channels must be finite, got {:?}", color.to_array()),
                ));
            }
        }

        if !(self.time_scale.is_finite() && self.time_scale >= 0.0) {
            return Err(ConfigError::invalid(
                "time_scale",
                format!("must be non-negative, got {}", self.time_scale),
            ));
        }
        Ok(())
    }
}
