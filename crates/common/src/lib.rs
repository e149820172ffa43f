//! Shared types for the lantern scene: linear colors, the shader palette and
//! the YAML scene configuration consumed by both apps.

pub mod config;
pub mod types;

pub use config::{CameraConfig, ConfigError, PopulationConfig, RenderConfig, SceneConfig};
pub use types::{Palette, Rgb};
