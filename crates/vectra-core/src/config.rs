//! Editor configuration.

use crate::shapes::FontSizing;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Tunables for shape creation, handles and the render tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Shapes released smaller than this in either dimension are discarded.
    pub min_shape_size: f64,
    /// Side of a modifier handle in pixels.
    pub handle_size: f64,
    /// Target render ticks per second.
    pub frame_rate: u32,
    pub min_font_size: f64,
    pub max_font_size: f64,
    /// Font size change per pixel of resize drag.
    pub font_size_per_pixel: f64,
    pub default_font_size: f64,
    pub default_polygon_sides: usize,
    pub default_star_spikes: usize,
    /// Inner / outer radius of new stars.
    pub default_star_ratio: f64,
    /// Rotation snapping step when shift is held.
    pub rotation_snap_degrees: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_shape_size: 5.0,
            handle_size: 8.0,
            frame_rate: 60,
            min_font_size: 8.0,
            max_font_size: 72.0,
            font_size_per_pixel: 0.1,
            default_font_size: 16.0,
            default_polygon_sides: 5,
            default_star_spikes: 5,
            default_star_ratio: 0.5,
            rotation_snap_degrees: 15.0,
        }
    }
}

impl EditorConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded editor config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_rate == 0 {
            return Err(ConfigError::Invalid("frame_rate must be positive".into()));
        }
        if !(self.handle_size > 0.0) {
            return Err(ConfigError::Invalid("handle_size must be positive".into()));
        }
        if !(self.min_font_size > 0.0 && self.min_font_size <= self.max_font_size) {
            return Err(ConfigError::Invalid(format!(
                "font size range {}..{} is empty",
                self.min_font_size, self.max_font_size
            )));
        }
        if !(self.default_star_ratio > 0.0 && self.default_star_ratio <= 1.0) {
            return Err(ConfigError::Invalid("default_star_ratio must be in (0, 1]".into()));
        }
        Ok(())
    }

    pub fn font_sizing(&self) -> FontSizing {
        FontSizing {
            min: self.min_font_size,
            max: self.max_font_size,
            per_pixel: self.font_size_per_pixel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert!((config.min_shape_size - 5.0).abs() < f64::EPSILON);
        assert_eq!(config.frame_rate, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EditorConfig::from_json(r#"{ "handle_size": 12.0, "frame_rate": 30 }"#).unwrap();
        assert!((config.handle_size - 12.0).abs() < f64::EPSILON);
        assert_eq!(config.frame_rate, 30);
        assert_eq!(config.default_polygon_sides, 5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            EditorConfig::from_json(r#"{ "frame_rate": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EditorConfig::from_json(r#"{ "min_font_size": 80.0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(EditorConfig::from_json("not json"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "min_shape_size": 2.5 }}"#).unwrap();
        let config = EditorConfig::from_file(file.path()).unwrap();
        assert!((config.min_shape_size - 2.5).abs() < f64::EPSILON);

        let missing = EditorConfig::from_file(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
