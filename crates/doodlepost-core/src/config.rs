//! Drawing configuration.

use crate::color::Rgba;
use crate::export::EXPORT_PIXEL_RATIO;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunables for a drawing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawingConfig {
    /// Stroke color selected when a session starts.
    pub default_color: Rgba,
    /// Stroke width selected when a session starts.
    pub default_line_width: f64,
    /// Eraser strokes are this many times wider than the configured width.
    pub eraser_width_multiplier: f64,
    /// Canvas color for a fresh session.
    pub background_color: Rgba,
    /// Overlay label shown while a photo is placed but nothing is drawn yet.
    pub transform_hint: String,
    /// Output pixels per logical point for exported images.
    pub export_pixel_ratio: f64,
}

impl Default for DrawingConfig {
    fn default() -> Self {
        Self {
            default_color: Rgba::black(),
            default_line_width: 5.0,
            eraser_width_multiplier: 2.5,
            background_color: Rgba::white(),
            transform_hint: "pinch to zoom, two fingers to move".to_string(),
            export_pixel_ratio: EXPORT_PIXEL_RATIO,
        }
    }
}

impl DrawingConfig {
    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would break drawing invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.default_line_width > 0.0) {
            return Err(ConfigError::Invalid {
                field: "default_line_width",
                reason: format!("must be positive, got {}", self.default_line_width),
            });
        }
        if !(self.eraser_width_multiplier > 0.0) {
            return Err(ConfigError::Invalid {
                field: "eraser_width_multiplier",
                reason: format!("must be positive, got {}", self.eraser_width_multiplier),
            });
        }
        if !(self.export_pixel_ratio > 0.0) {
            return Err(ConfigError::Invalid {
                field: "export_pixel_ratio",
                reason: format!("must be positive, got {}", self.export_pixel_ratio),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DrawingConfig::default();
        assert!((config.eraser_width_multiplier - 2.5).abs() < f64::EPSILON);
        assert!((config.export_pixel_ratio - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.background_color, Rgba::white());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = DrawingConfig::from_json(r#"{ "default_line_width": 8.0 }"#).unwrap();
        assert!((config.default_line_width - 8.0).abs() < f64::EPSILON);
        assert_eq!(config.default_color, Rgba::black());
    }

    #[test]
    fn test_invalid_width_rejected() {
        let result = DrawingConfig::from_json(r#"{ "default_line_width": 0.0 }"#);
        assert!(matches!(result, Err(ConfigError::Invalid { field: "default_line_width", .. })));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drawing.json");
        let mut config = DrawingConfig::default();
        config.transform_hint = "move me".to_string();
        std::fs::write(&path, config.to_json().unwrap()).unwrap();

        let loaded = DrawingConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
