//! Application configuration.

use crate::send::SenderProfile;
use doodlepost_core::config::{ConfigError, DrawingConfig};
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub drawing: DrawingConfig,
    pub sender: SenderProfile,
    /// Where sent PNGs are written.
    pub output_dir: PathBuf,
    /// Shared metadata file. `None` uses the platform data directory.
    pub metadata_path: Option<PathBuf>,
    /// Logical size of exported doodles. `None` exports at canvas size.
    pub export_size: Option<Size>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            drawing: DrawingConfig::default(),
            sender: SenderProfile::default(),
            output_dir: dirs::data_local_dir()
                .map(|dir| dir.join("doodlepost").join("doodles"))
                .unwrap_or_else(|| PathBuf::from("doodles")),
            metadata_path: None,
            export_size: None,
        }
    }
}

impl AppConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.drawing.validate()?;
        if let Some(size) = self.export_size {
            if !(size.width > 0.0 && size.height > 0.0 && size.is_finite()) {
                return Err(ConfigError::Invalid {
                    field: "export_size",
                    reason: format!("{}x{} is not a drawable size", size.width, size.height),
                });
            }
        }
        if self.sender.display_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "sender.display_name",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
