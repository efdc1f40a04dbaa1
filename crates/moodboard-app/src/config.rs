//! Application configuration stored as JSON in the user config directory.

use crate::error::AppResult;
use moodboard_core::view::DEFAULT_CONTAINER_WIDTH;
use moodboard_render::ExportFormat;
use moodboard_render::export::EXPORT_PIXEL_RATIO;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = "moodboard";
const CONFIG_FILE: &str = "config.json";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Container width used for layout and export.
    pub view_width: f64,
    /// Output pixels per CSS pixel for exports.
    pub pixel_ratio: f64,
    /// Format used by the quick-export shortcut.
    #[serde(with = "format_name")]
    pub export_format: ExportFormat,
    /// TTF/OTF font replacing the embedded one for the title and description.
    pub font_path: Option<PathBuf>,
    /// Directory for direct downloads, instead of the system one.
    pub output_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            view_width: DEFAULT_CONTAINER_WIDTH,
            pixel_ratio: EXPORT_PIXEL_RATIO,
            export_format: ExportFormat::Png,
            font_path: None,
            output_dir: None,
        }
    }
}

impl AppConfig {
    /// Default config file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load from the default location, falling back to defaults.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load from a file. A missing file gives the defaults.
    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)?;
        let mut config: AppConfig = serde_json::from_str(&json)?;
        config.sanitize();
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write to a file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Directory that direct downloads land in.
    pub fn download_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn sanitize(&mut self) {
        if !(self.view_width.is_finite() && self.view_width > 0.0) {
            self.view_width = DEFAULT_CONTAINER_WIDTH;
        }
        if !(self.pixel_ratio.is_finite() && self.pixel_ratio > 0.0) {
            self.pixel_ratio = EXPORT_PIXEL_RATIO;
        }
    }
}

mod format_name {
    use moodboard_render::ExportFormat;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(format: &ExportFormat, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(format.extension())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ExportFormat, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
