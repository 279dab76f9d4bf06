//! Application configuration
//!
//! Read from `~/.config/label-annotator/config.toml` on Linux (the
//! platform config directory elsewhere). Every key is optional.

use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{AnnotatorError, Result};
use crate::state::data::Navigation;
use crate::state::snapshot::DEFAULT_SNAPSHOT_PATH;
use crate::store::DEFAULT_IMAGE_EXTENSIONS;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "LABEL_ANNOTATOR_CONFIG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Where the session snapshot is written on close
    pub snapshot_path: PathBuf,
    /// Cursor behaviour past either end of the list
    pub navigation: Navigation,
    /// Create the label folder when it does not exist yet
    pub create_label_dir: bool,
    /// Image extensions to scan for, case-insensitive
    pub image_extensions: Vec<String>,
    /// Image folder to open at start-up
    pub image_dir: Option<PathBuf>,
    /// Label folder to use at start-up
    pub label_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            navigation: Navigation::Clamp,
            create_label_dir: true,
            image_extensions: DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            image_dir: None,
            label_dir: None,
        }
    }
}

impl AppConfig {
    /// Get the path where the config file is expected
    pub fn config_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|mut path| {
            path.push("label-annotator");
            path.push("config.toml");
            path
        })
    }

    /// Load the config file, falling back to defaults when there is none
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from an explicit path; a missing or blank file gives the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(AnnotatorError::io(path, e)),
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        toml::from_str(&content).map_err(|source| AnnotatorError::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}
