//! Persisted session snapshot
//!
//! A flat JSON object written when the window closes and read on start-up,
//! so an operator can resume where they stopped.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{AnnotatorError, Result};

/// Default snapshot location, relative to the working directory
pub const DEFAULT_SNAPSHOT_PATH: &str = "state.json";

/// Session fields that survive a restart
///
/// Every field defaults independently, so a snapshot written by an older
/// build with fewer keys still loads.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SessionState {
    pub ok_count: u32,
    pub not_ok_count: u32,
    /// Basenames of completed images
    pub completed_images: Vec<String>,
    pub image_paths: Vec<PathBuf>,
    pub current_index: usize,
}

/// Why a load fell back to an empty session
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultReason {
    /// No snapshot file
    Missing,
    /// The file exists but could not be read or parsed
    Malformed(String),
}

/// Outcome of [`SessionState::load`]
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotLoad {
    Loaded(SessionState),
    DefaultedEmpty(DefaultReason),
}

impl SnapshotLoad {
    /// The loaded state, or the default one
    pub fn into_state(self) -> SessionState {
        match self {
            SnapshotLoad::Loaded(state) => state,
            SnapshotLoad::DefaultedEmpty(_) => SessionState::default(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, SnapshotLoad::Loaded(_))
    }
}

impl SessionState {
    /// Convert to a JSON string
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from a JSON string
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Write the snapshot to `path`, replacing any previous one
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| AnnotatorError::io(parent, e))?;
        }
        fs::write(path, json).map_err(|e| AnnotatorError::io(path, e))?;
        info!(
            path = %path.display(),
            images = self.image_paths.len(),
            completed = self.completed_images.len(),
            "snapshot saved"
        );
        Ok(())
    }

    /// Read the snapshot at `path`; never fails
    pub fn load(path: &Path) -> SnapshotLoad {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "no snapshot, starting fresh");
                return SnapshotLoad::DefaultedEmpty(DefaultReason::Missing);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable snapshot, starting fresh");
                return SnapshotLoad::DefaultedEmpty(DefaultReason::Malformed(e.to_string()));
            }
        };

        match Self::from_json(&json) {
            Ok(state) => {
                info!(path = %path.display(), images = state.image_paths.len(), "snapshot loaded");
                SnapshotLoad::Loaded(state)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed snapshot, starting fresh");
                SnapshotLoad::DefaultedEmpty(DefaultReason::Malformed(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> SessionState {
        SessionState {
            ok_count: 3,
            not_ok_count: 1,
            completed_images: vec!["a".to_string(), "b".to_string()],
            image_paths: vec![PathBuf::from("imgs/a.jpg"), PathBuf::from("imgs/b.png")],
            current_index: 1,
        }
    }

    #[test]
    fn test_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");

        sample().save(&path).unwrap();

        assert_eq!(SessionState::load(&path), SnapshotLoad::Loaded(sample()));
    }

    #[test]
    fn test_save_creates_parent_folder() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("state.json");

        sample().save(&path).unwrap();
        assert!(SessionState::load(&path).is_loaded());
    }

    #[test]
    fn test_json_keys() {
        let value: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        let object = value.as_object().unwrap();
        for key in ["ok_count", "not_ok_count", "completed_images", "image_paths", "current_index"] {
            assert!(object.contains_key(key), "missing {key}");
        }
    }

    #[test]
    fn test_missing_file_defaults() {
        let tmp = TempDir::new().unwrap();
        let outcome = SessionState::load(&tmp.path().join("state.json"));
        assert_eq!(outcome, SnapshotLoad::DefaultedEmpty(DefaultReason::Missing));
        assert_eq!(outcome.into_state(), SessionState::default());
    }

    #[test]
    fn test_malformed_file_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();

        let outcome = SessionState::load(&path);
        assert!(matches!(
            outcome,
            SnapshotLoad::DefaultedEmpty(DefaultReason::Malformed(_))
        ));
        assert_eq!(outcome.into_state(), SessionState::default());
    }

    #[test]
    fn test_wrong_types_are_malformed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        fs::write(&path, r#"{"ok_count": -4}"#).unwrap();

        assert!(!SessionState::load(&path).is_loaded());
    }

    #[test]
    fn test_partial_object_fills_defaults() {
        let state = SessionState::from_json(r#"{"ok_count": 7}"#).unwrap();
        assert_eq!(state.ok_count, 7);
        assert_eq!(state.not_ok_count, 0);
        assert!(state.image_paths.is_empty());
        assert_eq!(state.current_index, 0);
    }
}
