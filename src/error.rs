use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors surfaced by session operations
///
/// Missing resources never show up here: an absent directory, label file or
/// snapshot is an empty/default state, not a failure.
#[derive(Debug, Error)]
pub enum AnnotatorError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no image is selected")]
    NoCurrentEntry,

    #[error("no label folder is set")]
    NoLabelStore,

    #[error("snapshot serialization failed: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("invalid config file {path:?}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl AnnotatorError {
    /// Wrap an I/O error with the path that caused it
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        AnnotatorError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnnotatorError>;
