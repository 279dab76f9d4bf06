//! Shared data structures for the annotation session
//!
//! These structs represent the data model that flows between
//! the filesystem layer and the UI layer.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Join key between an image and its label file: the file name without extension
///
/// `plates/car_001.jpg` and `labels/car_001.txt` share the key `car_001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageKey(String);

impl ImageKey {
    pub fn new(key: impl Into<String>) -> Self {
        ImageKey(key.into())
    }

    /// Derive the key from a path
    ///
    /// `None` for paths without a file name or with a non-UTF-8 stem, since
    /// a lossy conversion could map two stems onto one label file.
    pub fn from_path(path: &Path) -> Option<Self> {
        let stem = path.file_stem()?;
        let Some(stem) = stem.to_str() else {
            warn!(path = %path.display(), "skipping file with a non-UTF-8 name");
            return None;
        };
        if stem.is_empty() {
            return None;
        }
        Some(ImageKey::new(stem))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the label file for this key
    pub fn label_file_name(&self) -> String {
        format!("{}.txt", self.0)
    }
}

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ImageKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Represents a single image in the session
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEntry {
    /// Basename without extension (e.g., "car_001")
    pub key: ImageKey,
    /// Full path to the image file
    pub path: PathBuf,
    /// Set by a commit or a classification in this session (or a restored snapshot)
    pub completed: bool,
    /// The current label folder holds non-empty text for this image
    pub labelled: bool,
}

impl ImageEntry {
    /// Build an entry from a scanned path, `None` if no key can be derived
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let key = ImageKey::from_path(&path)?;
        Some(ImageEntry {
            key,
            path,
            completed: false,
            labelled: false,
        })
    }

    /// Completed by an explicit action or by an existing label
    pub fn is_completed(&self) -> bool {
        self.completed || self.labelled
    }

    /// File name for display (e.g., "car_001.jpg")
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }
}

/// Binary classification outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    NotOk,
}

/// Running counters for classification outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub ok: u32,
    pub not_ok: u32,
}

impl OutcomeCounts {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Ok => self.ok += 1,
            Outcome::NotOk => self.not_ok += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.ok + self.not_ok
    }
}

/// Cursor behaviour at the ends of the image list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Navigation {
    /// Stay on the first/last entry
    #[default]
    Clamp,
    /// Jump to the other end of the list
    Wrap,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_strips_extension() {
        let key = ImageKey::from_path(Path::new("/data/plates/car_001.JPG")).unwrap();
        assert_eq!(key.as_str(), "car_001");
        assert_eq!(key.label_file_name(), "car_001.txt");
    }

    #[test]
    fn test_key_keeps_inner_dots() {
        let key = ImageKey::from_path(Path::new("scan.2024.png")).unwrap();
        assert_eq!(key.as_str(), "scan.2024");
    }

    #[test]
    fn test_key_requires_file_name() {
        assert!(ImageKey::from_path(Path::new("/")).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_key_rejects_non_utf8_stem() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new(OsStr::from_bytes(b"plate_\xff.png"));
        assert!(ImageKey::from_path(path).is_none());
        assert!(ImageEntry::from_path(path.to_path_buf()).is_none());
    }

    #[test]
    fn test_entry_completion_sources() {
        let mut entry = ImageEntry::from_path(PathBuf::from("a.jpg")).unwrap();
        assert!(!entry.is_completed());

        entry.labelled = true;
        assert!(entry.is_completed());

        entry.labelled = false;
        entry.completed = true;
        assert!(entry.is_completed());
    }

    #[test]
    fn test_counts_record() {
        let mut counts = OutcomeCounts::default();
        counts.record(Outcome::Ok);
        counts.record(Outcome::Ok);
        counts.record(Outcome::NotOk);
        assert_eq!(counts, OutcomeCounts { ok: 2, not_ok: 1 });
        assert_eq!(counts.total(), 3);
    }
}
