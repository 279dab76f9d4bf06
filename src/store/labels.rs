use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::scanner;
use crate::error::{AnnotatorError, Result};
use crate::state::data::ImageKey;

/// A folder holding one `<key>.txt` file per labelled image.
///
/// Label content is the raw text the operator entered, written verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelStore {
    dir: PathBuf,
}

impl LabelStore {
    /// Use `dir` as the label folder, creating it when `create` is set
    pub fn open(dir: impl Into<PathBuf>, create: bool) -> Result<Self> {
        let dir = dir.into();
        if create && !dir.is_dir() {
            fs::create_dir_all(&dir).map_err(|e| AnnotatorError::io(&dir, e))?;
            info!(dir = %dir.display(), "created label folder");
        }
        Ok(LabelStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the label file for `key`
    pub fn path_for(&self, key: &ImageKey) -> PathBuf {
        self.dir.join(key.label_file_name())
    }

    /// Overwrite the label for `key`
    pub fn write(&self, key: &ImageKey, text: &str) -> Result<()> {
        let path = self.path_for(key);
        fs::write(&path, text).map_err(|e| AnnotatorError::io(&path, e))?;
        debug!(path = %path.display(), "label written");
        Ok(())
    }

    /// Delete the label for `key`, returns false if there was none
    pub fn remove(&self, key: &ImageKey) -> Result<bool> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AnnotatorError::io(&path, e)),
        }
    }

    /// Read every `.txt` file in the folder, keyed by basename
    ///
    /// Files that cannot be read are skipped with a warning.
    pub fn load_all(&self) -> HashMap<ImageKey, String> {
        let mut labels = HashMap::new();

        for path in scanner::list_files(&self.dir, &["txt"]) {
            let Some(key) = ImageKey::from_path(&path) else {
                continue;
            };
            match fs::read_to_string(&path) {
                Ok(text) => {
                    labels.insert(key, text);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable label"),
            }
        }

        info!(dir = %self.dir.display(), labels = labels.len(), "loaded labels");
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_folder() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("labels");

        let store = LabelStore::open(&dir, true).unwrap();
        assert!(dir.is_dir());
        assert_eq!(store.dir(), dir.as_path());
    }

    #[test]
    fn test_open_without_create_leaves_folder_absent() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("labels");

        let store = LabelStore::open(&dir, false).unwrap();
        assert!(!dir.exists());
        assert!(store.load_all().is_empty());
        assert!(store.write(&ImageKey::new("a"), "x").is_err());
    }

    #[test]
    fn test_missing_label_is_absent_from_load() {
        let tmp = TempDir::new().unwrap();
        let store = LabelStore::open(tmp.path(), false).unwrap();
        assert!(!store.load_all().contains_key("nothing"));
    }

    #[test]
    fn test_write_overwrites_verbatim() {
        let tmp = TempDir::new().unwrap();
        let store = LabelStore::open(tmp.path(), false).unwrap();
        let key = ImageKey::new("car_001");

        store.write(&key, "OLD LABEL").unwrap();
        store.write(&key, "AB 12\nCD").unwrap();

        assert_eq!(store.load_all().get("car_001").map(String::as_str), Some("AB 12\nCD"));
        assert_eq!(
            fs::read_to_string(tmp.path().join("car_001.txt")).unwrap(),
            "AB 12\nCD"
        );
    }

    #[test]
    fn test_remove_reports_presence() {
        let tmp = TempDir::new().unwrap();
        let store = LabelStore::open(tmp.path(), false).unwrap();
        let key = ImageKey::new("a");

        store.write(&key, "x").unwrap();
        assert!(store.remove(&key).unwrap());
        assert!(!store.remove(&key).unwrap());
    }

    #[test]
    fn test_load_all_reads_only_txt() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.txt"), "ABC123").unwrap();
        fs::write(tmp.path().join("b.txt"), "").unwrap();
        fs::write(tmp.path().join("c.json"), "{}").unwrap();

        let store = LabelStore::open(tmp.path(), false).unwrap();
        let labels = store.load_all();

        assert_eq!(labels.len(), 2);
        assert_eq!(labels.get("a").map(String::as_str), Some("ABC123"));
        assert_eq!(labels.get("b").map(String::as_str), Some(""));
    }
}
