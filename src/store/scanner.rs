use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::state::data::{ImageEntry, ImageKey};

/// Extensions picked up when no config overrides them
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Result of scanning an image folder
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Matching images, ordered by path
    pub entries: Vec<ImageEntry>,
    /// Paths skipped because an earlier path already claimed their key
    pub collisions: Vec<PathBuf>,
}

/// Check a path's extension against an allow-list (case-insensitive)
pub fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            extensions
                .iter()
                .any(|allowed| allowed.as_ref().eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// List the files directly inside `dir` with one of `extensions`, sorted by path
///
/// A missing or unreadable folder yields an empty list.
pub fn list_files<S: AsRef<str>>(dir: &Path, extensions: &[S]) -> Vec<PathBuf> {
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "folder not found");
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| has_extension(path, extensions))
        .collect();

    files.sort();
    files
}

/// Scan an image folder into session entries
///
/// Two images with the same basename would share one label file, so only the
/// first path (in sorted order) is kept for each key.
pub fn scan_images<S: AsRef<str>>(dir: &Path, extensions: &[S]) -> ScanReport {
    let mut report = ScanReport::default();
    let mut seen: HashSet<ImageKey> = HashSet::new();

    for path in list_files(dir, extensions) {
        let Some(entry) = ImageEntry::from_path(path.clone()) else {
            continue;
        };
        if !seen.insert(entry.key.clone()) {
            warn!(
                path = %path.display(),
                key = %entry.key,
                "skipping image whose basename is already taken"
            );
            report.collisions.push(path);
            continue;
        }
        report.entries.push(entry);
    }

    info!(
        dir = %dir.display(),
        images = report.entries.len(),
        collisions = report.collisions.len(),
        "scanned image folder"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_scan_filters_and_sorts() {
        let tmp = TempDir::new().unwrap();
        for name in ["c.jpeg", "a.jpg", "b.PNG", "notes.txt", "d.gif"] {
            touch(tmp.path(), name);
        }
        fs::create_dir(tmp.path().join("nested.jpg")).unwrap();

        let report = scan_images(tmp.path(), DEFAULT_IMAGE_EXTENSIONS);
        let keys: Vec<&str> = report.entries.iter().map(|e| e.key.as_str()).collect();

        assert_eq!(keys, vec!["a", "b", "c"]);
        assert!(report.collisions.is_empty());
        assert!(report.entries.iter().all(|e| !e.completed));
    }

    #[test]
    fn test_scan_is_not_recursive() {
        let tmp = TempDir::new().unwrap();
        let sub = tmp.path().join("sub");
        fs::create_dir(&sub).unwrap();
        touch(&sub, "deep.png");
        touch(tmp.path(), "top.png");

        let report = scan_images(tmp.path(), DEFAULT_IMAGE_EXTENSIONS);
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].key.as_str(), "top");
    }

    #[test]
    fn test_scan_missing_folder_is_empty() {
        let tmp = TempDir::new().unwrap();
        let report = scan_images(&tmp.path().join("absent"), DEFAULT_IMAGE_EXTENSIONS);
        assert!(report.entries.is_empty());
    }

    #[test]
    fn test_scan_keeps_first_path_per_basename() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "plate.png");
        touch(tmp.path(), "plate.jpg");

        let report = scan_images(tmp.path(), DEFAULT_IMAGE_EXTENSIONS);
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].path, tmp.path().join("plate.jpg"));
        assert_eq!(report.collisions, vec![tmp.path().join("plate.png")]);
    }

    #[test]
    fn test_has_extension_ignores_case() {
        assert!(has_extension(Path::new("x.JpEg"), DEFAULT_IMAGE_EXTENSIONS));
        assert!(!has_extension(Path::new("x"), DEFAULT_IMAGE_EXTENSIONS));
        assert!(!has_extension(Path::new("x.bmp"), DEFAULT_IMAGE_EXTENSIONS));
    }
}
