use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::data::{ImageEntry, ImageKey, Navigation, Outcome, OutcomeCounts};
use super::snapshot::{SessionState, SnapshotLoad};
use crate::error::{AnnotatorError, Result};
use crate::store::{scan_images, LabelStore, ScanReport, DEFAULT_IMAGE_EXTENSIONS};

/// The AnnotationSession owns the working set for one image/label folder pair.
///
/// It holds the ordered image list, the cursor, label text keyed by basename,
/// completion flags and classification counters. The UI only reads from it
/// and forwards user intents to its methods.
pub struct AnnotationSession {
    entries: Vec<ImageEntry>,
    position: usize,
    labels: HashMap<ImageKey, String>,
    label_store: Option<LabelStore>,
    counts: OutcomeCounts,
    navigation: Navigation,
    extensions: Vec<String>,
    image_dir: Option<PathBuf>,
}

impl Default for AnnotationSession {
    fn default() -> Self {
        Self::new(Navigation::default())
    }
}

impl AnnotationSession {
    /// Create an empty session
    pub fn new(navigation: Navigation) -> Self {
        AnnotationSession {
            entries: Vec::new(),
            position: 0,
            labels: HashMap::new(),
            label_store: None,
            counts: OutcomeCounts::default(),
            navigation,
            extensions: DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            image_dir: None,
        }
    }

    /// Replace the extension allow-list used by [`open`](Self::open)
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    // ========== Folders ==========

    /// Scan `dir` and replace the image list with its images.
    ///
    /// The cursor goes back to the first entry. A folder without matching
    /// images (or no folder at all) leaves the session with an empty list.
    pub fn open(&mut self, dir: &Path) -> ScanReport {
        let report = scan_images(dir, self.extensions.as_slice());
        self.entries = report.entries.clone();
        self.position = 0;
        self.image_dir = Some(dir.to_path_buf());
        self.sync_labelled();
        report
    }

    /// Use `dir` for label files and reload every label in it.
    ///
    /// With `create` set a missing folder is created first. The previous
    /// folder's labels are dropped entirely. Returns the number of labels
    /// loaded.
    pub fn set_label_store(&mut self, dir: &Path, create: bool) -> Result<usize> {
        let store = LabelStore::open(dir, create)?;
        self.labels = store.load_all();
        self.label_store = Some(store);
        self.sync_labelled();
        Ok(self.labels.len())
    }

    /// Recompute which entries have non-empty label text in the current folder
    fn sync_labelled(&mut self) {
        for entry in &mut self.entries {
            entry.labelled = self
                .labels
                .get(&entry.key)
                .map(|text| !text.is_empty())
                .unwrap_or(false);
        }
    }

    pub fn image_dir(&self) -> Option<&Path> {
        self.image_dir.as_deref()
    }

    pub fn label_dir(&self) -> Option<&Path> {
        self.label_store.as_ref().map(|store| store.dir())
    }

    // ========== Navigation ==========

    /// Move to the next entry
    pub fn advance(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        if self.position + 1 < self.entries.len() {
            self.position += 1;
        } else if self.navigation == Navigation::Wrap {
            self.position = 0;
        }
    }

    /// Move to the previous entry
    pub fn retreat(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        if self.position > 0 {
            self.position -= 1;
        } else if self.navigation == Navigation::Wrap {
            self.position = self.entries.len() - 1;
        }
    }

    /// Select an entry directly, returns false if `index` is out of range
    pub fn jump_to(&mut self, index: usize) -> bool {
        if index < self.entries.len() {
            self.position = index;
            true
        } else {
            false
        }
    }

    // ========== Read-outs ==========

    pub fn entries(&self) -> &[ImageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cursor index (0 when the list is empty)
    pub fn position(&self) -> usize {
        self.position
    }

    /// Entry under the cursor, `None` when the list is empty
    pub fn current(&self) -> Option<&ImageEntry> {
        self.entries.get(self.position)
    }

    /// Label text of the current entry; empty when there is none
    pub fn current_label(&self) -> &str {
        self.current()
            .and_then(|entry| self.labels.get(&entry.key))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn counts(&self) -> OutcomeCounts {
        self.counts
    }

    pub fn completed_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_completed()).count()
    }

    /// Completed entries over total entries, 0 for an empty list
    pub fn completion_fraction(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        self.completed_count() as f64 / self.entries.len() as f64
    }

    // ========== Edits ==========

    /// Write `text` as the label of the current entry and mark it completed
    pub fn commit_label(&mut self, text: &str) -> Result<()> {
        let store = self.label_store.as_ref().ok_or(AnnotatorError::NoLabelStore)?;
        let entry = self
            .entries
            .get_mut(self.position)
            .ok_or(AnnotatorError::NoCurrentEntry)?;

        store.write(&entry.key, text)?;
        self.labels.insert(entry.key.clone(), text.to_string());
        entry.labelled = !text.is_empty();
        entry.completed = true;
        Ok(())
    }

    /// Count `outcome`, mark the current entry completed, then move on.
    ///
    /// Returns false (and changes nothing) when there is no current entry.
    pub fn classify(&mut self, outcome: Outcome) -> bool {
        let Some(entry) = self.entries.get_mut(self.position) else {
            return false;
        };

        self.counts.record(outcome);
        entry.completed = true;
        self.advance();
        true
    }

    /// Delete the current image and its label from disk and from the list.
    ///
    /// Files already gone are ignored. Once the image file is gone the entry
    /// leaves the list even if removing its label fails; that failure is
    /// still returned. Returns the removed entry, or `None` when the list
    /// was empty.
    pub fn delete_current(&mut self) -> Result<Option<ImageEntry>> {
        let Some(entry) = self.entries.get(self.position) else {
            return Ok(None);
        };

        match fs::remove_file(&entry.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %entry.path.display(), "image already gone");
            }
            Err(e) => return Err(AnnotatorError::io(&entry.path, e)),
        }

        let removed = self.entries.remove(self.position);
        self.labels.remove(&removed.key);
        if self.position >= self.entries.len() {
            self.position = self.entries.len().saturating_sub(1);
        }
        info!(path = %removed.path.display(), remaining = self.entries.len(), "image deleted");

        if let Some(store) = &self.label_store {
            store.remove(&removed.key)?;
        }
        Ok(Some(removed))
    }

    // ========== Snapshot ==========

    /// Copy the persistable fields out of the session
    pub fn snapshot(&self) -> SessionState {
        SessionState {
            ok_count: self.counts.ok,
            not_ok_count: self.counts.not_ok,
            completed_images: self
                .entries
                .iter()
                .filter(|entry| entry.is_completed())
                .map(|entry| entry.key.to_string())
                .collect(),
            image_paths: self.entries.iter().map(|entry| entry.path.clone()).collect(),
            current_index: self.position,
        }
    }

    /// Replace the image list, cursor, counters and completion with `state`.
    ///
    /// The cursor is clamped into range and completed basenames that match
    /// no image are dropped.
    pub fn restore(&mut self, state: SessionState) {
        let completed: HashSet<String> = state.completed_images.into_iter().collect();
        let mut seen: HashSet<ImageKey> = HashSet::new();

        self.entries = state
            .image_paths
            .into_iter()
            .filter_map(ImageEntry::from_path)
            .filter(|entry| seen.insert(entry.key.clone()))
            .map(|mut entry| {
                entry.completed = completed.contains(entry.key.as_str());
                entry
            })
            .collect();
        self.position = state
            .current_index
            .min(self.entries.len().saturating_sub(1));
        self.counts = OutcomeCounts {
            ok: state.ok_count,
            not_ok: state.not_ok_count,
        };
        self.image_dir = self
            .entries
            .first()
            .and_then(|entry| entry.path.parent())
            .map(Path::to_path_buf);
        self.sync_labelled();
    }

    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        self.snapshot().save(path)
    }

    /// Load the snapshot at `path` into the session.
    ///
    /// A missing or malformed snapshot resets the session to an empty state;
    /// the returned outcome tells the two cases apart.
    pub fn load_snapshot(&mut self, path: &Path) -> SnapshotLoad {
        let outcome = SessionState::load(path);
        self.restore(outcome.clone().into_state());
        outcome
    }
}

impl std::fmt::Debug for AnnotationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationSession")
            .field("images", &self.entries.len())
            .field("position", &self.position)
            .field("label_dir", &self.label_dir())
            .field("counts", &self.counts)
            .finish()
    }
}
