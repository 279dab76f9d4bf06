/// Filesystem collaborators of the annotation session
///
/// This module handles:
/// - Scanning an image folder by extension (scanner.rs)
/// - Reading and writing one label text file per image (labels.rs)

pub mod labels;
pub mod scanner;

pub use labels::LabelStore;
pub use scanner::{scan_images, ScanReport, DEFAULT_IMAGE_EXTENSIONS};
