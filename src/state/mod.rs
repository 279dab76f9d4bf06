/// State management module
///
/// This module handles all application state, including:
/// - The annotation session and its operations (session.rs)
/// - Shared data structures (data.rs)
/// - The persisted session snapshot (snapshot.rs)

pub mod data;
pub mod session;
pub mod snapshot;

pub use data::Outcome;
pub use session::AnnotationSession;
pub use snapshot::{DefaultReason, SnapshotLoad};
