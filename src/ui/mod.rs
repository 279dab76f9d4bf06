/// Presentation helpers that do not depend on a widget tree
pub mod preview;
