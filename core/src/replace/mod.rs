//! Planning replacements and splicing them into content

pub mod planner;
pub mod preview;
pub mod splice;

pub use planner::{Planner, ReplaceOptions};
pub use preview::ReplacementPreview;
pub use splice::{apply_edits, check_original, Edit};
