//! Human review of planned replacements before they touch any document

pub mod gate;

pub use gate::{ReviewGate, ReviewOutcome};
