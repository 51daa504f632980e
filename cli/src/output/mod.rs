//! CLI-specific output implementations
//!
//! Progress reporting for pipeline events and plain-text rendering of
//! documents, search results and previews.

pub mod cli_handler;
pub mod display;
