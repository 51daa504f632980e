//! # docshift Core
//!
//! Core library for docshift - find and replace across a set of documents.
//!
//! Documents are searched literally or through an AI delegate, replacements
//! are planned (optionally fitted to each match's context by the delegate),
//! and nothing is written back until a user has approved the edits in a
//! review.

// Core modules
pub mod config;
pub mod document;
pub mod error;
pub mod llm;
pub mod output;
pub mod prompt;
pub mod replace;
pub mod review;
pub mod search;
pub mod state;
pub mod structured;

// Re-export commonly used types
pub use config::{EngineConfig, ModelParams, Protocol, ResolvedLlmConfig};
pub use document::{Document, DocumentId, DocumentStatus, DocumentStore, JsonFileRepository};
pub use error::{Error, Result};
pub use output::{NullOutput, PipelineEvent, PipelineOutput};
pub use replace::{ReplaceOptions, ReplacementPreview};
pub use review::{ReviewGate, ReviewOutcome};
pub use search::{Approval, Match, SearchMode, SearchResult, SearchStrategy};
pub use state::{AppState, AppStateBuilder};

/// Current version of the docshift-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing on stderr.
///
/// `debug` forces the `debug` level; otherwise `RUST_LOG` applies, falling
/// back to `info`.
pub fn init_tracing_with_debug(debug: bool) {
    let filter = if debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
