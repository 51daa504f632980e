//! CLI command implementations

pub mod config;
pub mod documents;
pub mod replace;
pub mod search;

pub use config::config_command;
pub use documents::{
    add_command, clear_command, edit_command, export_command, list_command, remove_command,
    show_command,
};
pub use replace::{replace_command, ReplaceArgs};
pub use search::search_command;

use crate::config::CliSettings;
use crate::output::cli_handler::{CliOutputConfig, CliOutputHandler};
use anyhow::{anyhow, Result};
use docshift_core::{AppState, Document, JsonFileRepository};
use std::sync::Arc;
use tracing::debug;

/// Build the session state for `settings` and load the user's saved documents
pub async fn open_state(settings: &CliSettings) -> Result<AppState> {
    let output = CliOutputHandler::new(CliOutputConfig {
        show_progress: console::Term::stderr().is_term(),
    });

    let mut state = AppState::builder(settings.user.clone())
        .with_engine_config(settings.engine.clone())
        .with_llm_config(settings.llm.clone())
        .with_repository(Arc::new(JsonFileRepository::new(&settings.data_dir)))
        .build_with_output(Arc::new(output))?;

    let count = state.load().await;
    debug!(
        "Loaded {} documents for {} from {}",
        count,
        settings.user,
        settings.data_dir.display()
    );
    Ok(state)
}

/// Resolve a document reference (id, id prefix or name) to an owned copy
pub fn resolve_document(state: &AppState, reference: &str) -> Result<Document> {
    state
        .store()
        .resolve(reference)
        .cloned()
        .ok_or_else(|| anyhow!("No document matches '{}'", reference))
}
