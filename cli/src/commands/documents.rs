//! Document management commands

use super::{open_state, resolve_document};
use crate::config::CliSettings;
use crate::output::display::{print_document, print_document_table};
use anyhow::{bail, Context, Result};
use colored::Colorize;
use docshift_core::DocumentStatus;
use std::path::{Path, PathBuf};
use tracing::info;

/// Extract files (or directories of files) and add them to the store
pub async fn add_command(settings: &CliSettings, paths: &[PathBuf]) -> Result<()> {
    let mut state = open_state(settings).await?;

    let mut added = 0;
    for path in paths {
        let documents = state
            .ingest_path(path)
            .await
            .with_context(|| format!("Failed to add {}", path.display()))?;

        for document in &documents {
            match document.status {
                DocumentStatus::Ready => println!(
                    "{} Added {} ({} words)",
                    "✓".green(),
                    document.name,
                    document.word_count()
                ),
                _ => println!(
                    "{} Added {} (no text could be extracted)",
                    "!".yellow(),
                    document.name
                ),
            }
        }
        added += documents.len();
    }

    if !state.persistence_enabled() {
        eprintln!(
            "{} saved documents could not be read; this change was not saved",
            "warning:".yellow()
        );
    }
    println!("{} documents added", added);
    Ok(())
}

pub async fn list_command(settings: &CliSettings) -> Result<()> {
    let state = open_state(settings).await?;
    print_document_table(state.documents());
    Ok(())
}

pub async fn show_command(settings: &CliSettings, reference: &str) -> Result<()> {
    let state = open_state(settings).await?;
    let document = resolve_document(&state, reference)?;
    print_document(&document);
    Ok(())
}

/// Write a document's current text to a file
pub async fn export_command(settings: &CliSettings, reference: &str, output: &Path) -> Result<()> {
    let state = open_state(settings).await?;
    let document = resolve_document(&state, reference)?;

    tokio::fs::write(output, &document.content)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Exported {} to {}", document.name, output.display());
    Ok(())
}

/// Replace a document's text with the contents of a file
pub async fn edit_command(settings: &CliSettings, reference: &str, from_file: &Path) -> Result<()> {
    let mut state = open_state(settings).await?;
    let document = resolve_document(&state, reference)?;

    let content = tokio::fs::read_to_string(from_file)
        .await
        .with_context(|| format!("Failed to read {}", from_file.display()))?;
    state.edit_content(document.id, content).await?;

    info!("Updated content of {}", document.name);
    println!("Updated {}", document.name);
    Ok(())
}

pub async fn remove_command(settings: &CliSettings, reference: &str) -> Result<()> {
    let mut state = open_state(settings).await?;
    let document = resolve_document(&state, reference)?;

    let removed = state.remove_document(document.id).await?;
    println!("Removed {}", removed.name);
    Ok(())
}

pub async fn clear_command(settings: &CliSettings, yes: bool) -> Result<()> {
    let mut state = open_state(settings).await?;
    if state.documents().is_empty() {
        println!("No documents loaded");
        return Ok(());
    }

    if !yes {
        if !console::Term::stdout().is_term() {
            bail!("Refusing to clear documents without confirmation; pass --yes");
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("Remove all {} documents?", state.documents().len()))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Nothing removed");
            return Ok(());
        }
    }

    let count = state.clear_documents().await;
    println!("Removed {} documents", count);
    Ok(())
}
