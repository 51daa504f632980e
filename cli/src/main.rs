//! # docshift CLI
//!
//! Command-line interface for docshift - find and replace across many
//! documents, with an AI delegate for semantic search and context-aware
//! rewrites, and a review step before anything is written.
//!
//! ## Usage
//!
//! - `docshift add notes/` - Add files or directories
//! - `docshift search "quarterly report"` - Literal search
//! - `docshift search --smart "budget concerns"` - Semantic search
//! - `docshift replace cat dog` - Plan, review and apply replacements

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod output;

use commands::{
    add_command, clear_command, config_command, edit_command, export_command, list_command,
    remove_command, replace_command, search_command, show_command, ReplaceArgs,
};
use config::CliConfigLoader;

/// docshift - find and replace across documents, reviewed before applied
#[derive(Parser)]
#[command(name = "docshift")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Find and replace across many documents, with AI-assisted search and review before apply")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file or directory path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Protocol to use (openai, anthropic, google_ai, azure_openai)
    #[arg(long, global = true)]
    protocol: Option<String>,

    /// API key override
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Base URL override
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Model name override
    #[arg(long, global = true)]
    model: Option<String>,

    /// User whose documents are loaded and saved
    #[arg(short, long, global = true, env = "DOCSHIFT_USER")]
    user: Option<String>,

    /// Directory documents are saved in
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add files or directories of files
    Add {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// List documents
    List,

    /// Show a document's details and text
    Show {
        /// Document id, id prefix or name
        document: String,
    },

    /// Write a document's text to a file
    Export {
        document: String,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Replace a document's text with the contents of a file
    Edit {
        document: String,
        #[arg(long)]
        from_file: PathBuf,
    },

    /// Remove a document
    Remove { document: String },

    /// Remove every document
    Clear {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Search documents
    Search {
        query: String,
        /// Let the model find semantically related passages
        #[arg(long)]
        smart: bool,
    },

    /// Search, plan replacements, review and apply them
    Replace {
        query: String,
        replacement: String,
        /// Find matches with semantic search
        #[arg(long)]
        smart_search: bool,
        /// Fit each replacement to its context with the model
        #[arg(long)]
        smart: bool,
        /// Keep the surrounding sentence structure (with --smart)
        #[arg(long)]
        preserve_structure: bool,
        /// Match tense and grammatical form (with --smart)
        #[arg(long)]
        preserve_tense: bool,
        /// Approve every replacement without asking
        #[arg(short, long, conflicts_with = "dry_run")]
        yes: bool,
        /// Show the previews and write nothing
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the resolved configuration
    Config,
}

/// Build a configuration loader from CLI arguments
fn build_config_loader(cli: &Cli) -> CliConfigLoader {
    let mut loader = CliConfigLoader::new();

    if let Some(config_path) = &cli.config {
        loader = loader.with_config_override(config_path.clone());
    }

    if let Some(protocol) = &cli.protocol {
        loader = loader.with_protocol_override(protocol.clone());
    }

    if let Some(api_key) = &cli.api_key {
        loader = loader.with_api_key_override(api_key.clone());
    }

    if let Some(base_url) = &cli.base_url {
        loader = loader.with_base_url_override(base_url.clone());
    }

    if let Some(model) = &cli.model {
        loader = loader.with_model_override(model.clone());
    }

    if let Some(user) = &cli.user {
        loader = loader.with_user_override(user.clone());
    }

    if let Some(data_dir) = &cli.data_dir {
        loader = loader.with_data_dir_override(data_dir.clone());
    }

    loader
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    docshift_core::init_tracing_with_debug(cli.verbose);

    if !console::Term::stdout().is_term() {
        colored::control::set_override(false);
    }

    let settings = build_config_loader(&cli).load().await?;

    match cli.command {
        Commands::Add { paths } => add_command(&settings, &paths).await,
        Commands::List => list_command(&settings).await,
        Commands::Show { document } => show_command(&settings, &document).await,
        Commands::Export { document, output } => {
            export_command(&settings, &document, &output).await
        }
        Commands::Edit {
            document,
            from_file,
        } => edit_command(&settings, &document, &from_file).await,
        Commands::Remove { document } => remove_command(&settings, &document).await,
        Commands::Clear { yes } => clear_command(&settings, yes).await,
        Commands::Search { query, smart } => search_command(&settings, &query, smart).await,
        Commands::Replace {
            query,
            replacement,
            smart_search,
            smart,
            preserve_structure,
            preserve_tense,
            yes,
            dry_run,
        } => {
            let args = ReplaceArgs {
                query,
                replacement,
                smart_search,
                smart,
                preserve_structure,
                preserve_tense,
                yes,
                dry_run,
            };
            replace_command(&settings, &args).await
        }
        Commands::Config => config_command(&settings).await,
    }
}
