//! Show the resolved configuration

use crate::config::CliSettings;
use anyhow::Result;
use colored::Colorize;

pub async fn config_command(settings: &CliSettings) -> Result<()> {
    println!("{} {}", "Source:".bold(), settings.source);
    println!("{} {}", "User:".bold(), settings.user);
    println!("{} {}", "Data dir:".bold(), settings.data_dir.display());

    match &settings.llm {
        Some(llm) => {
            println!("{} {}", "Protocol:".bold(), llm.protocol.as_str());
            println!("{} {}", "Model:".bold(), llm.model);
            println!("{} {}", "Base URL:".bold(), llm.base_url);
            println!("{} {}", "API key:".bold(), llm.masked_api_key());
        }
        None => println!(
            "{} none configured (literal search and replacement only)",
            "Model:".bold()
        ),
    }

    println!("{}", "Engine:".bold());
    println!("{}", serde_json::to_string_pretty(&settings.engine)?);
    Ok(())
}
