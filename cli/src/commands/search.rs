//! Search command

use super::open_state;
use crate::config::CliSettings;
use crate::output::display::print_results;
use anyhow::Result;
use docshift_core::SearchMode;

pub async fn search_command(settings: &CliSettings, query: &str, smart: bool) -> Result<()> {
    let mut state = open_state(settings).await?;
    let mode = if smart {
        SearchMode::Semantic
    } else {
        SearchMode::Literal
    };

    state.search(query, mode).await?;
    print_results(state.store(), state.results(), query);
    Ok(())
}
