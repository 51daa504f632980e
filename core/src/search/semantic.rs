//! Delegated semantic scan
//!
//! The delegate reads the whole document and proposes scored passages. Its
//! positions are never trusted: every accepted passage is located again by a
//! literal scan of the content.

use super::literal::{context_window, find_spans, line_number_at};
use super::Match;
use crate::config::EngineConfig;
use crate::document::Document;
use crate::error::Result;
use crate::llm::{generate_text, LlmClient};
use crate::prompt::PromptRenderer;
use crate::structured::extract_json_array;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// One passage proposed by the delegate
#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub text: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub relevance: f64,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Decode the delegate reply; anything unparsable is an empty list.
///
/// Elements are decoded one at a time, so a malformed candidate is dropped
/// without taking the rest of the array with it.
pub fn parse_candidates(reply: &str, config: &EngineConfig) -> Vec<Candidate> {
    let elements: Vec<Value> =
        extract_json_array(reply, config.max_json_fragment_bytes).unwrap_or_default();

    elements
        .into_iter()
        .filter_map(|element| match serde_json::from_value::<Candidate>(element) {
            Ok(candidate) => Some(candidate),
            Err(e) => {
                debug!("Dropping malformed candidate: {}", e);
                None
            }
        })
        .collect()
}

fn score(relevance: f64) -> u8 {
    relevance.round().clamp(1.0, 10.0) as u8
}

/// Filter candidates by relevance and pin each to a real span of `document`.
///
/// A candidate whose text is absent from the document is dropped. Candidates
/// that would overlap an accepted span take the next free occurrence.
pub fn accept_candidates(
    document: &Document,
    candidates: Vec<Candidate>,
    config: &EngineConfig,
) -> Vec<Match> {
    let content = &document.content;
    let mut taken: Vec<(usize, usize)> = Vec::new();
    let mut matches = Vec::new();

    for candidate in candidates {
        if matches.len() >= config.max_candidates_per_document {
            debug!(
                "Candidate limit {} reached for {}",
                config.max_candidates_per_document, document.name
            );
            break;
        }

        if candidate.relevance < f64::from(config.relevance_threshold) {
            debug!(
                "Dropping {:?} in {}: relevance {} below {}",
                candidate.text, document.name, candidate.relevance, config.relevance_threshold
            );
            continue;
        }

        let text = candidate.text.trim();
        let span = find_spans(content, text)
            .into_iter()
            .find(|&(start, end)| taken.iter().all(|&(s, e)| end <= s || start >= e));

        let Some((start, end)) = span else {
            debug!(
                "Dropping {:?} in {}: not found in content",
                text, document.name
            );
            continue;
        };

        taken.push((start, end));
        let mut m = Match::new(
            document.id,
            &content[start..end],
            context_window(content, start, end, config.context_radius),
            start,
            line_number_at(content, start),
        );
        m.relevance = Some(score(candidate.relevance));
        m.reason = candidate.reason.filter(|r| !r.trim().is_empty());
        matches.push(m);
    }

    matches
}

/// Ask the delegate for matches in one document.
///
/// Errors only when the delegate call itself fails. An unparsable reply or
/// one with no acceptable candidates is `Ok(vec![])`.
pub async fn semantic_scan(
    client: &dyn LlmClient,
    prompts: &PromptRenderer,
    document: &Document,
    query: &str,
    config: &EngineConfig,
) -> Result<Vec<Match>> {
    let prompt = prompts.semantic_search(query, &document.name, &document.content)?;
    let reply = generate_text(client, &prompt, config.search_max_tokens).await?;

    let candidates = parse_candidates(&reply, config);
    debug!(
        "{} proposed {} candidates for {}",
        client.provider_name(),
        candidates.len(),
        document.name
    );

    Ok(accept_candidates(document, candidates, config))
}
