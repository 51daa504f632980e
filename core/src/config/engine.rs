//! Tunable constants for matching and replacement planning

use serde::{Deserialize, Serialize};

/// Content produced by the extractor when a file could not be turned into text
pub const EXTRACTION_FAILED_SENTINEL: &str = "[docshift] Text extraction failed";

/// Heuristics used by the matcher and planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Delegate candidates scoring below this (1-10 scale) are discarded
    pub relevance_threshold: u8,

    /// Characters of context kept on each side of a match
    pub context_radius: usize,

    /// Documents with less trimmed content than this are not searchable
    pub min_searchable_len: usize,

    /// Phrases marking content that came from a failed extraction
    pub failure_sentinels: Vec<String>,

    /// Upper bound on delegate candidates accepted per document
    pub max_candidates_per_document: usize,

    /// Largest embedded JSON fragment the decoder will attempt to parse
    pub max_json_fragment_bytes: usize,

    /// Output token bound for the semantic search call
    pub search_max_tokens: u32,

    /// Output token bound for each contextual replacement call
    pub replace_max_tokens: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: 6,
            context_radius: 50,
            min_searchable_len: 20,
            failure_sentinels: vec![
                EXTRACTION_FAILED_SENTINEL.to_string(),
                "Text extraction failed".to_string(),
                "Could not extract text".to_string(),
            ],
            max_candidates_per_document: 50,
            max_json_fragment_bytes: 256 * 1024,
            search_max_tokens: 2000,
            replace_max_tokens: 500,
        }
    }
}

impl EngineConfig {
    /// Whether a document's content can be searched at all
    pub fn is_searchable(&self, content: &str) -> bool {
        if content.trim().chars().count() < self.min_searchable_len {
            return false;
        }
        !self
            .failure_sentinels
            .iter()
            .any(|sentinel| content.contains(sentinel.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.relevance_threshold, 6);
        assert_eq!(config.min_searchable_len, 20);
    }

    #[test]
    fn test_short_content_not_searchable() {
        let config = EngineConfig::default();
        assert!(!config.is_searchable("too short"));
        assert!(!config.is_searchable("   padded but short       "));
        assert!(config.is_searchable("this sentence is comfortably long enough"));
    }

    #[test]
    fn test_sentinel_content_not_searchable() {
        let config = EngineConfig::default();
        let content = format!("{} for report.pdf (unsupported type)", EXTRACTION_FAILED_SENTINEL);
        assert!(!config.is_searchable(&content));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"relevance_threshold": 8}"#).unwrap();
        assert_eq!(config.relevance_threshold, 8);
        assert_eq!(config.context_radius, 50);
    }
}
