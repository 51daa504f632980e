//! Match and search result types

use crate::document::DocumentId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Review decision for one proposed replacement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Approval {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// How the user asked to search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    #[default]
    Literal,
    Semantic,
}

/// Which strategy actually produced a document's matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    Literal,
    Semantic,
    /// Semantic was requested but the literal scan answered
    LiteralFallback,
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchStrategy::Literal => write!(f, "literal"),
            SearchStrategy::Semantic => write!(f, "semantic"),
            SearchStrategy::LiteralFallback => write!(f, "literal fallback"),
        }
    }
}

/// One occurrence of the query inside a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Stable id: document id and byte position
    pub id: String,

    /// The matched text exactly as it appears in the content
    pub original_text: String,

    /// Snippet around the match
    pub context: String,

    /// Byte offset into the content the match was computed from
    pub position: usize,

    /// 1-based line of `position`
    pub line_number: usize,

    pub selected: bool,

    /// Delegate score on a 1-10 scale
    pub relevance: Option<u8>,

    /// Delegate rationale for the match
    pub reason: Option<String>,

    /// Replacement the user asked for
    pub proposed_replacement: Option<String>,

    /// Replacement fitted to the context (equals the proposal outside smart mode)
    pub contextual_replacement: Option<String>,

    /// Delegate note on how the replacement was adjusted
    pub explanation: Option<String>,

    pub approval: Approval,
}

impl Match {
    pub fn new(
        document_id: DocumentId,
        original_text: impl Into<String>,
        context: impl Into<String>,
        position: usize,
        line_number: usize,
    ) -> Self {
        Self {
            id: format!("{}-{}", document_id, position),
            original_text: original_text.into(),
            context: context.into(),
            position,
            line_number,
            selected: true,
            relevance: None,
            reason: None,
            proposed_replacement: None,
            contextual_replacement: None,
            explanation: None,
            approval: Approval::Pending,
        }
    }

    /// Byte offset one past the end of the match
    pub fn end(&self) -> usize {
        self.position + self.original_text.len()
    }

    /// Text that will be spliced in: contextual if planned, else the proposal
    pub fn effective_replacement(&self) -> Option<&str> {
        self.contextual_replacement
            .as_deref()
            .or(self.proposed_replacement.as_deref())
    }
}

/// Matches found in one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub document_id: DocumentId,
    pub document_name: String,
    pub strategy: SearchStrategy,
    pub matches: Vec<Match>,
}

impl SearchResult {
    pub fn selected(&self) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(|m| m.selected)
    }

    pub fn selected_count(&self) -> usize {
        self.selected().count()
    }
}

/// Flip a match's selection across a result set; returns the new state
pub fn toggle_selection(results: &mut [SearchResult], match_id: &str) -> Option<bool> {
    results
        .iter_mut()
        .flat_map(|r| r.matches.iter_mut())
        .find(|m| m.id == match_id)
        .map(|m| {
            m.selected = !m.selected;
            m.selected
        })
}

/// Select or deselect every match
pub fn set_all_selected(results: &mut [SearchResult], selected: bool) {
    for m in results.iter_mut().flat_map(|r| r.matches.iter_mut()) {
        m.selected = selected;
    }
}

/// Total matches across results
pub fn total_matches(results: &[SearchResult]) -> usize {
    results.iter().map(|r| r.matches.len()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> SearchResult {
        let id = DocumentId::new();
        SearchResult {
            document_id: id,
            document_name: "a.txt".to_string(),
            strategy: SearchStrategy::Literal,
            matches: vec![
                Match::new(id, "cat", "the cat sat", 4, 1),
                Match::new(id, "cat", "a cat mat", 20, 2),
            ],
        }
    }

    #[test]
    fn test_match_defaults() {
        let m = &result().matches[0];
        assert!(m.selected);
        assert_eq!(m.approval, Approval::Pending);
        assert_eq!(m.end(), 7);
        assert!(m.effective_replacement().is_none());
    }

    #[test]
    fn test_effective_replacement_prefers_contextual() {
        let mut m = result().matches.remove(0);
        m.proposed_replacement = Some("dog".to_string());
        assert_eq!(m.effective_replacement(), Some("dog"));
        m.contextual_replacement = Some("puppy".to_string());
        assert_eq!(m.effective_replacement(), Some("puppy"));
    }

    #[test]
    fn test_toggle_and_select_all() {
        let mut results = vec![result()];
        let id = results[0].matches[1].id.clone();

        assert_eq!(toggle_selection(&mut results, &id), Some(false));
        assert_eq!(results[0].selected_count(), 1);
        assert_eq!(toggle_selection(&mut results, "missing"), None);

        set_all_selected(&mut results, false);
        assert_eq!(results[0].selected_count(), 0);
        set_all_selected(&mut results, true);
        assert_eq!(results[0].selected_count(), 2);
        assert_eq!(total_matches(&results), 2);
    }
}
