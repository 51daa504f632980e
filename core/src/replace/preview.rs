//! Per-document preview of planned replacements

use super::splice::{apply_edits, Edit};
use crate::document::{Document, DocumentId};
use crate::error::SpliceError;
use crate::search::{Approval, Match};
use serde::{Deserialize, Serialize};

/// A document as it would read with every planned replacement applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplacementPreview {
    pub document_id: DocumentId,
    pub document_name: String,
    /// Content the match positions refer to
    pub original_content: String,
    pub preview_content: String,
    pub matches: Vec<Match>,
}

fn edit_for(m: &Match) -> Edit {
    Edit::new(
        m.position,
        m.original_text.len(),
        m.effective_replacement().unwrap_or(&m.original_text),
    )
}

impl ReplacementPreview {
    pub fn new(document: &Document, matches: Vec<Match>) -> Result<Self, SpliceError> {
        let mut preview = Self {
            document_id: document.id,
            document_name: document.name.clone(),
            original_content: document.content.clone(),
            preview_content: String::new(),
            matches,
        };
        preview.recompute()?;
        Ok(preview)
    }

    /// Rebuild `preview_content` from the current replacements
    pub fn recompute(&mut self) -> Result<(), SpliceError> {
        let edits: Vec<Edit> = self.matches.iter().map(edit_for).collect();
        self.preview_content = apply_edits(&self.original_content, &edits)?;
        Ok(())
    }

    /// Edits for the approved matches only
    pub fn approved_edits(&self) -> Vec<Edit> {
        self.matches
            .iter()
            .filter(|m| m.approval == Approval::Approved)
            .map(edit_for)
            .collect()
    }

    pub fn count(&self, approval: Approval) -> usize {
        self.matches.iter().filter(|m| m.approval == approval).count()
    }

    pub fn find_match_mut(&mut self, match_id: &str) -> Option<&mut Match> {
        self.matches.iter_mut().find(|m| m.id == match_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preview() -> ReplacementPreview {
        let document = Document::from_text("a.txt", "cat sat on the cat mat");
        let matches = crate::search::literal_scan(document.id, &document.content, "cat", 50)
            .into_iter()
            .map(|mut m| {
                m.proposed_replacement = Some("dog".to_string());
                m.contextual_replacement = Some("dog".to_string());
                m
            })
            .collect();
        ReplacementPreview::new(&document, matches).unwrap()
    }

    #[test]
    fn test_preview_applies_all_planned_edits() {
        let preview = preview();
        assert_eq!(preview.original_content, "cat sat on the cat mat");
        assert_eq!(preview.preview_content, "dog sat on the dog mat");
    }

    #[test]
    fn test_recompute_after_edit() {
        let mut preview = preview();
        let id = preview.matches[1].id.clone();
        preview.find_match_mut(&id).unwrap().contextual_replacement = Some("rat".to_string());
        preview.recompute().unwrap();
        assert_eq!(preview.preview_content, "dog sat on the rat mat");
    }

    #[test]
    fn test_approved_edits() {
        let mut preview = preview();
        assert!(preview.approved_edits().is_empty());
        assert_eq!(preview.count(Approval::Pending), 2);

        preview.matches[0].approval = Approval::Approved;
        preview.matches[1].approval = Approval::Rejected;
        let edits = preview.approved_edits();
        assert_eq!(edits, vec![Edit::new(0, 3, "dog")]);
        assert_eq!(preview.count(Approval::Rejected), 1);
    }
}
