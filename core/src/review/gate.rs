//! Review/apply gate
//!
//! Holds the previews produced by the planner while the user approves or
//! rejects each proposed replacement. Closing the review splices the approved
//! replacements into the store; nothing else ever writes planned edits.

use crate::document::{DocumentId, DocumentStore};
use crate::error::{Result, ValidationError};
use crate::replace::{apply_edits, check_original, ReplacementPreview};
use crate::search::Approval;
use serde::{Deserialize, Serialize};
use std::mem;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
enum ReviewState {
    #[default]
    Idle,
    Reviewing {
        previews: Vec<ReplacementPreview>,
        cursor: usize,
    },
}

/// What closing a review changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub documents_updated: usize,
    pub edits_applied: usize,
    /// Names of documents with approved edits that could not be applied
    pub skipped_documents: Vec<String>,
}

impl ReviewOutcome {
    pub fn changed(&self) -> bool {
        self.documents_updated > 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReviewGate {
    state: ReviewState,
}

impl ReviewGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, ReviewState::Reviewing { .. })
    }

    /// Start reviewing; every match begins `Pending`
    pub fn open(&mut self, mut previews: Vec<ReplacementPreview>) -> Result<()> {
        if self.is_open() {
            return Err(ValidationError::ReviewInProgress.into());
        }
        if previews.is_empty() {
            return Err(ValidationError::NoSelection.into());
        }

        for m in previews.iter_mut().flat_map(|p| p.matches.iter_mut()) {
            m.approval = Approval::Pending;
        }
        debug!("Review opened with {} previews", previews.len());
        self.state = ReviewState::Reviewing {
            previews,
            cursor: 0,
        };
        Ok(())
    }

    /// Open previews; empty when idle
    pub fn previews(&self) -> &[ReplacementPreview] {
        match &self.state {
            ReviewState::Idle => &[],
            ReviewState::Reviewing { previews, .. } => previews.as_slice(),
        }
    }

    fn previews_mut(&mut self) -> Result<&mut Vec<ReplacementPreview>> {
        match &mut self.state {
            ReviewState::Idle => Err(ValidationError::NoReviewOpen.into()),
            ReviewState::Reviewing { previews, .. } => Ok(previews),
        }
    }

    pub fn cursor(&self) -> Option<usize> {
        match self.state {
            ReviewState::Idle => None,
            ReviewState::Reviewing { cursor, .. } => Some(cursor),
        }
    }

    pub fn current(&self) -> Option<&ReplacementPreview> {
        self.cursor().and_then(|cursor| self.previews().get(cursor))
    }

    /// Move to the next preview, staying on the last one
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&ReplacementPreview> {
        if let ReviewState::Reviewing { previews, cursor } = &mut self.state {
            if *cursor + 1 < previews.len() {
                *cursor += 1;
            }
        }
        self.current()
    }

    /// Move to the previous preview, staying on the first one
    pub fn previous(&mut self) -> Option<&ReplacementPreview> {
        if let ReviewState::Reviewing { cursor, .. } = &mut self.state {
            *cursor = cursor.saturating_sub(1);
        }
        self.current()
    }

    /// Jump to a preview by index; out of range leaves the cursor in place
    pub fn go_to(&mut self, index: usize) -> Option<&ReplacementPreview> {
        match &mut self.state {
            ReviewState::Reviewing { previews, cursor } if index < previews.len() => {
                *cursor = index;
            }
            _ => return None,
        }
        self.current()
    }

    pub fn set_approval(&mut self, match_id: &str, approval: Approval) -> Result<()> {
        let m = self
            .previews_mut()?
            .iter_mut()
            .find_map(|p| p.find_match_mut(match_id))
            .ok_or_else(|| ValidationError::UnknownMatch {
                id: match_id.to_string(),
            })?;
        m.approval = approval;
        Ok(())
    }

    pub fn approve(&mut self, match_id: &str) -> Result<()> {
        self.set_approval(match_id, Approval::Approved)
    }

    pub fn reject(&mut self, match_id: &str) -> Result<()> {
        self.set_approval(match_id, Approval::Rejected)
    }

    /// Set every match of every preview; returns how many matches were set
    pub fn set_all(&mut self, approval: Approval) -> Result<usize> {
        let mut count = 0;
        for m in self.previews_mut()?.iter_mut().flat_map(|p| p.matches.iter_mut()) {
            m.approval = approval;
            count += 1;
        }
        Ok(count)
    }

    pub fn approve_all(&mut self) -> Result<usize> {
        self.set_all(Approval::Approved)
    }

    pub fn reject_all(&mut self) -> Result<usize> {
        self.set_all(Approval::Rejected)
    }

    /// Set every match of one document's preview
    pub fn set_document(&mut self, document_id: DocumentId, approval: Approval) -> Result<usize> {
        let preview = self
            .previews_mut()?
            .iter_mut()
            .find(|p| p.document_id == document_id)
            .ok_or_else(|| ValidationError::UnknownDocument {
                id: document_id.to_string(),
            })?;
        for m in &mut preview.matches {
            m.approval = approval;
        }
        Ok(preview.matches.len())
    }

    /// Replace the text a match will receive and refresh its preview
    pub fn edit_replacement(&mut self, match_id: &str, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyReplacement.into());
        }

        let preview = self
            .previews_mut()?
            .iter_mut()
            .find(|p| p.matches.iter().any(|m| m.id == match_id))
            .ok_or_else(|| ValidationError::UnknownMatch {
                id: match_id.to_string(),
            })?;

        if let Some(m) = preview.find_match_mut(match_id) {
            m.contextual_replacement = Some(text.to_string());
            m.explanation = None;
        }
        preview.recompute()?;
        Ok(())
    }

    /// Approved, rejected and pending counts across the review
    pub fn tally(&self) -> (usize, usize, usize) {
        self.previews().iter().fold((0, 0, 0), |(a, r, p), preview| {
            (
                a + preview.count(Approval::Approved),
                r + preview.count(Approval::Rejected),
                p + preview.count(Approval::Pending),
            )
        })
    }

    /// Discard the review without touching any document
    pub fn cancel(&mut self) -> Result<usize> {
        match mem::take(&mut self.state) {
            ReviewState::Idle => Err(ValidationError::NoReviewOpen.into()),
            ReviewState::Reviewing { previews, .. } => {
                info!("Review discarded ({} previews)", previews.len());
                Ok(previews.len())
            }
        }
    }

    /// End the review, splicing approved replacements into `store`.
    ///
    /// A document that was removed, or whose content changed since planning,
    /// is skipped and reported. The gate is idle afterwards in every case.
    pub fn close(&mut self, store: &mut DocumentStore) -> Result<ReviewOutcome> {
        let previews = match mem::take(&mut self.state) {
            ReviewState::Idle => return Err(ValidationError::NoReviewOpen.into()),
            ReviewState::Reviewing { previews, .. } => previews,
        };

        let mut outcome = ReviewOutcome::default();
        for preview in &previews {
            let edits = preview.approved_edits();
            if edits.is_empty() {
                continue;
            }

            let Some(document) = store.get(preview.document_id) else {
                warn!("Not applying to {}: document was removed", preview.document_name);
                outcome.skipped_documents.push(preview.document_name.clone());
                continue;
            };

            let fresh = document.content == preview.original_content
                || preview
                    .matches
                    .iter()
                    .filter(|m| m.approval == Approval::Approved)
                    .all(|m| check_original(&document.content, m.position, &m.original_text).is_ok());
            if !fresh {
                warn!("Not applying to {}: content changed since planning", document.name);
                outcome.skipped_documents.push(preview.document_name.clone());
                continue;
            }

            match apply_edits(&document.content, &edits) {
                Ok(updated) => {
                    store.update_content(preview.document_id, updated);
                    outcome.documents_updated += 1;
                    outcome.edits_applied += edits.len();
                    debug!("Applied {} edits to {}", edits.len(), preview.document_name);
                }
                Err(e) => {
                    warn!("Not applying to {}: {}", preview.document_name, e);
                    outcome.skipped_documents.push(preview.document_name.clone());
                }
            }
        }

        info!(
            "Review closed: {} edits applied to {} documents",
            outcome.edits_applied, outcome.documents_updated
        );
        Ok(outcome)
    }
}
