//! Progress events emitted while the pipeline runs
//!
//! Front ends implement [`PipelineOutput`] to show progress (the CLI draws
//! progress bars); library users that don't care pass [`NullOutput`].

use crate::search::{SearchMode, SearchStrategy};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Something the pipeline reports while it works
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    SearchStarted {
        query: String,
        mode: SearchMode,
        total_documents: usize,
    },
    DocumentSearched {
        document_name: String,
        completed: usize,
        total: usize,
        matches: usize,
        strategy: SearchStrategy,
    },
    /// The delegate failed or found nothing; literal scan used instead
    DelegateFallback {
        document_name: String,
        reason: String,
    },
    SearchCompleted {
        total_matches: usize,
        documents_with_matches: usize,
    },
    PlanningStarted {
        total_matches: usize,
        smart: bool,
    },
    ReplacementPlanned {
        document_name: String,
        completed: usize,
        total: usize,
    },
    PlanningCompleted {
        previews: usize,
    },
    ChangesApplied {
        documents_updated: usize,
        edits_applied: usize,
    },
    ReviewDiscarded,
}

/// Receiver of pipeline events
#[async_trait]
pub trait PipelineOutput: Send + Sync {
    async fn emit_event(
        &self,
        event: PipelineEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Discards every event
pub struct NullOutput;

#[async_trait]
impl PipelineOutput for NullOutput {
    async fn emit_event(
        &self,
        _event: PipelineEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

/// Emit an event; a failing output handler never interrupts the pipeline
pub async fn emit(output: &dyn PipelineOutput, event: PipelineEvent) {
    if let Err(e) = output.emit_event(event).await {
        tracing::debug!("Failed to emit pipeline event: {}", e);
    }
}
