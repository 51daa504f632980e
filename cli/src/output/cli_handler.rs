//! CLI output handler implementation

use async_trait::async_trait;
use colored::Colorize;
use docshift_core::output::{PipelineEvent, PipelineOutput};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Mutex;
use tracing::debug;

/// CLI output configuration
#[derive(Debug, Clone)]
pub struct CliOutputConfig {
    /// Draw progress bars while searching and planning
    pub show_progress: bool,
}

impl Default for CliOutputConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
        }
    }
}

/// CLI output handler that renders pipeline events as progress bars
pub struct CliOutputHandler {
    config: CliOutputConfig,
    /// Bar for the stage currently running
    progress: Mutex<Option<ProgressBar>>,
}

impl CliOutputHandler {
    /// Create a new CLI output handler
    pub fn new(config: CliOutputConfig) -> Self {
        Self {
            config,
            progress: Mutex::new(None),
        }
    }

    fn bar(&self, total: usize, prefix: &str) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }

        let bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::with_template("{prefix:>10.cyan.bold} [{bar:30}] {pos}/{len} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        bar.set_prefix(prefix.to_string());
        bar
    }

    async fn start(&self, total: usize, prefix: &str) {
        let mut progress = self.progress.lock().await;
        if let Some(previous) = progress.take() {
            previous.finish_and_clear();
        }
        *progress = Some(self.bar(total, prefix));
    }

    async fn advance(&self, completed: usize, message: String) {
        if let Some(bar) = self.progress.lock().await.as_ref() {
            bar.set_position(completed as u64);
            bar.set_message(message);
        }
    }

    async fn finish(&self) {
        if let Some(bar) = self.progress.lock().await.take() {
            bar.finish_and_clear();
        }
    }

    /// Print a line without tearing the active bar
    async fn notice(&self, line: String) {
        match self.progress.lock().await.as_ref() {
            Some(bar) if self.config.show_progress => bar.println(line),
            _ => eprintln!("{}", line),
        }
    }
}

impl Default for CliOutputHandler {
    fn default() -> Self {
        Self::new(CliOutputConfig::default())
    }
}

#[async_trait]
impl PipelineOutput for CliOutputHandler {
    async fn emit_event(
        &self,
        event: PipelineEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        match event {
            PipelineEvent::SearchStarted {
                query,
                mode,
                total_documents,
            } => {
                debug!("🔍 Searching {} documents for {:?} ({:?})", total_documents, query, mode);
                self.start(total_documents, "Searching").await;
            }

            PipelineEvent::DocumentSearched {
                document_name,
                completed,
                matches,
                strategy,
                ..
            } => {
                debug!("{}: {} matches ({})", document_name, matches, strategy);
                self.advance(completed, document_name).await;
            }

            PipelineEvent::DelegateFallback {
                document_name,
                reason,
            } => {
                self.notice(format!(
                    "{} {}: {} (using literal matching)",
                    "⚠️ ".yellow(),
                    document_name,
                    reason
                ))
                .await;
            }

            PipelineEvent::SearchCompleted { .. } => {
                self.finish().await;
            }

            PipelineEvent::PlanningStarted {
                total_matches,
                smart,
            } => {
                let prefix = if smart { "Rewriting" } else { "Planning" };
                self.start(total_matches, prefix).await;
            }

            PipelineEvent::ReplacementPlanned {
                document_name,
                completed,
                ..
            } => {
                self.advance(completed, document_name).await;
            }

            PipelineEvent::PlanningCompleted { previews } => {
                debug!("📝 {} previews ready", previews);
                self.finish().await;
            }

            PipelineEvent::ChangesApplied {
                documents_updated,
                edits_applied,
            } => {
                debug!(
                    "✅ {} edits applied to {} documents",
                    edits_applied, documents_updated
                );
            }

            PipelineEvent::ReviewDiscarded => {
                debug!("Review discarded");
            }
        }

        Ok(())
    }
}
