//! Application state
//!
//! [`AppState`] owns everything one user session works with: the document
//! store, the last search, the review gate and the collaborators. Every
//! mutating operation takes `&mut self`, so two operations can never
//! interleave on the same state.

use crate::config::{EngineConfig, ResolvedLlmConfig};
use crate::document::{ingest_path, Document, DocumentId, DocumentRepository, DocumentStore};
use crate::error::{Result, ValidationError};
use crate::llm::{create_client, LlmClient};
use crate::output::{emit, NullOutput, PipelineEvent, PipelineOutput};
use crate::replace::{Planner, ReplaceOptions};
use crate::review::{ReviewGate, ReviewOutcome};
use crate::search::{self, Matcher, SearchMode, SearchResult};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builder for [`AppState`]
pub struct AppStateBuilder {
    user: String,
    engine_config: EngineConfig,
    llm_config: Option<ResolvedLlmConfig>,
    delegate: Option<Arc<dyn LlmClient>>,
    repository: Option<Arc<dyn DocumentRepository>>,
}

impl AppStateBuilder {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            engine_config: EngineConfig::default(),
            llm_config: None,
            delegate: None,
            repository: None,
        }
    }

    pub fn with_engine_config(mut self, engine_config: EngineConfig) -> Self {
        self.engine_config = engine_config;
        self
    }

    /// Create the delegate from a resolved model configuration at build time
    pub fn with_llm_config(mut self, llm_config: Option<ResolvedLlmConfig>) -> Self {
        self.llm_config = llm_config;
        self
    }

    /// Use an existing delegate; takes precedence over `with_llm_config`
    pub fn with_delegate(mut self, delegate: Arc<dyn LlmClient>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    pub fn with_repository(mut self, repository: Arc<dyn DocumentRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn build_with_output(self, output: Arc<dyn PipelineOutput>) -> Result<AppState> {
        let delegate = match (self.delegate, &self.llm_config) {
            (Some(delegate), _) => Some(delegate),
            (None, Some(llm_config)) => Some(create_client(llm_config)?),
            (None, None) => None,
        };

        Ok(AppState {
            user: self.user,
            store: DocumentStore::new(),
            results: Vec::new(),
            last_query: None,
            gate: ReviewGate::new(),
            matcher: Matcher::new(self.engine_config.clone(), delegate.clone())?,
            planner: Planner::new(self.engine_config.clone(), delegate.clone())?,
            delegate,
            repository: self.repository,
            persist_enabled: true,
            engine_config: self.engine_config,
            output,
        })
    }

    /// Build with progress events discarded
    pub fn build(self) -> Result<AppState> {
        self.build_with_output(Arc::new(NullOutput))
    }
}

pub struct AppState {
    user: String,
    store: DocumentStore,
    results: Vec<SearchResult>,
    last_query: Option<String>,
    gate: ReviewGate,
    matcher: Matcher,
    planner: Planner,
    delegate: Option<Arc<dyn LlmClient>>,
    repository: Option<Arc<dyn DocumentRepository>>,
    /// Cleared when the saved list could not be read, so it is never overwritten
    persist_enabled: bool,
    engine_config: EngineConfig,
    output: Arc<dyn PipelineOutput>,
}

impl AppState {
    pub fn builder(user: impl Into<String>) -> AppStateBuilder {
        AppStateBuilder::new(user)
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn documents(&self) -> &[Document] {
        self.store.documents()
    }

    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine_config
    }

    pub fn delegate(&self) -> Option<&Arc<dyn LlmClient>> {
        self.delegate.as_ref()
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    pub fn review(&self) -> &ReviewGate {
        &self.gate
    }

    pub fn review_mut(&mut self) -> &mut ReviewGate {
        &mut self.gate
    }

    /// Replace the store with the saved documents.
    ///
    /// An unreadable save is logged and the session starts empty with
    /// persistence switched off.
    pub async fn load(&mut self) -> usize {
        let Some(repository) = &self.repository else {
            return 0;
        };

        match repository.load(&self.user).await {
            Ok(documents) => {
                let count = documents.len();
                self.store = DocumentStore::from_documents(documents);
                self.results.clear();
                debug!("Loaded {} documents for {}", count, self.user);
                count
            }
            Err(e) => {
                warn!(
                    "Could not load saved documents for {}: {}; starting empty, changes will not be saved",
                    self.user, e
                );
                self.persist_enabled = false;
                self.store = DocumentStore::new();
                0
            }
        }
    }

    pub fn persistence_enabled(&self) -> bool {
        self.repository.is_some() && self.persist_enabled
    }

    /// Save the whole document list. Failures are logged; memory stays authoritative.
    pub async fn persist(&self) {
        if !self.persist_enabled {
            return;
        }
        let Some(repository) = &self.repository else {
            return;
        };

        if let Err(e) = repository.save(&self.user, self.store.documents()).await {
            warn!("Could not save documents for {}: {}", self.user, e);
        }
    }

    /// Forget search results that point into `id`
    fn drop_results_for(&mut self, id: DocumentId) {
        self.results.retain(|r| r.document_id != id);
    }

    pub async fn add_document(&mut self, document: Document) -> DocumentId {
        let id = document.id;
        self.drop_results_for(id);
        self.store.insert(document);
        self.persist().await;
        id
    }

    /// Extract a file or directory and add every document found
    pub async fn ingest_path(&mut self, path: &Path) -> Result<Vec<Document>> {
        let documents = ingest_path(path).await?;
        for document in &documents {
            self.store.insert(document.clone());
        }
        info!("Added {} documents from {}", documents.len(), path.display());
        self.persist().await;
        Ok(documents)
    }

    pub async fn remove_document(&mut self, id: DocumentId) -> Result<Document> {
        let removed = self
            .store
            .remove(id)
            .ok_or_else(|| ValidationError::UnknownDocument { id: id.to_string() })?;
        self.drop_results_for(id);
        self.persist().await;
        Ok(removed)
    }

    pub async fn clear_documents(&mut self) -> usize {
        let count = self.store.len();
        self.store.clear();
        self.results.clear();
        self.persist().await;
        count
    }

    /// Overwrite a document's text; its search results are discarded
    pub async fn edit_content(&mut self, id: DocumentId, content: String) -> Result<()> {
        if !self.store.update_content(id, content) {
            return Err(ValidationError::UnknownDocument { id: id.to_string() }.into());
        }
        self.drop_results_for(id);
        self.persist().await;
        Ok(())
    }

    pub async fn search(&mut self, query: &str, mode: SearchMode) -> Result<&[SearchResult]> {
        if query.trim().is_empty() {
            return Err(ValidationError::EmptyQuery.into());
        }
        if self.store.is_empty() {
            return Err(ValidationError::NoDocuments.into());
        }
        if self.gate.is_open() {
            return Err(ValidationError::ReviewInProgress.into());
        }

        let results = self
            .matcher
            .search(
                self.store.searchable(&self.engine_config),
                query,
                mode,
                self.output.as_ref(),
            )
            .await?;

        self.results = results;
        self.last_query = Some(query.to_string());
        Ok(&self.results)
    }

    /// Flip one match's selection; returns the new state
    pub fn toggle_match(&mut self, match_id: &str) -> Result<bool> {
        search::toggle_selection(&mut self.results, match_id).ok_or_else(|| {
            ValidationError::UnknownMatch {
                id: match_id.to_string(),
            }
            .into()
        })
    }

    pub fn set_all_selected(&mut self, selected: bool) {
        search::set_all_selected(&mut self.results, selected);
    }

    /// Plan replacements for the selected matches and open the review.
    /// Returns the number of documents under review.
    pub async fn generate_previews(
        &mut self,
        replacement: &str,
        options: ReplaceOptions,
    ) -> Result<usize> {
        if self.gate.is_open() {
            return Err(ValidationError::ReviewInProgress.into());
        }

        let previews = self
            .planner
            .plan(
                &self.store,
                &self.results,
                replacement,
                options,
                self.output.as_ref(),
            )
            .await?;

        let count = previews.len();
        self.gate.open(previews)?;
        Ok(count)
    }

    /// Apply approved replacements and end the review
    pub async fn close_review(&mut self) -> Result<ReviewOutcome> {
        let outcome = self.gate.close(&mut self.store)?;

        if outcome.changed() {
            // Offsets of the previous search no longer hold
            self.results.clear();
            self.persist().await;
        }

        emit(
            self.output.as_ref(),
            PipelineEvent::ChangesApplied {
                documents_updated: outcome.documents_updated,
                edits_applied: outcome.edits_applied,
            },
        )
        .await;
        Ok(outcome)
    }

    pub async fn cancel_review(&mut self) -> Result<()> {
        self.gate.cancel()?;
        emit(self.output.as_ref(), PipelineEvent::ReviewDiscarded).await;
        Ok(())
    }
}
