//! Search across the document store with delegate fallback

use super::literal::literal_scan;
use super::semantic::semantic_scan;
use super::{Match, SearchMode, SearchResult, SearchStrategy};
use crate::config::EngineConfig;
use crate::document::Document;
use crate::error::{Result, ValidationError};
use crate::llm::LlmClient;
use crate::output::{emit, PipelineEvent, PipelineOutput};
use crate::prompt::PromptRenderer;
use std::sync::Arc;
use tracing::{info, warn};

/// Finds matches for a query, one document at a time
pub struct Matcher {
    config: EngineConfig,
    delegate: Option<Arc<dyn LlmClient>>,
    prompts: PromptRenderer,
}

impl Matcher {
    pub fn new(config: EngineConfig, delegate: Option<Arc<dyn LlmClient>>) -> Result<Self> {
        Ok(Self {
            config,
            delegate,
            prompts: PromptRenderer::new()?,
        })
    }

    /// Literal scan of one document
    pub fn literal(&self, document: &Document, query: &str) -> Vec<Match> {
        literal_scan(document.id, &document.content, query, self.config.context_radius)
    }

    /// Search one document. Semantic mode falls back to the literal scan when
    /// the delegate is missing, fails, or yields nothing acceptable.
    pub async fn search_document(
        &self,
        document: &Document,
        query: &str,
        mode: SearchMode,
        output: &dyn PipelineOutput,
    ) -> SearchResult {
        let (strategy, mut matches) = match (mode, &self.delegate) {
            (SearchMode::Literal, _) => (SearchStrategy::Literal, self.literal(document, query)),
            (SearchMode::Semantic, None) => {
                warn!("Semantic search requested without a configured model");
                self.fallback(document, query, "no model configured", output)
                    .await
            }
            (SearchMode::Semantic, Some(client)) => {
                match semantic_scan(client.as_ref(), &self.prompts, document, query, &self.config)
                    .await
                {
                    Ok(found) if !found.is_empty() => (SearchStrategy::Semantic, found),
                    Ok(_) => {
                        self.fallback(document, query, "no matches found", output)
                            .await
                    }
                    Err(e) => {
                        warn!("Semantic search failed for {}: {}", document.name, e);
                        self.fallback(document, query, &e.to_string(), output).await
                    }
                }
            }
        };

        // Stable: unscored matches keep position order behind scored ones
        matches.sort_by(|a, b| b.relevance.cmp(&a.relevance));

        SearchResult {
            document_id: document.id,
            document_name: document.name.clone(),
            strategy,
            matches,
        }
    }

    async fn fallback(
        &self,
        document: &Document,
        query: &str,
        reason: &str,
        output: &dyn PipelineOutput,
    ) -> (SearchStrategy, Vec<Match>) {
        emit(
            output,
            PipelineEvent::DelegateFallback {
                document_name: document.name.clone(),
                reason: reason.to_string(),
            },
        )
        .await;
        (SearchStrategy::LiteralFallback, self.literal(document, query))
    }

    /// Search every document in order; only documents with matches are returned
    pub async fn search<'a, I>(
        &self,
        documents: I,
        query: &str,
        mode: SearchMode,
        output: &dyn PipelineOutput,
    ) -> Result<Vec<SearchResult>>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        if query.trim().is_empty() {
            return Err(ValidationError::EmptyQuery.into());
        }

        let documents: Vec<&Document> = documents.into_iter().collect();
        if documents.is_empty() {
            return Err(ValidationError::NoSearchableDocuments.into());
        }

        let total = documents.len();
        emit(
            output,
            PipelineEvent::SearchStarted {
                query: query.to_string(),
                mode,
                total_documents: total,
            },
        )
        .await;

        let mut results = Vec::new();
        for (index, document) in documents.into_iter().enumerate() {
            let result = self.search_document(document, query, mode, output).await;
            emit(
                output,
                PipelineEvent::DocumentSearched {
                    document_name: document.name.clone(),
                    completed: index + 1,
                    total,
                    matches: result.matches.len(),
                    strategy: result.strategy,
                },
            )
            .await;

            if !result.matches.is_empty() {
                results.push(result);
            }
        }

        let total_matches = super::total_matches(&results);
        info!(
            "Found {} matches for {:?} in {} of {} documents",
            total_matches,
            query,
            results.len(),
            total
        );
        emit(
            output,
            PipelineEvent::SearchCompleted {
                total_matches,
                documents_with_matches: results.len(),
            },
        )
        .await;

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::llm::mock::MockLlmClient;
    use crate::output::recording::RecordingOutput;
    use crate::output::NullOutput;

    fn docs() -> Vec<Document> {
        vec![
            Document::from_text("a.txt", "cat sat on the cat mat, said the Cat."),
            Document::from_text("b.txt", "Nothing relevant lives in this file."),
        ]
    }

    fn matcher(delegate: Option<MockLlmClient>) -> Matcher {
        Matcher::new(
            EngineConfig::default(),
            delegate.map(|d| Arc::new(d) as Arc<dyn LlmClient>),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_literal_search_skips_documents_without_matches() {
        let docs = docs();
        let results = matcher(None)
            .search(&docs, "cat", SearchMode::Literal, &NullOutput)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document_name, "a.txt");
        assert_eq!(results[0].matches.len(), 3);
        assert_eq!(results[0].strategy, SearchStrategy::Literal);
    }

    #[tokio::test]
    async fn test_empty_query_is_validation_error() {
        let docs = docs();
        let err = matcher(None)
            .search(&docs, "   ", SearchMode::Literal, &NullOutput)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::EmptyQuery)));
    }

    #[tokio::test]
    async fn test_no_documents_is_validation_error() {
        let err = matcher(None)
            .search(Vec::<&Document>::new(), "cat", SearchMode::Literal, &NullOutput)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::NoSearchableDocuments)
        ));
    }

    #[tokio::test]
    async fn test_malformed_delegate_reply_matches_literal_scan() {
        let docs = docs();
        let literal = matcher(None)
            .search(&docs, "cat", SearchMode::Literal, &NullOutput)
            .await
            .unwrap();

        let semantic = matcher(Some(MockLlmClient::always("[{\"text\": \"cat\", oops")))
            .search(&docs, "cat", SearchMode::Semantic, &NullOutput)
            .await
            .unwrap();

        assert_eq!(semantic.len(), literal.len());
        assert_eq!(semantic[0].matches, literal[0].matches);
        assert_eq!(semantic[0].strategy, SearchStrategy::LiteralFallback);
    }

    #[tokio::test]
    async fn test_delegate_failure_falls_back() {
        let docs = docs();
        let output = RecordingOutput::default();
        let results = matcher(Some(MockLlmClient::failing()))
            .search(&docs, "cat", SearchMode::Semantic, &output)
            .await
            .unwrap();

        assert_eq!(results[0].matches.len(), 3);
        let fallbacks = output
            .events()
            .into_iter()
            .filter(|e| matches!(e, PipelineEvent::DelegateFallback { .. }))
            .count();
        assert_eq!(fallbacks, 2);
    }

    #[tokio::test]
    async fn test_semantic_without_delegate_falls_back() {
        let docs = docs();
        let results = matcher(None)
            .search(&docs, "cat", SearchMode::Semantic, &NullOutput)
            .await
            .unwrap();
        assert_eq!(results[0].strategy, SearchStrategy::LiteralFallback);
    }

    #[tokio::test]
    async fn test_semantic_results_sorted_by_relevance_and_thresholded() {
        let docs = vec![Document::from_text(
            "a.txt",
            "The feline rested. A cat slept. The kitten played nearby.",
        )];
        let reply = r#"[
            {"text": "cat", "relevance": 7, "reason": "synonym"},
            {"text": "kitten", "relevance": 9, "reason": "young cat"},
            {"text": "rested", "relevance": 2, "reason": "weak"},
            {"text": "feline", "relevance": 10, "reason": "exact sense"}
        ]"#;
        let results = matcher(Some(MockLlmClient::always(reply)))
            .search(&docs, "felines", SearchMode::Semantic, &NullOutput)
            .await
            .unwrap();

        let texts: Vec<_> = results[0]
            .matches
            .iter()
            .map(|m| m.original_text.as_str())
            .collect();
        assert_eq!(texts, vec!["feline", "kitten", "cat"]);
        assert_eq!(results[0].strategy, SearchStrategy::Semantic);
        assert!(results[0].matches.iter().all(|m| m.relevance >= Some(6)));
    }

    #[tokio::test]
    async fn test_all_below_threshold_falls_back_to_literal() {
        let docs = docs();
        let reply = r#"[{"text": "mat", "relevance": 3}]"#;
        let results = matcher(Some(MockLlmClient::always(reply)))
            .search(&docs, "cat", SearchMode::Semantic, &NullOutput)
            .await
            .unwrap();

        assert_eq!(results[0].strategy, SearchStrategy::LiteralFallback);
        assert!(results[0].matches.iter().all(|m| m.original_text.to_lowercase() == "cat"));
    }

    #[tokio::test]
    async fn test_progress_events() {
        let docs = docs();
        let output = RecordingOutput::default();
        matcher(None)
            .search(&docs, "cat", SearchMode::Literal, &output)
            .await
            .unwrap();

        let events = output.events();
        assert!(matches!(
            events.first(),
            Some(PipelineEvent::SearchStarted { total_documents: 2, .. })
        ));
        assert!(events.contains(&PipelineEvent::DocumentSearched {
            document_name: "b.txt".to_string(),
            completed: 2,
            total: 2,
            matches: 0,
            strategy: SearchStrategy::Literal,
        }));
        assert!(matches!(
            events.last(),
            Some(PipelineEvent::SearchCompleted {
                total_matches: 3,
                documents_with_matches: 1
            })
        ));
    }
}
