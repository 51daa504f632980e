//! Replacement planning
//!
//! Turns the selected matches of a search into per-document previews. In
//! smart mode every match is sent to the delegate, one at a time, to have the
//! replacement fitted to its context; anything the delegate cannot answer
//! falls back to the literal replacement.

use super::preview::ReplacementPreview;
use super::splice::check_original;
use crate::config::EngineConfig;
use crate::document::DocumentStore;
use crate::error::{Result, ValidationError};
use crate::llm::{generate_text, LlmClient};
use crate::output::{emit, PipelineEvent, PipelineOutput};
use crate::prompt::PromptRenderer;
use crate::search::{Match, SearchResult};
use crate::structured::extract_json_object;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How replacements should be planned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceOptions {
    /// Ask the delegate to adapt the replacement to each match's context
    pub smart: bool,
    pub preserve_structure: bool,
    pub preserve_tense: bool,
}

#[derive(Debug, Deserialize)]
struct ContextualReply {
    #[serde(default)]
    replacement: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
}

pub struct Planner {
    config: EngineConfig,
    delegate: Option<Arc<dyn LlmClient>>,
    prompts: PromptRenderer,
}

impl Planner {
    pub fn new(config: EngineConfig, delegate: Option<Arc<dyn LlmClient>>) -> Result<Self> {
        Ok(Self {
            config,
            delegate,
            prompts: PromptRenderer::new()?,
        })
    }

    /// Ask the delegate for a contextual replacement; `None` means use the literal one
    async fn contextual(
        &self,
        client: &dyn LlmClient,
        m: &Match,
        replacement: &str,
        options: ReplaceOptions,
    ) -> Result<Option<(String, Option<String>)>> {
        let prompt = self.prompts.contextual_replacement(
            &m.context,
            &m.original_text,
            replacement,
            options.preserve_structure,
            options.preserve_tense,
        )?;
        let reply = generate_text(client, &prompt, self.config.replace_max_tokens).await?;

        let Some(parsed) =
            extract_json_object::<ContextualReply>(&reply, self.config.max_json_fragment_bytes)
        else {
            return Ok(None);
        };

        Ok(parsed
            .replacement
            .filter(|r| !r.trim().is_empty())
            .map(|r| (r, parsed.explanation.filter(|e| !e.trim().is_empty()))))
    }

    async fn plan_match(
        &self,
        mut m: Match,
        document_name: &str,
        replacement: &str,
        options: ReplaceOptions,
        output: &dyn PipelineOutput,
    ) -> Match {
        m.proposed_replacement = Some(replacement.to_string());
        m.contextual_replacement = Some(replacement.to_string());
        m.explanation = None;

        if !options.smart {
            return m;
        }

        let Some(client) = &self.delegate else {
            return m;
        };

        let outcome = self
            .contextual(client.as_ref(), &m, replacement, options)
            .await;
        let reason = match outcome {
            Ok(Some((fitted, explanation))) => {
                debug!("{:?} -> {:?} in {}", m.original_text, fitted, document_name);
                m.contextual_replacement = Some(fitted);
                m.explanation = explanation;
                return m;
            }
            Ok(None) => "no usable replacement in reply".to_string(),
            Err(e) => {
                warn!("Contextual replacement failed in {}: {}", document_name, e);
                e.to_string()
            }
        };

        emit(
            output,
            PipelineEvent::DelegateFallback {
                document_name: document_name.to_string(),
                reason,
            },
        )
        .await;
        m
    }

    /// Build previews for every document with selected matches.
    ///
    /// Documents removed since the search, or whose content no longer holds the
    /// matched text, are skipped.
    pub async fn plan(
        &self,
        store: &DocumentStore,
        results: &[SearchResult],
        replacement: &str,
        options: ReplaceOptions,
        output: &dyn PipelineOutput,
    ) -> Result<Vec<ReplacementPreview>> {
        if replacement.trim().is_empty() {
            return Err(ValidationError::EmptyReplacement.into());
        }

        let total: usize = results.iter().map(SearchResult::selected_count).sum();
        if total == 0 {
            return Err(ValidationError::NoSelection.into());
        }

        if options.smart && self.delegate.is_none() {
            warn!("Smart replacement requested without a configured model; using literal replacement");
        }

        emit(
            output,
            PipelineEvent::PlanningStarted {
                total_matches: total,
                smart: options.smart,
            },
        )
        .await;

        let mut previews = Vec::new();
        let mut completed = 0;
        for result in results {
            let selected: Vec<Match> = result.selected().cloned().collect();
            if selected.is_empty() {
                continue;
            }

            let Some(document) = store.get(result.document_id) else {
                warn!("Skipping {}: document no longer exists", result.document_name);
                completed += selected.len();
                continue;
            };

            if let Some(stale) = selected
                .iter()
                .find(|m| check_original(&document.content, m.position, &m.original_text).is_err())
            {
                warn!(
                    "Skipping {}: content changed since the search ({:?} at {})",
                    document.name, stale.original_text, stale.position
                );
                completed += selected.len();
                continue;
            }

            let mut planned = Vec::with_capacity(selected.len());
            for m in selected {
                planned.push(
                    self.plan_match(m, &document.name, replacement, options, output)
                        .await,
                );
                completed += 1;
                emit(
                    output,
                    PipelineEvent::ReplacementPlanned {
                        document_name: document.name.clone(),
                        completed,
                        total,
                    },
                )
                .await;
            }

            match ReplacementPreview::new(document, planned) {
                Ok(preview) => previews.push(preview),
                Err(e) => warn!("Skipping {}: {}", document.name, e),
            }
        }

        info!(
            "Planned {} replacements across {} documents",
            previews.iter().map(|p| p.matches.len()).sum::<usize>(),
            previews.len()
        );
        emit(
            output,
            PipelineEvent::PlanningCompleted {
                previews: previews.len(),
            },
        )
        .await;

        Ok(previews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::error::Error;
    use crate::llm::mock::MockLlmClient;
    use crate::output::NullOutput;
    use crate::search::{literal_scan, SearchStrategy};

    fn setup(content: &str, query: &str) -> (DocumentStore, Vec<SearchResult>) {
        let document = Document::from_text("a.txt", content);
        let result = SearchResult {
            document_id: document.id,
            document_name: document.name.clone(),
            strategy: SearchStrategy::Literal,
            matches: literal_scan(document.id, &document.content, query, 50),
        };
        (DocumentStore::from_documents(vec![document]), vec![result])
    }

    fn planner(delegate: Option<MockLlmClient>) -> Planner {
        Planner::new(
            EngineConfig::default(),
            delegate.map(|d| Arc::new(d) as Arc<dyn LlmClient>),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_literal_plan() {
        let (store, results) = setup("cat sat on the cat mat", "cat");
        let previews = planner(None)
            .plan(&store, &results, "dog", ReplaceOptions::default(), &NullOutput)
            .await
            .unwrap();

        assert_eq!(previews.len(), 1);
        assert_eq!(previews[0].preview_content, "dog sat on the dog mat");
        assert!(previews[0]
            .matches
            .iter()
            .all(|m| m.contextual_replacement.as_deref() == Some("dog")));
    }

    #[tokio::test]
    async fn test_only_selected_matches_are_planned() {
        let (store, mut results) = setup("cat sat on the cat mat", "cat");
        results[0].matches[0].selected = false;
        let previews = planner(None)
            .plan(&store, &results, "dog", ReplaceOptions::default(), &NullOutput)
            .await
            .unwrap();

        assert_eq!(previews[0].matches.len(), 1);
        assert_eq!(previews[0].preview_content, "cat sat on the dog mat");
    }

    #[tokio::test]
    async fn test_validation() {
        let (store, mut results) = setup("cat sat on the cat mat", "cat");
        let err = planner(None)
            .plan(&store, &results, "  ", ReplaceOptions::default(), &NullOutput)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::EmptyReplacement)));

        crate::search::set_all_selected(&mut results, false);
        let err = planner(None)
            .plan(&store, &results, "dog", ReplaceOptions::default(), &NullOutput)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::NoSelection)));
    }

    #[tokio::test]
    async fn test_smart_plan_uses_delegate_reply() {
        let (store, results) = setup("The cats were asleep. A cat woke.", "cat");
        let client = MockLlmClient::scripted(vec![
            r#"Here you go: {"replacement": "dog", "explanation": "kept plural"}"#,
            r#"{"replacement": "dog", "explanation": "singular"}"#,
        ]);
        let options = ReplaceOptions {
            smart: true,
            preserve_structure: true,
            preserve_tense: false,
        };
        let previews = planner(Some(client))
            .plan(&store, &results, "dog", options, &NullOutput)
            .await
            .unwrap();

        let m = &previews[0].matches[0];
        assert_eq!(m.proposed_replacement.as_deref(), Some("dog"));
        assert_eq!(m.explanation.as_deref(), Some("kept plural"));
        assert_eq!(previews[0].preview_content, "The dogs were asleep. A dog woke.");
    }

    #[tokio::test]
    async fn test_smart_plan_falls_back_per_match() {
        let (store, results) = setup("cat sat on the cat mat", "cat");
        // First reply is usable, second is not
        let client = MockLlmClient::scripted(vec![
            r#"{"replacement": "kitten"}"#,
            "not json at all",
        ]);
        let options = ReplaceOptions {
            smart: true,
            ..Default::default()
        };
        let previews = planner(Some(client))
            .plan(&store, &results, "dog", options, &NullOutput)
            .await
            .unwrap();

        assert_eq!(previews[0].preview_content, "kitten sat on the dog mat");
        assert_eq!(previews[0].matches[1].explanation, None);
    }

    #[tokio::test]
    async fn test_smart_plan_delegate_failure() {
        let (store, results) = setup("cat sat on the cat mat", "cat");
        let options = ReplaceOptions {
            smart: true,
            ..Default::default()
        };
        let previews = planner(Some(MockLlmClient::failing()))
            .plan(&store, &results, "dog", options, &NullOutput)
            .await
            .unwrap();
        assert_eq!(previews[0].preview_content, "dog sat on the dog mat");
    }

    #[tokio::test]
    async fn test_prompt_carries_flags() {
        let (store, results) = setup("cat sat here", "cat");
        let client = Arc::new(MockLlmClient::always(r#"{"replacement": "dog"}"#));
        let planner = Planner::new(EngineConfig::default(), Some(client.clone() as Arc<dyn LlmClient>))
            .unwrap();
        let options = ReplaceOptions {
            smart: true,
            preserve_structure: false,
            preserve_tense: true,
        };
        planner
            .plan(&store, &results, "dog", options, &NullOutput)
            .await
            .unwrap();

        let prompt = &client.prompts()[0];
        assert!(prompt.contains("tense"));
        assert!(!prompt.contains("sentence structure"));
    }

    #[tokio::test]
    async fn test_stale_document_is_skipped() {
        let (mut store, results) = setup("cat sat on the cat mat", "cat");
        store.update_content(results[0].document_id, "a completely different text".to_string());
        let previews = planner(None)
            .plan(&store, &results, "dog", ReplaceOptions::default(), &NullOutput)
            .await
            .unwrap();
        assert!(previews.is_empty());
    }
}
