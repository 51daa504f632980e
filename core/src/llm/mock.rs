//! Scripted LLM client for tests

use crate::error::{LlmError, Result};
use crate::llm::{ChatOptions, LlmClient, LlmMessage, LlmResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays canned replies in order; an empty script repeats `fallback`
pub struct MockLlmClient {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    fallback: std::result::Result<String, String>,
    prompts: Mutex<Vec<String>>,
    options: Mutex<Vec<Option<ChatOptions>>>,
}

impl MockLlmClient {
    /// Every call returns `text`
    pub fn always(text: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
            options: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with a network error
    pub fn failing() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: Err("connection refused".to_string()),
            prompts: Mutex::new(Vec::new()),
            options: Mutex::new(Vec::new()),
        }
    }

    /// Calls return `replies` in order, then fail
    pub fn scripted(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.to_string())).collect()),
            fallback: Err("script exhausted".to_string()),
            prompts: Mutex::new(Vec::new()),
            options: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Options received so far
    pub fn options(&self) -> Vec<Option<ChatOptions>> {
        self.options.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let prompt = messages
            .iter()
            .map(|m| m.content.clone())
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts.lock().unwrap().push(prompt);
        self.options.lock().unwrap().push(options);

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match reply {
            Ok(text) => Ok(LlmResponse {
                message: LlmMessage::assistant(text),
                usage: None,
                model: "mock-model".to_string(),
                finish_reason: None,
            }),
            Err(message) => Err(LlmError::Network { message }.into()),
        }
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}
