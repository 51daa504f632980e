//! LLM client trait and response structures

use crate::error::{LlmError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::message::LlmMessage;

/// Trait for LLM clients
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a chat completion request
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse>;

    /// Get the model name
    fn model_name(&self) -> &str;

    /// Get the provider name
    fn provider_name(&self) -> &str;
}

/// Response from an LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// The generated message
    pub message: LlmMessage,

    /// Usage statistics
    pub usage: Option<Usage>,

    /// Model used for generation
    pub model: String,

    /// Finish reason
    pub finish_reason: Option<FinishReason>,
}

/// Usage statistics for a request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    /// Number of tokens in the prompt
    pub prompt_tokens: u32,

    /// Number of tokens in the completion
    pub completion_tokens: u32,

    /// Total number of tokens
    pub total_tokens: u32,
}

/// Reason why generation finished
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Generation completed naturally
    Stop,

    /// Hit the maximum token limit
    Length,

    /// Content was filtered
    ContentFilter,

    /// Other reason
    Other(String),
}

/// Per-request options; `None` fields fall back to the configured model params
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,

    /// Temperature for generation
    pub temperature: Option<f32>,

    /// Top-p sampling parameter
    pub top_p: Option<f32>,
}

/// Send a single prompt and return the generated text.
///
/// This is the whole contract docshift has with the text-generation service:
/// prompt in, free text out. A blank completion is reported as an error so
/// callers take their fallback path.
pub async fn generate_text(client: &dyn LlmClient, prompt: &str, max_tokens: u32) -> Result<String> {
    let options = ChatOptions {
        max_tokens: Some(max_tokens),
        temperature: None,
        top_p: None,
    };

    let response = client
        .chat_completion(vec![LlmMessage::user(prompt)], Some(options))
        .await?;

    if let Some(FinishReason::Length) = response.finish_reason {
        tracing::debug!(
            "{} response hit the {} token limit",
            client.provider_name(),
            max_tokens
        );
    }

    match response.message.get_text() {
        Some(text) => Ok(text.to_string()),
        None => Err(LlmError::EmptyResponse {
            provider: client.provider_name().to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockLlmClient;

    #[tokio::test]
    async fn test_generate_text_leaves_sampling_to_config() {
        let client = MockLlmClient::always("ok");
        let text = generate_text(&client, "prompt", 10).await.unwrap();

        assert_eq!(text, "ok");
        assert_eq!(
            client.options(),
            vec![Some(ChatOptions {
                max_tokens: Some(10),
                temperature: None,
                top_p: None,
            })]
        );
    }

    #[tokio::test]
    async fn test_blank_completion_is_an_error() {
        let client = MockLlmClient::always("");
        assert!(generate_text(&client, "prompt", 10).await.is_err());
    }
}
