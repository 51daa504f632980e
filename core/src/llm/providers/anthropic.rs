//! Anthropic Claude client implementation

use crate::config::ResolvedLlmConfig;
use crate::error::{LlmError, Result};
use crate::llm::{ChatOptions, FinishReason, LlmClient, LlmMessage, LlmResponse, MessageRole, Usage};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude client
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    headers: HashMap<String, String>,
    defaults: ChatOptions,
}

impl AnthropicClient {
    /// Create a new Anthropic client
    pub fn new(config: &ResolvedLlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::Authentication {
                message: "No API key found for Anthropic".to_string(),
            }
            .into());
        }

        Ok(Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            headers: config.headers.clone(),
            defaults: ChatOptions {
                max_tokens: config.params.max_tokens,
                temperature: config.params.temperature,
                top_p: config.params.top_p,
            },
        })
    }

    fn build_request(&self, messages: Vec<LlmMessage>, options: ChatOptions) -> AnthropicRequest {
        // Separate system messages from conversation messages
        let mut system_message = None;
        let mut conversation_messages = Vec::new();

        for message in messages {
            match message.role {
                MessageRole::System => system_message = Some(message.content),
                MessageRole::User => conversation_messages.push(AnthropicMessage {
                    role: "user",
                    content: message.content,
                }),
                MessageRole::Assistant => conversation_messages.push(AnthropicMessage {
                    role: "assistant",
                    content: message.content,
                }),
            }
        }

        AnthropicRequest {
            model: self.model.clone(),
            max_tokens: options
                .max_tokens
                .or(self.defaults.max_tokens)
                .unwrap_or(4096),
            temperature: options.temperature.or(self.defaults.temperature),
            top_p: options.top_p.or(self.defaults.top_p),
            system: system_message,
            messages: conversation_messages,
        }
    }

    fn convert_response(&self, response: AnthropicResponse) -> LlmResponse {
        let text = response
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .filter_map(|c| c.text.as_deref())
            .collect::<Vec<_>>()
            .join("");

        let usage = response.usage.map(|u| Usage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
            total_tokens: u.input_tokens + u.output_tokens,
        });

        let finish_reason = response.stop_reason.map(|reason| match reason.as_str() {
            "end_turn" | "stop_sequence" => FinishReason::Stop,
            "max_tokens" => FinishReason::Length,
            _ => FinishReason::Other(reason),
        });

        LlmResponse {
            message: LlmMessage::assistant(text),
            usage,
            model: response.model,
            finish_reason,
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let request = self.build_request(messages, options.unwrap_or_default());

        let mut builder = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json");
        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }

        let response = builder
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Network {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Anthropic API call failed: {} - {}", status, error_text);
            return Err(LlmError::ApiError {
                status,
                message: error_text,
            }
            .into());
        }

        let anthropic_response: AnthropicResponse =
            response.json().await.map_err(|e| LlmError::Network {
                message: format!("Failed to parse response: {}", e),
            })?;

        Ok(self.convert_response(anthropic_response))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    model: String,
    content: Vec<AnthropicContent>,
    stop_reason: Option<String>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModelParams, Protocol};

    fn client() -> AnthropicClient {
        let config = ResolvedLlmConfig::new(
            Protocol::Anthropic,
            "https://api.anthropic.com/".to_string(),
            "key".to_string(),
            "claude-3-5-sonnet-20241022".to_string(),
        );
        AnthropicClient::new(&config).unwrap()
    }

    #[test]
    fn test_system_message_is_lifted_out() {
        let request = client().build_request(
            vec![LlmMessage::system("be brief"), LlmMessage::user("hello")],
            ChatOptions::default(),
        );
        assert_eq!(request.system.as_deref(), Some("be brief"));
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, "user");
        assert_eq!(request.max_tokens, 4096);
        assert_eq!(request.temperature, None);
    }

    #[test]
    fn test_configured_params_apply_when_request_leaves_them_open() {
        let config = ResolvedLlmConfig::new(
            Protocol::Anthropic,
            "https://api.anthropic.com".to_string(),
            "key".to_string(),
            "claude-3-5-sonnet-20241022".to_string(),
        )
        .with_params(ModelParams {
            max_tokens: Some(512),
            temperature: Some(0.7),
            top_p: None,
        });
        let client = AnthropicClient::new(&config).unwrap();

        let request = client.build_request(
            vec![LlmMessage::user("hello")],
            ChatOptions {
                max_tokens: Some(100),
                temperature: None,
                top_p: None,
            },
        );
        assert_eq!(request.max_tokens, 100);
        assert_eq!(request.temperature, Some(0.7));
    }

    #[test]
    fn test_convert_response_joins_text_blocks() {
        let raw = r#"{
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "model": "claude-3-5-sonnet-20241022",
            "content": [{"type": "text", "text": "[{\"text\":"}, {"type": "text", "text": "\"a\"}]"}],
            "stop_reason": "max_tokens",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }"#;
        let response: AnthropicResponse = serde_json::from_str(raw).unwrap();
        let converted = client().convert_response(response);
        assert_eq!(converted.message.content, "[{\"text\":\"a\"}]");
        assert_eq!(converted.finish_reason, Some(FinishReason::Length));
        assert_eq!(converted.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn test_rejects_missing_key() {
        let config = ResolvedLlmConfig::new(
            Protocol::Anthropic,
            "https://api.anthropic.com".to_string(),
            String::new(),
            "claude".to_string(),
        );
        assert!(AnthropicClient::new(&config).is_err());
    }
}
