//! Google AI (Gemini) client implementation

use crate::config::ResolvedLlmConfig;
use crate::error::{LlmError, Result};
use crate::llm::{ChatOptions, FinishReason, LlmClient, LlmMessage, LlmResponse, MessageRole, Usage};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Gemini `generateContent` client
pub struct GoogleAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    headers: HashMap<String, String>,
    defaults: ChatOptions,
}

impl GoogleAiClient {
    /// Create a new Google AI client
    pub fn new(config: &ResolvedLlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::Authentication {
                message: "No API key found for Google AI".to_string(),
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

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_request(&self, messages: Vec<LlmMessage>, options: ChatOptions) -> GenerateRequest {
        let mut system_instruction = None;
        let mut contents = Vec::new();

        for message in messages {
            let part = Part {
                text: message.content,
            };
            match message.role {
                MessageRole::System => {
                    system_instruction = Some(Content {
                        role: None,
                        parts: vec![part],
                    })
                }
                MessageRole::User => contents.push(Content {
                    role: Some("user".to_string()),
                    parts: vec![part],
                }),
                MessageRole::Assistant => contents.push(Content {
                    role: Some("model".to_string()),
                    parts: vec![part],
                }),
            }
        }

        GenerateRequest {
            contents,
            system_instruction,
            generation_config: GenerationConfig {
                max_output_tokens: options.max_tokens.or(self.defaults.max_tokens),
                temperature: options.temperature.or(self.defaults.temperature),
                top_p: options.top_p.or(self.defaults.top_p),
            },
        }
    }

    fn convert_response(&self, response: GenerateResponse) -> Result<LlmResponse> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::EmptyResponse {
                provider: "google_ai".to_string(),
            })?;

        let text = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let finish_reason = candidate.finish_reason.map(|reason| match reason.as_str() {
            "STOP" => FinishReason::Stop,
            "MAX_TOKENS" => FinishReason::Length,
            "SAFETY" => FinishReason::ContentFilter,
            _ => FinishReason::Other(reason),
        });

        let usage = response.usage_metadata.map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        Ok(LlmResponse {
            message: LlmMessage::assistant(text),
            usage,
            model: self.model.clone(),
            finish_reason,
        })
    }
}

#[async_trait]
impl LlmClient for GoogleAiClient {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let request = self.build_request(messages, options.unwrap_or_default());

        let mut builder = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
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
            tracing::error!("Google AI call failed: {} - {}", status, error_text);
            return Err(LlmError::ApiError {
                status,
                message: error_text,
            }
            .into());
        }

        let body: GenerateResponse = response.json().await.map_err(|e| LlmError::Network {
            message: format!("Failed to parse response: {}", e),
        })?;

        self.convert_response(body)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "google_ai"
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}
