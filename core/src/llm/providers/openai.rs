//! OpenAI and Azure OpenAI clients using async-openai library

use crate::config::ResolvedLlmConfig;
use crate::error::{LlmError, Result};
use crate::llm::{ChatOptions, FinishReason, LlmClient, LlmMessage, LlmResponse, MessageRole, Usage};
use async_openai::{
    config::{AzureConfig, Config, OpenAIConfig},
    types::{
        ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;

/// Azure `api-version` used when the configuration names none
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-10-21";

/// Chat completions client over async-openai; `C` selects OpenAI or Azure
pub struct OpenAiClient<C: Config = OpenAIConfig> {
    client: Client<C>,
    model: String,
    provider: &'static str,
    defaults: ChatOptions,
}

fn require_api_key(config: &ResolvedLlmConfig, provider: &str) -> Result<()> {
    if config.api_key.is_empty() {
        return Err(crate::error::Error::Llm(LlmError::Authentication {
            message: format!("No API key found for {}", provider),
        }));
    }
    Ok(())
}

fn defaults_from(config: &ResolvedLlmConfig) -> ChatOptions {
    ChatOptions {
        max_tokens: config.params.max_tokens,
        temperature: config.params.temperature,
        top_p: config.params.top_p,
    }
}

impl OpenAiClient<OpenAIConfig> {
    /// Create a new OpenAI-compatible client from resolved LLM config
    pub fn new(config: &ResolvedLlmConfig) -> Result<Self> {
        require_api_key(config, "OpenAI")?;

        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(&config.base_url);

        Ok(Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
            provider: "openai",
            defaults: defaults_from(config),
        })
    }
}

impl OpenAiClient<AzureConfig> {
    /// Create an Azure OpenAI client. The model name is the deployment id and
    /// the key is sent in the `api-key` header.
    pub fn azure(config: &ResolvedLlmConfig) -> Result<Self> {
        require_api_key(config, "Azure OpenAI")?;

        let azure_config = azure_config(config);

        Ok(Self {
            client: Client::with_config(azure_config),
            model: config.model.clone(),
            provider: "azure_openai",
            defaults: defaults_from(config),
        })
    }
}

fn azure_config(config: &ResolvedLlmConfig) -> AzureConfig {
    AzureConfig::new()
        .with_api_base(config.base_url.trim_end_matches('/'))
        .with_api_key(&config.api_key)
        .with_deployment_id(&config.model)
        .with_api_version(
            config
                .api_version
                .as_deref()
                .unwrap_or(DEFAULT_AZURE_API_VERSION),
        )
}

impl<C: Config> OpenAiClient<C> {

    /// Convert our internal message format to async-openai format
    fn convert_messages(&self, messages: Vec<LlmMessage>) -> Vec<ChatCompletionRequestMessage> {
        messages
            .into_iter()
            .map(|message| match message.role {
                MessageRole::System => {
                    ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                        content: message.content.into(),
                        name: None,
                    })
                }
                MessageRole::User => {
                    ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                        content: message.content.into(),
                        name: None,
                    })
                }
                MessageRole::Assistant => {
                    ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                        content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                            message.content,
                        )),
                        name: None,
                        tool_calls: None,
                        audio: None,
                        refusal: None,
                        ..Default::default()
                    })
                }
            })
            .collect()
    }
}

#[async_trait]
impl<C: Config + Send + Sync + 'static> LlmClient for OpenAiClient<C> {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let options = options.unwrap_or_default();

        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder.model(&self.model);
        request_builder.messages(self.convert_messages(messages));

        if let Some(max_tokens) = options.max_tokens.or(self.defaults.max_tokens) {
            request_builder.max_tokens(max_tokens);
        }
        if let Some(temperature) = options.temperature.or(self.defaults.temperature) {
            request_builder.temperature(temperature);
        }
        if let Some(top_p) = options.top_p.or(self.defaults.top_p) {
            request_builder.top_p(top_p);
        }

        let request = request_builder.build().map_err(|e| {
            tracing::error!("Failed to build {} request: {}", self.provider, e);
            LlmError::InvalidRequest {
                message: format!("Failed to build request: {}", e),
            }
        })?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            tracing::error!("{} API call failed: {}", self.provider, e);
            LlmError::ApiError {
                status: 500, // async-openai doesn't expose status codes directly
                message: e.to_string(),
            }
        })?;

        self.convert_response(response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        self.provider
    }
}

impl<C: Config> OpenAiClient<C> {
    /// Convert async-openai response to our internal format
    fn convert_response(
        &self,
        response: async_openai::types::CreateChatCompletionResponse,
    ) -> Result<LlmResponse> {
        let choice =
            response
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| LlmError::EmptyResponse {
                    provider: self.provider.to_string(),
                })?;

        let message = LlmMessage::assistant(choice.message.content.unwrap_or_default());

        let usage = response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        let finish_reason = choice.finish_reason.map(|reason| match reason {
            async_openai::types::FinishReason::Stop => FinishReason::Stop,
            async_openai::types::FinishReason::Length => FinishReason::Length,
            async_openai::types::FinishReason::ContentFilter => FinishReason::ContentFilter,
            other => FinishReason::Other(format!("{:?}", other)),
        });

        Ok(LlmResponse {
            message,
            usage,
            model: response.model,
            finish_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Protocol;

    fn azure_settings() -> ResolvedLlmConfig {
        ResolvedLlmConfig::new(
            Protocol::AzureOpenAI,
            "https://example.openai.azure.com/".to_string(),
            "azure-key".to_string(),
            "my-deployment".to_string(),
        )
    }

    #[test]
    fn test_azure_uses_deployment_url_and_api_key_header() {
        let config = azure_config(&azure_settings());

        assert_eq!(
            config.url("/chat/completions"),
            "https://example.openai.azure.com/openai/deployments/my-deployment/chat/completions"
        );
        assert_eq!(config.query(), vec![("api-version", DEFAULT_AZURE_API_VERSION)]);
        assert_eq!(config.headers()["api-key"], "azure-key");
    }

    #[test]
    fn test_azure_api_version_override() {
        let settings = azure_settings().with_api_version("2025-01-01-preview");
        let config = azure_config(&settings);
        assert_eq!(config.query(), vec![("api-version", "2025-01-01-preview")]);
    }

    #[test]
    fn test_provider_names() {
        let openai = ResolvedLlmConfig::new(
            Protocol::OpenAICompat,
            "https://api.openai.com/v1".to_string(),
            "key".to_string(),
            "gpt-4o-mini".to_string(),
        );
        assert_eq!(OpenAiClient::new(&openai).unwrap().provider_name(), "openai");

        let azure = OpenAiClient::azure(&azure_settings()).unwrap();
        assert_eq!(azure.provider_name(), "azure_openai");
        assert_eq!(azure.model_name(), "my-deployment");
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let mut settings = azure_settings();
        settings.api_key.clear();
        assert!(OpenAiClient::azure(&settings).is_err());
    }
}
