//! LLM provider implementations

pub mod anthropic;
pub mod google;
pub mod openai;

pub use anthropic::AnthropicClient;
pub use google::GoogleAiClient;
pub use openai::OpenAiClient;

use crate::config::{Protocol, ResolvedLlmConfig};
use crate::error::{ConfigError, Result};
use crate::llm::LlmClient;
use std::sync::Arc;

/// Create an LLM client based on protocol
pub fn create_client(config: &ResolvedLlmConfig) -> Result<Arc<dyn LlmClient>> {
    let client: Arc<dyn LlmClient> = match &config.protocol {
        Protocol::OpenAICompat => Arc::new(OpenAiClient::new(config)?),
        Protocol::Anthropic => Arc::new(AnthropicClient::new(config)?),
        Protocol::GoogleAI => Arc::new(GoogleAiClient::new(config)?),
        Protocol::AzureOpenAI => Arc::new(OpenAiClient::azure(config)?),
        Protocol::Custom(name) => {
            return Err(ConfigError::UnsupportedProtocol {
                protocol: name.clone(),
            }
            .into())
        }
    };

    tracing::debug!(
        "Created {} client for model {}",
        client.provider_name(),
        client.model_name()
    );

    Ok(client)
}
