//! Resolved LLM configuration types
//!
//! Core only accepts fully resolved, validated configuration.
//! All discovery, loading, and merging happens in CLI layer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Supported LLM protocols
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    /// OpenAI-compatible API (includes OpenAI, many proxies, local models)
    #[serde(rename = "openai_compat")]
    OpenAICompat,
    /// Anthropic Claude API
    #[serde(rename = "anthropic")]
    Anthropic,
    /// Google AI API (Gemini)
    #[serde(rename = "google_ai")]
    GoogleAI,
    /// Azure OpenAI API
    #[serde(rename = "azure_openai")]
    AzureOpenAI,
    /// Custom protocol
    #[serde(rename = "custom")]
    Custom(String),
}

impl Protocol {
    /// Parse a protocol name as written in config files and flags
    pub fn parse(name: &str) -> Self {
        match name {
            "openai" | "openai_compat" => Protocol::OpenAICompat,
            "anthropic" => Protocol::Anthropic,
            "google_ai" | "google" | "gemini" => Protocol::GoogleAI,
            "azure_openai" => Protocol::AzureOpenAI,
            custom => Protocol::Custom(custom.to_string()),
        }
    }

    /// Get the protocol name as a string
    pub fn as_str(&self) -> &str {
        match self {
            Protocol::OpenAICompat => "openai_compat",
            Protocol::Anthropic => "anthropic",
            Protocol::GoogleAI => "google_ai",
            Protocol::AzureOpenAI => "azure_openai",
            Protocol::Custom(name) => name,
        }
    }

    /// Get the default base URL for this protocol
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            Protocol::OpenAICompat => Some("https://api.openai.com/v1"),
            Protocol::Anthropic => Some("https://api.anthropic.com"),
            Protocol::GoogleAI => Some("https://generativelanguage.googleapis.com/v1beta"),
            Protocol::AzureOpenAI => None, // Requires custom endpoint
            Protocol::Custom(_) => None,
        }
    }

    /// Get the default model for this protocol
    pub fn default_model(&self) -> &'static str {
        match self {
            Protocol::OpenAICompat | Protocol::AzureOpenAI => "gpt-4o-mini",
            Protocol::Anthropic => "claude-3-5-sonnet-20241022",
            Protocol::GoogleAI => "gemini-1.5-flash",
            Protocol::Custom(_) => "default",
        }
    }
}

/// Model parameters for LLM requests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelParams {
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Temperature for sampling (0.0 to 2.0)
    pub temperature: Option<f32>,
    /// Top-p sampling parameter
    pub top_p: Option<f32>,
}

/// A fully resolved LLM configuration ready for use by core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedLlmConfig {
    /// The protocol to use
    pub protocol: Protocol,
    /// Base URL for the API
    pub base_url: String,
    /// API key for authentication
    pub api_key: String,
    /// Model name/identifier
    pub model: String,
    /// Model parameters
    #[serde(default)]
    pub params: ModelParams,
    /// Additional headers for requests
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Azure OpenAI `api-version` query parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

impl ResolvedLlmConfig {
    /// Create a new resolved LLM config
    pub fn new(protocol: Protocol, base_url: String, api_key: String, model: String) -> Self {
        Self {
            protocol,
            base_url,
            api_key,
            model,
            params: ModelParams::default(),
            headers: HashMap::new(),
            api_version: None,
        }
    }

    /// Set model parameters
    pub fn with_params(mut self, params: ModelParams) -> Self {
        self.params = params;
        self
    }

    /// Add multiple headers
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Set the Azure OpenAI `api-version`
    pub fn with_api_version<S: Into<String>>(mut self, api_version: S) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    /// API key with everything but the last four characters hidden
    pub fn masked_api_key(&self) -> String {
        let visible: String = self
            .api_key
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("****{}", visible)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.is_empty() {
            return Err("API key cannot be empty".to_string());
        }

        if self.model.is_empty() {
            return Err("Model name cannot be empty".to_string());
        }

        if self.base_url.is_empty() {
            return Err("Base URL cannot be empty".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("Base URL must start with http:// or https://".to_string());
        }

        if let Some(temp) = self.params.temperature {
            if !(0.0..=2.0).contains(&temp) {
                return Err("Temperature must be between 0.0 and 2.0".to_string());
            }
        }

        if let Some(top_p) = self.params.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return Err("Top-p must be between 0.0 and 1.0".to_string());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ResolvedLlmConfig {
        ResolvedLlmConfig::new(
            Protocol::OpenAICompat,
            "https://api.openai.com/v1".to_string(),
            "sk-test-1234".to_string(),
            "gpt-4o-mini".to_string(),
        )
    }

    #[test]
    fn test_valid_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let mut cfg = config();
        cfg.base_url = "api.openai.com".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_temperature_out_of_range() {
        let cfg = config().with_params(ModelParams {
            temperature: Some(3.0),
            ..Default::default()
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_protocol_parse_aliases() {
        assert_eq!(Protocol::parse("openai"), Protocol::OpenAICompat);
        assert_eq!(Protocol::parse("gemini"), Protocol::GoogleAI);
        assert_eq!(
            Protocol::parse("ollama"),
            Protocol::Custom("ollama".to_string())
        );
    }

    #[test]
    fn test_masked_api_key() {
        assert_eq!(config().masked_api_key(), "****1234");
    }
}
