//! CLI configuration loader for docshift
//!
//! Implements single-source priority loading with flag overrides:
//! 1. --config file/dir (highest priority)
//! 2. Current working directory: ./docshift.json or ./.docshift/config.json
//! 3. Git repository root: <repo_root>/.docshift/config.json
//! 4. XDG config: $XDG_CONFIG_HOME/docshift/config.json or ~/.config/docshift/config.json
//! 5. Environment variables only (no files)
//!
//! The model section is optional everywhere. Without one, docshift runs with
//! literal search and literal replacement only.

use anyhow::{anyhow, Context, Result};
use docshift_core::{EngineConfig, ModelParams, Protocol, ResolvedLlmConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Model section of a config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLlmConfig {
    /// Protocol to use
    pub protocol: String,
    /// API key (can be "env:VAR_NAME" for environment variable)
    pub api_key: String,
    /// Base URL (optional, uses protocol default if not specified)
    pub base_url: Option<String>,
    /// Model name (optional, uses protocol default if not specified)
    pub model: Option<String>,
    /// Model parameters (optional)
    #[serde(default)]
    pub params: ModelParams,
    /// Additional headers (optional)
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Azure OpenAI `api-version` (optional)
    #[serde(default)]
    pub api_version: Option<String>,
}

/// Raw configuration file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub llm: Option<RawLlmConfig>,
    /// Matching and planning heuristics
    #[serde(default)]
    pub engine: EngineConfig,
    /// Where documents are saved; `~` is expanded
    #[serde(default)]
    pub data_dir: Option<String>,
    /// Default user key
    #[serde(default)]
    pub user: Option<String>,
}

/// Where the configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Environment,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// Fully resolved settings for one CLI invocation
#[derive(Debug, Clone)]
pub struct CliSettings {
    pub source: ConfigSource,
    pub llm: Option<ResolvedLlmConfig>,
    pub engine: EngineConfig,
    pub data_dir: PathBuf,
    pub user: String,
}

/// CLI configuration loader
#[derive(Default)]
pub struct CliConfigLoader {
    /// Override config file/directory path
    config_override: Option<PathBuf>,
    /// Flag overrides
    protocol_override: Option<String>,
    api_key_override: Option<String>,
    base_url_override: Option<String>,
    model_override: Option<String>,
    user_override: Option<String>,
    data_dir_override: Option<PathBuf>,
}

impl CliConfigLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Set config file/directory override
    pub fn with_config_override(mut self, path: PathBuf) -> Self {
        self.config_override = Some(path);
        self
    }

    /// Set protocol override
    pub fn with_protocol_override(mut self, protocol: String) -> Self {
        self.protocol_override = Some(protocol);
        self
    }

    /// Set API key override
    pub fn with_api_key_override(mut self, api_key: String) -> Self {
        self.api_key_override = Some(api_key);
        self
    }

    /// Set base URL override
    pub fn with_base_url_override(mut self, base_url: String) -> Self {
        self.base_url_override = Some(base_url);
        self
    }

    /// Set model override
    pub fn with_model_override(mut self, model: String) -> Self {
        self.model_override = Some(model);
        self
    }

    /// Set user key override
    pub fn with_user_override(mut self, user: String) -> Self {
        self.user_override = Some(user);
        self
    }

    /// Set data directory override
    pub fn with_data_dir_override(mut self, data_dir: PathBuf) -> Self {
        self.data_dir_override = Some(data_dir);
        self
    }

    /// Load and resolve configuration
    pub async fn load(&self) -> Result<CliSettings> {
        // Step 1: Find and load base configuration
        let (mut config, source) = if let Some(override_path) = &self.config_override {
            let (config, path) = self.load_from_path(override_path).await.with_context(|| {
                format!(
                    "Failed to load config from override path: {}",
                    override_path.display()
                )
            })?;
            (config, ConfigSource::File(path))
        } else {
            self.search_and_load().await?
        };
        debug!("Configuration source: {}", source);

        // Step 2: Fill the model section from the environment when the file has none
        if config.llm.is_none() {
            config.llm = self.llm_from_env()?;
        }

        // Step 3: Apply flag overrides
        self.apply_overrides(&mut config);

        // Step 4: Resolve to final settings
        let llm = match config.llm {
            Some(raw) => Some(self.resolve_llm(raw)?),
            None => None,
        };

        Ok(CliSettings {
            source,
            llm,
            engine: config.engine,
            data_dir: self.resolve_data_dir(config.data_dir.as_deref()),
            user: self.resolve_user(config.user),
        })
    }

    /// Search for config in priority order
    async fn search_and_load(&self) -> Result<(RawConfig, ConfigSource)> {
        let cwd = std::env::current_dir()?;

        // 1. Current working directory
        for candidate in [
            cwd.join("docshift.json"),
            cwd.join(".docshift").join("config.json"),
        ] {
            if candidate.exists() {
                return Ok((self.load_file(&candidate).await?, ConfigSource::File(candidate)));
            }
        }

        // 2. Git repository root
        if let Some(git_root) = find_git_root(&cwd) {
            let candidate = git_root.join(".docshift").join("config.json");
            if candidate.exists() {
                return Ok((self.load_file(&candidate).await?, ConfigSource::File(candidate)));
            }
        }

        // 3. XDG config directory
        if let Some(config_dir) = xdg_config_dir() {
            let candidate = config_dir.join("docshift").join("config.json");
            if candidate.exists() {
                return Ok((self.load_file(&candidate).await?, ConfigSource::File(candidate)));
            }
        }

        // 4. Environment variables only
        Ok((RawConfig::default(), ConfigSource::Environment))
    }

    /// Build a model section from provider API keys in the environment
    fn llm_from_env(&self) -> Result<Option<RawLlmConfig>> {
        let keys = [
            ("openai", "OPENAI_API_KEY"),
            ("anthropic", "ANTHROPIC_API_KEY"),
            ("google_ai", "GOOGLE_API_KEY"),
        ];
        let available: Vec<(&str, String)> = keys
            .iter()
            .filter_map(|(protocol, var)| {
                std::env::var(var)
                    .ok()
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| (*protocol, v))
            })
            .collect();

        let env_protocol = std::env::var("DOCSHIFT_PROTOCOL").ok();
        let preference = self
            .protocol_override
            .as_ref()
            .or(env_protocol.as_ref())
            .map(|p| Protocol::parse(p));

        let chosen = match &preference {
            Some(preferred) => {
                let found = available
                    .iter()
                    .find(|(protocol, _)| Protocol::parse(protocol) == *preferred);
                match (found, &self.api_key_override) {
                    (Some(found), _) => Some(found.clone()),
                    // The key will come from --api-key
                    (None, Some(_)) => Some((preferred.as_str(), String::new())),
                    (None, None) if available.is_empty() => None,
                    (None, None) => {
                        return Err(anyhow!(
                            "Protocol '{}' specified but no corresponding API key found. Available keys: {}",
                            preferred.as_str(),
                            available
                                .iter()
                                .map(|(p, _)| *p)
                                .collect::<Vec<_>>()
                                .join(", ")
                        ))
                    }
                }
            }
            None => match available.len() {
                0 if self.api_key_override.is_some() => Some(("openai", String::new())),
                0 => None,
                1 => available.first().cloned(),
                _ => {
                    return Err(anyhow!(
                        "Multiple API keys detected: {}. Please specify which protocol to use with DOCSHIFT_PROTOCOL or --protocol",
                        available
                            .iter()
                            .map(|(p, _)| *p)
                            .collect::<Vec<_>>()
                            .join(", ")
                    ))
                }
            },
        };

        Ok(chosen.map(|(protocol, api_key)| RawLlmConfig {
            protocol: protocol.to_string(),
            api_key,
            base_url: std::env::var("DOCSHIFT_BASE_URL").ok(),
            model: std::env::var("DOCSHIFT_MODEL").ok(),
            params: ModelParams::default(),
            headers: HashMap::new(),
            api_version: None,
        }))
    }

    fn apply_overrides(&self, config: &mut RawConfig) {
        let Some(llm) = config.llm.as_mut() else {
            return;
        };

        if let Some(protocol) = &self.protocol_override {
            llm.protocol = protocol.clone();
        }
        if let Some(api_key) = &self.api_key_override {
            llm.api_key = api_key.clone();
        }
        if let Some(base_url) = &self.base_url_override {
            llm.base_url = Some(base_url.clone());
        }
        if let Some(model) = &self.model_override {
            llm.model = Some(model.clone());
        }
    }

    /// Load configuration from a specific path (file or directory)
    async fn load_from_path(&self, path: &Path) -> Result<(RawConfig, PathBuf)> {
        if path.is_file() {
            Ok((self.load_file(path).await?, path.to_path_buf()))
        } else if path.is_dir() {
            // Try config.json in the directory
            let config_file = path.join("config.json");
            if config_file.exists() {
                Ok((self.load_file(&config_file).await?, config_file))
            } else {
                Err(anyhow!(
                    "No config.json found in directory: {}",
                    path.display()
                ))
            }
        } else {
            Err(anyhow!("Config path does not exist: {}", path.display()))
        }
    }

    /// Load a single config file
    async fn load_file(&self, path: &Path) -> Result<RawConfig> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Resolve the model section to a validated client configuration
    fn resolve_llm(&self, config: RawLlmConfig) -> Result<ResolvedLlmConfig> {
        let protocol = Protocol::parse(&config.protocol);

        // Resolve API key (handle env: prefix)
        let api_key = match config.api_key.strip_prefix("env:") {
            Some(var_name) => std::env::var(var_name)
                .with_context(|| format!("Environment variable not found: {}", var_name))?,
            None => config.api_key,
        };

        let base_url = match config.base_url {
            Some(base_url) => base_url,
            None => protocol
                .default_base_url()
                .map(str::to_string)
                .ok_or_else(|| {
                    anyhow!(
                        "Protocol '{}' has no default base URL; set base_url",
                        protocol.as_str()
                    )
                })?,
        };

        let model = config
            .model
            .unwrap_or_else(|| protocol.default_model().to_string());

        let mut resolved = ResolvedLlmConfig::new(protocol, base_url, api_key, model)
            .with_params(config.params)
            .with_headers(config.headers);
        if let Some(api_version) = config.api_version {
            resolved = resolved.with_api_version(api_version);
        }

        // Validate
        resolved
            .validate()
            .map_err(|e| anyhow!("Configuration validation failed: {}", e))?;

        Ok(resolved)
    }

    fn resolve_data_dir(&self, configured: Option<&str>) -> PathBuf {
        if let Some(dir) = &self.data_dir_override {
            return expand(&dir.to_string_lossy());
        }
        if let Some(dir) = configured {
            return expand(dir);
        }
        dirs::data_dir()
            .map(|dir| dir.join("docshift"))
            .unwrap_or_else(|| PathBuf::from(".docshift").join("data"))
    }

    fn resolve_user(&self, configured: Option<String>) -> String {
        self.user_override
            .clone()
            .or(configured)
            .or_else(|| std::env::var("USER").ok())
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| "default".to_string())
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// Find git repository root
fn find_git_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

/// Get XDG config directory
fn xdg_config_dir() -> Option<PathBuf> {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_config(dir: &Path, json: &str) -> PathBuf {
        let path = dir.join("docshift.json");
        std::fs::write(&path, json).unwrap();
        path
    }

    #[tokio::test]
    async fn test_file_with_model_section() {
        let dir = tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"{
                "llm": {"protocol": "anthropic", "api_key": "sk-ant-secret-9876"},
                "engine": {"relevance_threshold": 8},
                "data_dir": "/tmp/docshift-data",
                "user": "alice"
            }"#,
        );

        let settings = CliConfigLoader::new()
            .with_config_override(path.clone())
            .load()
            .await
            .unwrap();

        let llm = settings.llm.unwrap();
        assert_eq!(llm.protocol, Protocol::Anthropic);
        assert_eq!(llm.model, "claude-3-5-sonnet-20241022");
        assert_eq!(llm.base_url, "https://api.anthropic.com");
        assert_eq!(settings.engine.relevance_threshold, 8);
        assert_eq!(settings.engine.context_radius, 50);
        assert_eq!(settings.data_dir, PathBuf::from("/tmp/docshift-data"));
        assert_eq!(settings.user, "alice");
        assert_eq!(settings.source, ConfigSource::File(path));
    }

    #[tokio::test]
    async fn test_flags_override_file() {
        let dir = tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"{"llm": {"protocol": "openai", "api_key": "sk-file", "model": "gpt-4o"}, "user": "alice"}"#,
        );

        let settings = CliConfigLoader::new()
            .with_config_override(dir.path().to_path_buf())
            .with_model_override("gpt-4o-mini".to_string())
            .with_api_key_override("sk-flag".to_string())
            .with_user_override("bob".to_string())
            .with_data_dir_override(dir.path().join("data"))
            .load()
            .await;
        // A directory override needs config.json, not docshift.json
        assert!(settings.is_err());

        let settings = CliConfigLoader::new()
            .with_config_override(path)
            .with_model_override("gpt-4o-mini".to_string())
            .with_api_key_override("sk-flag".to_string())
            .with_user_override("bob".to_string())
            .with_data_dir_override(dir.path().join("data"))
            .load()
            .await
            .unwrap();

        let llm = settings.llm.unwrap();
        assert_eq!(llm.model, "gpt-4o-mini");
        assert_eq!(llm.api_key, "sk-flag");
        assert_eq!(settings.user, "bob");
        assert_eq!(settings.data_dir, dir.path().join("data"));
    }

    #[tokio::test]
    async fn test_azure_requires_base_url() {
        let dir = tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"{"llm": {"protocol": "azure_openai", "api_key": "k"}}"#,
        );
        let err = CliConfigLoader::new()
            .with_config_override(path)
            .load()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[tokio::test]
    async fn test_azure_deployment_settings() {
        let dir = tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"{"llm": {"protocol": "azure_openai", "api_key": "k",
                "base_url": "https://example.openai.azure.com",
                "model": "my-deployment", "api_version": "2025-01-01-preview"}}"#,
        );
        let settings = CliConfigLoader::new()
            .with_config_override(path)
            .load()
            .await
            .unwrap();
        let llm = settings.llm.unwrap();
        assert_eq!(llm.protocol, Protocol::AzureOpenAI);
        assert_eq!(llm.model, "my-deployment");
        assert_eq!(llm.api_version.as_deref(), Some("2025-01-01-preview"));
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = write_config(dir.path(), "{ nope");
        assert!(CliConfigLoader::new()
            .with_config_override(path)
            .load()
            .await
            .is_err());
    }

    #[test]
    fn test_tilde_expansion() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand("~/docs"), home.join("docs"));
        }
        assert_eq!(expand("/abs/path"), PathBuf::from("/abs/path"));
    }
}
