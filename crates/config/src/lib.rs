//! Configuration loading, validation, and management for ReactLoop.
//!
//! Loads configuration from `~/.reactloop/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.reactloop/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Control loop budgets and prompts
    #[serde(default)]
    pub agent: AgentConfig,

    /// Model client retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Built-in tool settings
    #[serde(default)]
    pub tools: ToolsConfig,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    8000
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("agent", &self.agent)
            .field("retry", &self.retry)
            .field("providers", &self.providers)
            .field("tools", &self.tools)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl std::fmt::Debug for ToolsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolsConfig")
            .field("ares_api_key", &redact(&self.ares_api_key))
            .field("ares_url", &self.ares_url)
            .field("interpreter", &self.interpreter)
            .field("exec_timeout_secs", &self.exec_timeout_secs)
            .field("output_dir", &self.output_dir)
            .field("embedding_model", &self.embedding_model)
            .field("code_model", &self.code_model)
            .field("data_model", &self.data_model)
            .field("enable_planner", &self.enable_planner)
            .field("enable_notes", &self.enable_notes)
            .finish()
    }
}

/// Budgets and prompts for the reasoning-action loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum generation rounds per run
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    /// Maximum tool invocations per run
    #[serde(default = "default_max_tool_calls")]
    pub max_tool_calls: u32,

    /// Extra system prompt placed before the tool catalogue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// End the run when a response has neither actions nor a final answer
    #[serde(default = "default_true")]
    pub stop_on_bare_response: bool,
}

fn default_max_steps() -> u32 {
    2
}
fn default_max_tool_calls() -> u32 {
    2
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            max_tool_calls: default_max_tool_calls(),
            system_prompt: None,
            stop_on_bare_response: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts per generation, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed sleep after a rate-limited attempt
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,
}

fn default_max_attempts() -> u32 {
    5
}
fn default_backoff_secs() -> u64 {
    10
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_secs: default_backoff_secs(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Key for the Ares internet search API; the tool is only built when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ares_api_key: Option<String>,

    #[serde(default = "default_ares_url")]
    pub ares_url: String,

    /// Interpreter used by the code and data tools
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    #[serde(default = "default_exec_timeout_secs")]
    pub exec_timeout_secs: u64,

    /// Where generated files (slide decks) are written
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Model override for code generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_model: Option<String>,

    /// Model override for data analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_model: Option<String>,

    #[serde(default = "default_true")]
    pub enable_planner: bool,

    #[serde(default = "default_true")]
    pub enable_notes: bool,
}

fn default_ares_url() -> String {
    "https://api-ares.traversaal.ai/live/predict".into()
}
fn default_interpreter() -> String {
    "python3".into()
}
fn default_exec_timeout_secs() -> u64 {
    60
}
fn default_output_dir() -> String {
    ".".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ares_api_key: None,
            ares_url: default_ares_url(),
            interpreter: default_interpreter(),
            exec_timeout_secs: default_exec_timeout_secs(),
            output_dir: default_output_dir(),
            embedding_model: default_embedding_model(),
            code_model: None,
            data_model: None,
            enable_planner: true,
            enable_notes: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.reactloop/config.toml).
    ///
    /// Environment variables override the file, see [`AppConfig::apply_env`].
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    ///
    /// - `REACTLOOP_API_KEY` (highest priority)
    /// - `OPENROUTER_API_KEY`, which also selects the `openrouter` provider
    /// - `OPENAI_API_KEY`
    /// - `REACTLOOP_PROVIDER`, `REACTLOOP_MODEL` / `MODEL_NAME`
    /// - `TRAVERSAAL_ARES_API_KEY`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            if let Some(key) = lookup("REACTLOOP_API_KEY") {
                self.api_key = Some(key);
            } else if let Some(key) = lookup("OPENROUTER_API_KEY") {
                self.api_key = Some(key);
                self.default_provider = "openrouter".into();
            } else if let Some(key) = lookup("OPENAI_API_KEY") {
                self.api_key = Some(key);
            }
        }

        if let Some(provider) = lookup("REACTLOOP_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("REACTLOOP_MODEL").or_else(|| lookup("MODEL_NAME")) {
            self.default_model = model;
        }

        if self.tools.ares_api_key.is_none() {
            self.tools.ares_api_key = lookup("TRAVERSAAL_ARES_API_KEY");
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".reactloop")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_steps == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_steps must be at least 1".into(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// A copy with every secret replaced by a placeholder, for display.
    pub fn redacted(&self) -> Self {
        let hide = |s: &Option<String>| s.as_ref().map(|_| "[REDACTED]".to_string());
        let mut config = self.clone();
        config.api_key = hide(&self.api_key);
        config.tools.ares_api_key = hide(&self.tools.ares_api_key);
        for provider in config.providers.values_mut() {
            provider.api_key = hide(&provider.api_key);
        }
        config
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            agent: AgentConfig::default(),
            retry: RetryConfig::default(),
            providers: HashMap::new(),
            tools: ToolsConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.agent.max_steps, 2);
        assert_eq!(config.agent.max_tool_calls, 2);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.backoff_secs, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.agent.max_steps, config.agent.max_steps);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_step_ceiling_rejected() {
        let mut config = AppConfig::default();
        config.agent.max_steps = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().default_model, "gpt-4o-mini");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_model = "gpt-4o"

[agent]
max_steps = 6
system_prompt = "You are a study assistant."

[tools]
enable_planner = false
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.agent.max_steps, 6);
        assert_eq!(config.agent.max_tool_calls, 2);
        assert_eq!(
            config.agent.system_prompt.as_deref(),
            Some("You are a study assistant.")
        );
        assert!(!config.tools.enable_planner);
        assert_eq!(config.tools.interpreter, "python3");
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "agent = [").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn openrouter_key_selects_openrouter() {
        let mut config = AppConfig::default();
        config.apply_env(env_of(&[
            ("OPENROUTER_API_KEY", "sk-or-test"),
            ("MODEL_NAME", "meta-llama/llama-3-8b"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("sk-or-test"));
        assert_eq!(config.default_provider, "openrouter");
        assert_eq!(config.default_model, "meta-llama/llama-3-8b");
    }

    #[test]
    fn explicit_key_wins_over_provider_keys() {
        let mut config = AppConfig::default();
        config.apply_env(env_of(&[
            ("REACTLOOP_API_KEY", "sk-generic"),
            ("OPENROUTER_API_KEY", "sk-or-test"),
            ("TRAVERSAAL_ARES_API_KEY", "ares-key"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("sk-generic"));
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.tools.ares_api_key.as_deref(), Some("ares-key"));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut config = AppConfig::default();
        config.api_key = Some("sk-secret".into());
        config.tools.ares_api_key = Some("ares-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(!debug.contains("ares-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn redacted_copy_hides_every_key() {
        let mut config = AppConfig::default();
        config.api_key = Some("sk-secret".into());
        config.providers.insert(
            "openrouter".into(),
            ProviderConfig {
                api_key: Some("sk-or-secret".into()),
                ..ProviderConfig::default()
            },
        );
        let rendered = toml::to_string_pretty(&config.redacted()).unwrap();
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("[REDACTED]"));
        assert!(config.redacted().tools.ares_api_key.is_none());
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-4o-mini"));
        assert!(toml_str.contains("max_tool_calls"));
    }
}
