//! Configuration management for deepagent
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/deepagent/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::core::error::{DeepAgentError, Result};

/// Main configuration for deepagent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Which model provider to use
    #[serde(default)]
    pub provider: ProviderType,
    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
    /// OpenAI-compatible API configuration
    #[serde(default)]
    pub openai: OpenAiConfig,
    /// Anthropic Messages API configuration
    #[serde(default)]
    pub anthropic: AnthropicConfig,
    /// Model configuration
    #[serde(default)]
    pub models: ModelConfig,
    /// Agent loop configuration
    #[serde(default)]
    pub agent: AgentConfig,
    /// Thread checkpoint storage
    #[serde(default)]
    pub storage: StorageConfig,
    /// Extra sub-agents available for delegation
    #[serde(default)]
    pub sub_agents: Vec<SubAgentConfig>,
}

/// Supported model providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// Local Ollama server
    Ollama,
    /// OpenAI chat completions (or a compatible endpoint)
    OpenAi,
    /// Anthropic Messages API
    Anthropic,
    /// Scripted offline provider
    Mock,
}

impl Default for ProviderType {
    fn default() -> Self {
        if let Ok(value) = env::var("DEEPAGENT_PROVIDER") {
            if let Ok(provider) = value.parse() {
                return provider;
            }
        }
        let has_key = |name: &str| env::var(name).is_ok_and(|k| !k.is_empty());
        if has_key("OPENAI_API_KEY") {
            ProviderType::OpenAi
        } else if has_key("ANTHROPIC_API_KEY") {
            ProviderType::Anthropic
        } else {
            ProviderType::Ollama
        }
    }
}

impl std::str::FromStr for ProviderType {
    type Err = DeepAgentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(ProviderType::Ollama),
            "openai" => Ok(ProviderType::OpenAi),
            "anthropic" => Ok(ProviderType::Anthropic),
            "mock" => Ok(ProviderType::Mock),
            other => Err(DeepAgentError::config(format!(
                "Unknown provider '{}'. Use 'ollama', 'openai', 'anthropic' or 'mock'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderType::Ollama => write!(f, "ollama"),
            ProviderType::OpenAi => write!(f, "openai"),
            ProviderType::Anthropic => write!(f, "anthropic"),
            ProviderType::Mock => write!(f, "mock"),
        }
    }
}

/// Ollama server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Host address (default: localhost)
    pub host: String,
    /// Port number (default: 11434)
    pub port: u16,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// OpenAI-compatible API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key; required when the provider is `openai`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL of the API (default: https://api.openai.com/v1)
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Anthropic API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// API key; required when the provider is `anthropic`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL of the API (default: https://api.anthropic.com/v1)
    pub base_url: String,
    /// Upper bound on tokens per reply
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model used by the agent and its sub-agents.
    /// Empty means "provider default"
    #[serde(default)]
    pub default: String,
    /// Sampling temperature
    pub temperature: f32,
}

/// Agent loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum model invocations per request before the loop gives up.
    /// 0 disables the limit
    pub max_steps: usize,
    /// Replaces the built-in system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Whether to show debug output
    pub debug: bool,
}

/// Where thread checkpoints live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory only
    Memory,
    /// One JSON file per thread
    File,
}

impl std::str::FromStr for StorageBackend {
    type Err = DeepAgentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "file" => Ok(StorageBackend::File),
            other => Err(DeepAgentError::config(format!(
                "Unknown storage backend '{}'. Use 'memory' or 'file'",
                other
            ))),
        }
    }
}

/// Checkpoint storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage backend
    pub backend: StorageBackend,
    /// Directory for the file backend (default: <config dir>/threads)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_dir: Option<PathBuf>,
}

/// A sub-agent declared in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubAgentConfig {
    pub name: String,
    pub description: String,
    pub system_prompt: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderType::default(),
            ollama: OllamaConfig::default(),
            openai: OpenAiConfig::default(),
            anthropic: AnthropicConfig::default(),
            models: ModelConfig::default(),
            agent: AgentConfig::default(),
            storage: StorageConfig::default(),
            sub_agents: Vec::new(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: env::var("OLLAMA_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("OLLAMA_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(11434),
            timeout_secs: 120,
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            timeout_secs: 120,
        }
    }
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: env::var("ANTHROPIC_API_KEY").ok().filter(|k| !k.is_empty()),
            base_url: env::var("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com/v1".to_string()),
            max_tokens: 4096,
            timeout_secs: 120,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            default: env::var("DEEPAGENT_MODEL").unwrap_or_default(),
            temperature: 0.0,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: 25,
            system_prompt: None,
            debug: env::var("DEEPAGENT_DEBUG")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            checkpoint_dir: None,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("deepagent")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > config file > env vars > defaults
    pub fn load() -> Self {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        if let Ok(config) = Self::load_from_file() {
            return config;
        }

        // Fall back to defaults (which respect env vars)
        Self::default()
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(DeepAgentError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| DeepAgentError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| DeepAgentError::config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).map_err(|e| {
                DeepAgentError::config(format!("Failed to create config dir: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| DeepAgentError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| DeepAgentError::config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Get the full Ollama API URL
    pub fn ollama_url(&self) -> String {
        format!("http://{}:{}", self.ollama.host, self.ollama.port)
    }

    /// Model name to use, falling back to the provider's default
    pub fn model_name(&self) -> String {
        if !self.models.default.is_empty() {
            return self.models.default.clone();
        }
        match self.provider {
            ProviderType::OpenAi => "gpt-4o".to_string(),
            ProviderType::Anthropic => "claude-3-5-sonnet-20240620".to_string(),
            ProviderType::Ollama => "qwen3:8b".to_string(),
            ProviderType::Mock => "mock".to_string(),
        }
    }

    /// Step limit for the agent loop (`None` = unlimited)
    pub fn max_steps(&self) -> Option<usize> {
        match self.agent.max_steps {
            0 => None,
            n => Some(n),
        }
    }

    /// Directory used by the file checkpoint backend
    pub fn checkpoint_dir(&self) -> PathBuf {
        self.storage
            .checkpoint_dir
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("threads"))
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config)
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }
}
