//! Configuration loading, validation, and management for HenryBot.
//!
//! Loads configuration from `~/.henrybot/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use henrybot_core::EarlyStopping;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The root configuration structure.
///
/// Maps directly to `~/.henrybot/config.toml`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the model service (chat + embeddings)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub embeddings: EmbeddingsConfig,

    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub discord: DiscordConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

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
            .field("model", &self.model)
            .field("embeddings", &self.embeddings)
            .field("knowledge", &self.knowledge)
            .field("agent", &self.agent)
            .field("discord", &self.discord)
            .field("tools", &self.tools)
            .finish()
    }
}

/// Chat model knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_model_name")]
    pub name: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Nucleus sampling probability
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model_name() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_model_timeout() -> u64 {
    120
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            name: default_model_name(),
            temperature: default_temperature(),
            max_tokens: None,
            top_p: None,
            timeout_secs: default_model_timeout(),
        }
    }
}

/// Which embedding function backs the knowledge store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
    /// The model service's `/embeddings` endpoint
    #[default]
    Provider,
    /// Local feature hashing, no network
    Hashing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(default)]
    pub backend: EmbeddingBackend,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector length. Must match the model for the provider backend.
    #[serde(default = "default_embedding_dimensions")]
    pub dimensions: usize,
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_embedding_dimensions() -> usize {
    1536
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            model: default_embedding_model(),
            dimensions: default_embedding_dimensions(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    #[serde(default)]
    pub backend: KnowledgeBackend,

    /// SQLite file; defaults to `~/.henrybot/knowledge.db`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Documents returned per retrieval
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    4
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            backend: KnowledgeBackend::default(),
            path: None,
            top_k: default_top_k(),
        }
    }
}

impl KnowledgeConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("knowledge.db"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Decide→Act cycles before the early-stopping policy applies
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    #[serde(default)]
    pub early_stopping: EarlyStopping,

    /// Replace the built-in persona entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,
}

fn default_max_iterations() -> u32 {
    10
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            early_stopping: EarlyStopping::default(),
            system_prompt_override: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default = "default_discord_api_url")]
    pub api_url: String,

    /// The only channel the bot answers in
    #[serde(default)]
    pub channel_id: String,

    /// The bot's own user id
    #[serde(default)]
    pub bot_id: String,

    /// Also ignore messages from every other bot account
    #[serde(default)]
    pub ignore_other_bots: bool,

    /// Transport hard cap per message, in characters
    #[serde(default = "default_message_limit")]
    pub message_limit: usize,

    /// Prior messages fed to the agent as context
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_discord_api_url() -> String {
    "https://discord.com/api/v10".into()
}
fn default_message_limit() -> usize {
    2000
}
fn default_history_limit() -> usize {
    20
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: default_discord_api_url(),
            channel_id: String::new(),
            bot_id: String::new(),
            ignore_other_bots: false,
            message_limit: default_message_limit(),
            history_limit: default_history_limit(),
        }
    }
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &redact(&self.token))
            .field("api_url", &self.api_url)
            .field("channel_id", &self.channel_id)
            .field("bot_id", &self.bot_id)
            .field("ignore_other_bots", &self.ignore_other_bots)
            .field("message_limit", &self.message_limit)
            .field("history_limit", &self.history_limit)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Per-request timeout for every outbound tool call
    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_api_key: Option<String>,

    /// Programmable search engine id (`cx`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_cse_id: Option<String>,

    #[serde(default = "default_google_api_url")]
    pub google_api_url: String,

    #[serde(default = "default_wikipedia_api_url")]
    pub wikipedia_api_url: String,

    #[serde(default = "default_wikipedia_top_k")]
    pub wikipedia_top_k: usize,

    /// Characters kept from each encyclopedia article
    #[serde(default = "default_wikipedia_max_chars")]
    pub wikipedia_max_chars: usize,

    /// Page text handed to the summarizer
    #[serde(default = "default_browse_max_chars")]
    pub browse_max_chars: usize,

    #[serde(default = "default_browse_max_links")]
    pub browse_max_links: usize,
}

fn default_tool_timeout() -> u64 {
    30
}
fn default_google_api_url() -> String {
    "https://www.googleapis.com/customsearch/v1".into()
}
fn default_wikipedia_api_url() -> String {
    "https://en.wikipedia.org/w/api.php".into()
}
fn default_wikipedia_top_k() -> usize {
    3
}
fn default_wikipedia_max_chars() -> usize {
    4000
}
fn default_browse_max_chars() -> usize {
    12_000
}
fn default_browse_max_links() -> usize {
    5
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_tool_timeout(),
            google_api_key: None,
            google_cse_id: None,
            google_api_url: default_google_api_url(),
            wikipedia_api_url: default_wikipedia_api_url(),
            wikipedia_top_k: default_wikipedia_top_k(),
            wikipedia_max_chars: default_wikipedia_max_chars(),
            browse_max_chars: default_browse_max_chars(),
            browse_max_links: default_browse_max_links(),
        }
    }
}

impl std::fmt::Debug for ToolsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolsConfig")
            .field("timeout_secs", &self.timeout_secs)
            .field("google_api_key", &redact(&self.google_api_key))
            .field("google_cse_id", &self.google_cse_id)
            .field("google_api_url", &self.google_api_url)
            .field("wikipedia_api_url", &self.wikipedia_api_url)
            .field("wikipedia_top_k", &self.wikipedia_top_k)
            .field("wikipedia_max_chars", &self.wikipedia_max_chars)
            .field("browse_max_chars", &self.browse_max_chars)
            .field("browse_max_links", &self.browse_max_links)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.henrybot/config.toml)
    /// and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path, |name| std::env::var(name).ok())
    }

    /// Load from `path`, then apply overrides read through `lookup`.
    pub fn load_with_env(
        path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path (no env overrides).
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Environment variables win over the file.
    ///
    /// - `HENRYBOT_API_KEY`, then `OPENAI_API_KEY` (only if no key is set)
    /// - `MODEL_NAME`, `MODEL_TEMPERATURE`, `MODEL_MAX_TOKENS`, `MODEL_TOP_P`
    /// - `DISCORD_TOKEN`, `DISCORD_CHANNEL_ID`, `DISCORD_BOT_ID`
    /// - `GOOGLE_API_KEY`, `GOOGLE_CSE_ID`
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if self.api_key.is_none() {
            self.api_key = lookup("HENRYBOT_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(name) = lookup("MODEL_NAME") {
            self.model.name = name;
        }
        if let Some(value) = lookup("MODEL_TEMPERATURE") {
            self.model.temperature = parse_env("MODEL_TEMPERATURE", &value)?;
        }
        if let Some(value) = lookup("MODEL_MAX_TOKENS") {
            self.model.max_tokens = Some(parse_env("MODEL_MAX_TOKENS", &value)?);
        }
        if let Some(value) = lookup("MODEL_TOP_P") {
            self.model.top_p = Some(parse_env("MODEL_TOP_P", &value)?);
        }

        if let Some(token) = lookup("DISCORD_TOKEN") {
            self.discord.token = Some(token);
        }
        if let Some(channel) = lookup("DISCORD_CHANNEL_ID") {
            self.discord.channel_id = channel;
        }
        if let Some(bot) = lookup("DISCORD_BOT_ID") {
            self.discord.bot_id = bot;
        }

        if let Some(key) = lookup("GOOGLE_API_KEY") {
            self.tools.google_api_key = Some(key);
        }
        if let Some(cx) = lookup("GOOGLE_CSE_ID") {
            self.tools.google_cse_id = Some(cx);
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".henrybot")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigError::ValidationError(
                "model.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if let Some(top_p) = self.model.top_p
            && !(top_p > 0.0 && top_p <= 1.0)
        {
            return Err(ConfigError::ValidationError(
                "model.top_p must be in (0.0, 1.0]".into(),
            ));
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }

        if self.discord.message_limit < 16 {
            return Err(ConfigError::ValidationError(
                "discord.message_limit must be at least 16".into(),
            ));
        }

        if self.discord.history_limit > 100 {
            return Err(ConfigError::ValidationError(
                "discord.history_limit cannot exceed 100 (platform page size)".into(),
            ));
        }

        if self.knowledge.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "knowledge.top_k must be at least 1".into(),
            ));
        }

        if self.embeddings.dimensions == 0 {
            return Err(ConfigError::ValidationError(
                "embeddings.dimensions must be at least 1".into(),
            ));
        }

        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `init`).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

fn parse_env<T: FromStr>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidEnv {
        var: var.to_string(),
        reason: e.to_string(),
    })
}

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

    #[error("Environment variable {var} is invalid: {reason}")]
    InvalidEnv { var: String, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for henrybot_core::Error {
    fn from(e: ConfigError) -> Self {
        henrybot_core::Error::Config {
            message: e.to_string(),
        }
    }
}
