use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RestobotConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub model: ModelConfig,
    pub knowledge_base: KnowledgeBaseConfig,
    pub agent: AgentConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
    pub table_name: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of an OpenAI-compatible chat completions API.
    pub endpoint: String,
    pub model_id: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub max_turns: usize,
    /// Request timeout. `None` leaves requests unbounded.
    pub timeout_secs: Option<u64>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct KnowledgeBaseConfig {
    /// `"local"` (FTS5 passages in the booking database) or `"http"`.
    pub provider: String,
    pub id: String,
    pub endpoint: String,
    pub max_results: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AgentConfig {
    /// Replaces the built-in system prompt when set.
    pub system_prompt: Option<String>,
    pub answer_tag: String,
}

impl Default for RestobotConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            model: ModelConfig::default(),
            knowledge_base: KnowledgeBaseConfig::default(),
            agent: AgentConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_restobot_dir()
            .join("bookings.db")
            .to_string_lossy()
            .into_owned();
        Self {
            db_path,
            table_name: "bookings".into(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".into(),
            model_id: "gpt-4o-mini".into(),
            api_key_env: "OPENAI_API_KEY".into(),
            max_turns: 8,
            timeout_secs: None,
            temperature: None,
        }
    }
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            provider: "local".into(),
            id: "restaurants".into(),
            endpoint: String::new(),
            max_results: 5,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: None,
            answer_tag: "answer".into(),
        }
    }
}

/// Returns `~/.restobot/`
pub fn default_restobot_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".restobot")
}

/// Returns the default config file path: `~/.restobot/config.toml`
pub fn default_config_path() -> PathBuf {
    default_restobot_dir().join("config.toml")
}

impl RestobotConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides and validate.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            RestobotConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("RESTOBOT_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("RESTOBOT_TABLE") {
            self.storage.table_name = val;
        }
        if let Ok(val) = std::env::var("RESTOBOT_KB_ID") {
            self.knowledge_base.id = val;
        }
        if let Ok(val) = std::env::var("RESTOBOT_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("RESTOBOT_MODEL") {
            self.model.model_id = val;
        }
        if let Ok(val) = std::env::var("RESTOBOT_MODEL_ENDPOINT") {
            self.model.endpoint = val;
        }
    }

    /// The table name and knowledge base id must resolve before anything starts.
    pub fn validate(&self) -> Result<()> {
        if self.storage.table_name.trim().is_empty() {
            bail!("storage.table_name is not set (config file or RESTOBOT_TABLE)");
        }
        if self.knowledge_base.id.trim().is_empty() {
            bail!("knowledge_base.id is not set (config file or RESTOBOT_KB_ID)");
        }
        if self.knowledge_base.provider == "http" && self.knowledge_base.endpoint.is_empty() {
            bail!("knowledge_base.endpoint is required for the http provider");
        }
        if self.model.max_turns == 0 {
            bail!("model.max_turns must be at least 1");
        }
        Ok(())
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
