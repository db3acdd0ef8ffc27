use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::FORGE_API_BASE;

/// Default config file path.
pub const CONFIG_PATH: &str = "config.toml";

/// Top-level application config deserialized from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub allora: AlloraConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
}

/// Telegram delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token. May be left empty in the file and supplied via the
    /// `TELEGRAM_BOT_TOKEN` environment variable instead.
    #[serde(default)]
    pub token: String,
    /// Chat the periodic reports are delivered to.
    pub chat_id: i64,
    /// Optional thread (topic) inside the chat to reply into.
    #[serde(default)]
    pub message_thread: Option<i64>,
}

/// Upstream API endpoints and the tracked address set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlloraConfig {
    /// Forge base URL (user/competition data).
    #[serde(default = "default_forge_base")]
    pub forge_base: String,
    /// Chain REST API base URL (emissions endpoints).
    pub api: String,
    /// Addresses tracked every pass.
    pub addresses: Vec<String>,
}

/// Runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// Polling interval in seconds between rank checks.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Directory holding per-address snapshot files.
    #[serde(default = "default_history_dir")]
    pub history_dir: String,
}

fn default_forge_base() -> String {
    FORGE_API_BASE.to_string()
}

fn default_poll_interval() -> u64 {
    60
}

fn default_history_dir() -> String {
    "history".to_string()
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            history_dir: default_history_dir(),
        }
    }
}

impl AppConfig {
    /// Load config from the given TOML file path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }
}
