//! # Configuration
//!
//! Loads and parses the application's configuration file (`config.yaml`).
//! Every section is optional; a missing file yields the defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::domain::types::{ChatId, ChatKind, ResponseMode, UserId};

/// Main application configuration structure.
/// Matches the layout of `data/config.yaml`.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_redact")]
    pub redact: bool,
    /// Literal strings scrubbed from redacted responses.
    #[serde(default)]
    pub secrets: Vec<String>,
    #[serde(default = "default_max_response_len")]
    pub max_response_len: usize,
    #[serde(default)]
    pub default_mode: Option<ResponseMode>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            redact: default_redact(),
            secrets: Vec::new(),
            max_response_len: default_max_response_len(),
            default_mode: None,
        }
    }
}

fn default_prefix() -> String {
    ".".to_string()
}

fn default_redact() -> bool {
    true
}

fn default_max_response_len() -> usize {
    4096
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_directory")]
    pub directory: String,
    #[serde(default = "default_log_file")]
    pub file: String,
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_log_directory(),
            file: default_log_file(),
            filter: default_log_filter(),
        }
    }
}

fn default_log_directory() -> String {
    "data".to_string()
}

fn default_log_file() -> String {
    "session.log".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

/// Identity used by the local console backend.
#[derive(Debug, Deserialize, Clone)]
pub struct ConsoleConfig {
    #[serde(default = "default_chat_id")]
    pub chat_id: ChatId,
    #[serde(default)]
    pub chat_kind: ChatKind,
    #[serde(default = "default_user_id")]
    pub user_id: UserId,
    #[serde(default)]
    pub username: Option<String>,
    /// Messages kept in memory; the oldest are forgotten first.
    #[serde(default = "default_history")]
    pub history: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            chat_id: default_chat_id(),
            chat_kind: ChatKind::default(),
            user_id: default_user_id(),
            username: None,
            history: default_history(),
        }
    }
}

fn default_chat_id() -> ChatId {
    1
}

fn default_user_id() -> UserId {
    1000
}

fn default_history() -> usize {
    1000
}
