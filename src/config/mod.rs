use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::notify::telegram::TELEGRAM_API_BASE;
use crate::review::practicum::PRACTICUM_ENDPOINT;

/// Review-service credentials and endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PracticumConfig {
    /// OAuth token for the homework-statuses API.
    pub token: String,
    pub endpoint: String,
}

/// Telegram delivery target.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    pub token: String,
    /// Chat that receives the notifications.
    pub chat_id: String,
    pub api_base: String,
}

/// Poll schedule and failure tolerance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Seconds between poll cycles.
    pub interval_secs: u64,
    /// Consecutive failed polls tolerated before the process gives up.
    pub failure_threshold: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 600,
            failure_threshold: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub practicum: PracticumConfig,
    pub telegram: TelegramConfig,
    pub poll: PollConfig,
}

impl Config {
    /// Load config from a TOML file, then apply env-var overrides for the
    /// secrets and fill in endpoint defaults.
    ///
    /// A missing file is not an error: everything can be supplied through
    /// `PRACTICUM_TOKEN`, `TELEGRAM_TOKEN` and `TELEGRAM_CHAT_ID`.
    pub fn load(path: &str) -> Result<Self> {
        let expanded = shellexpand::tilde(path);
        let path = Path::new(expanded.as_ref());

        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("failed to parse config file {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.apply_defaults();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("PRACTICUM_TOKEN") {
            self.practicum.token = token;
        }
        if let Ok(token) = std::env::var("TELEGRAM_TOKEN") {
            self.telegram.token = token;
        }
        if let Ok(chat_id) = std::env::var("TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = chat_id;
        }
    }

    fn apply_defaults(&mut self) {
        if self.practicum.endpoint.is_empty() {
            self.practicum.endpoint = PRACTICUM_ENDPOINT.to_string();
        }
        if self.telegram.api_base.is_empty() {
            self.telegram.api_base = TELEGRAM_API_BASE.to_string();
        }
    }

    /// Refuse to start without the credentials every run needs.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.practicum.token.trim().is_empty() {
            missing.push("practicum.token (PRACTICUM_TOKEN)");
        }
        if self.telegram.token.trim().is_empty() {
            missing.push("telegram.token (TELEGRAM_TOKEN)");
        }
        if self.telegram.chat_id.trim().is_empty() {
            missing.push("telegram.chat_id (TELEGRAM_CHAT_ID)");
        }
        if !missing.is_empty() {
            anyhow::bail!("missing required configuration: {}", missing.join(", "));
        }
        if self.poll.interval_secs == 0 {
            anyhow::bail!("poll.interval_secs cannot be 0");
        }
        if self.poll.failure_threshold == 0 {
            anyhow::bail!("poll.failure_threshold cannot be 0");
        }
        Ok(())
    }
}
