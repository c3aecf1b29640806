//! Telegram transport settings.

use arrbot_core::config::AppSettings;
use config::ConfigError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Telegram transport settings loaded from the same layered sources as the app.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct TelegramSettings {
    /// Telegram Bot API token.
    #[serde(default)]
    pub telegram_token: String,
}

impl TelegramSettings {
    /// Load settings from files and environment, then validate them.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or the token is missing.
    pub fn new() -> Result<Self, ConfigError> {
        let settings: Self = arrbot_core::config::build_config()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the bot cannot start with.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the token is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram_token.trim().is_empty() {
            return Err(ConfigError::Message(
                "telegram_token must be set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Combined settings used by the Telegram transport layer.
#[derive(Clone)]
pub struct BotSettings {
    /// Application settings shared with the workflows.
    pub app: Arc<AppSettings>,
    /// Telegram-specific settings.
    pub telegram: Arc<TelegramSettings>,
}

impl BotSettings {
    /// Create a new combined settings bundle.
    #[must_use]
    pub fn new(app: AppSettings, telegram: TelegramSettings) -> Self {
        Self {
            app: Arc::new(app),
            telegram: Arc::new(telegram),
        }
    }
}
