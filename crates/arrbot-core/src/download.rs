//! Download client speed-limit control.
//!
//! qBittorrent keeps two sets of transfer limits, "normal" and "alternative".
//! Switching between them needs a logged-in Web UI session: the login call sets
//! an `SID` cookie that every later call must carry.

use crate::backend::http_utils::{ensure_success, network_error};
use crate::backend::BackendError;
use crate::config::QbittorrentSettings;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

/// Which transfer limits are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedMode {
    /// Regular limits.
    Normal,
    /// Alternative (usually slower) limits.
    Alternate,
}

impl SpeedMode {
    /// Value reported by `transfer/speedLimitsMode`.
    #[must_use]
    pub const fn as_flag(self) -> &'static str {
        match self {
            Self::Normal => "0",
            Self::Alternate => "1",
        }
    }

    fn from_flag(flag: &str) -> Option<Self> {
        match flag.trim() {
            "0" => Some(Self::Normal),
            "1" => Some(Self::Alternate),
            _ => None,
        }
    }
}

impl fmt::Display for SpeedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => f.write_str("normal"),
            Self::Alternate => f.write_str("alternate"),
        }
    }
}

/// A download client whose speed mode can be switched.
#[async_trait]
pub trait DownloadClient: Send + Sync {
    /// Make `mode` the active transfer-limit mode.
    async fn set_speed_mode(&self, mode: SpeedMode) -> Result<(), BackendError>;
}

/// qBittorrent Web UI client.
pub struct QbittorrentClient {
    base_url: String,
    username: String,
    password: String,
    timeout: Duration,
}

impl QbittorrentClient {
    /// Client for the configured Web UI.
    #[must_use]
    pub fn new(settings: &QbittorrentSettings, timeout: Duration) -> Self {
        Self {
            base_url: format!("{}api/v2/", settings.server.base_url()),
            username: settings.auth.username.clone(),
            password: settings.auth.password.clone(),
            timeout,
        }
    }

    /// Fresh cookie-carrying session, so concurrent chats never share a login.
    fn session(&self) -> Result<HttpClient, BackendError> {
        HttpClient::builder()
            .cookie_store(true)
            .timeout(self.timeout)
            .build()
            .map_err(|e| network_error(&e))
    }

    async fn login(&self, session: &HttpClient) -> Result<(), BackendError> {
        let response = session
            .post(format!("{}auth/login", self.base_url))
            .form(&[
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| network_error(&e))?;
        let body = ensure_success(response)
            .await?
            .text()
            .await
            .map_err(|e| network_error(&e))?;

        // Wrong credentials still answer 200, with "Fails."
        if body.trim() == "Ok." {
            Ok(())
        } else {
            Err(BackendError::Api("qBittorrent login rejected".to_string()))
        }
    }

    async fn current_mode(&self, session: &HttpClient) -> Result<SpeedMode, BackendError> {
        let response = session
            .get(format!("{}transfer/speedLimitsMode", self.base_url))
            .send()
            .await
            .map_err(|e| network_error(&e))?;
        let body = ensure_success(response)
            .await?
            .text()
            .await
            .map_err(|e| network_error(&e))?;
        SpeedMode::from_flag(&body)
            .ok_or_else(|| BackendError::Json(format!("unexpected speed mode '{body}'")))
    }
}

#[async_trait]
impl DownloadClient for QbittorrentClient {
    async fn set_speed_mode(&self, mode: SpeedMode) -> Result<(), BackendError> {
        let session = self.session()?;
        self.login(&session).await?;

        if self.current_mode(&session).await? == mode {
            debug!("qBittorrent already in {mode} mode");
            return Ok(());
        }

        let response = session
            .post(format!("{}transfer/toggleSpeedLimitsMode", self.base_url))
            .send()
            .await
            .map_err(|e| network_error(&e))?;
        if response.status().is_success() {
            info!("qBittorrent switched to {mode} mode");
            Ok(())
        } else {
            Err(BackendError::Rejected(response.status().as_u16()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_round_trip() {
        assert_eq!(SpeedMode::from_flag(" 1\n"), Some(SpeedMode::Alternate));
        assert_eq!(SpeedMode::from_flag(SpeedMode::Normal.as_flag()), Some(SpeedMode::Normal));
        assert_eq!(SpeedMode::from_flag("2"), None);
    }
}
