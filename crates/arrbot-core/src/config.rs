//! Configuration and settings management
//!
//! Loads layered settings (config files, then environment variables) describing
//! entry points, access lists, backend instances and the download client.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Default timeout for a single backend HTTP request.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

// Telegram API retry configuration
/// Initial backoff delay for Telegram API retries
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Maximum backoff delay for Telegram API retries
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 4000;
/// Maximum attempts for a Telegram API operation
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;

/// Maximum length of a single outgoing chat message.
pub const MESSAGE_CHAR_LIMIT: usize = 4096;

/// Build the layered configuration source shared by all settings structs.
///
/// # Errors
///
/// Returns a `ConfigError` if a present source cannot be parsed.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Local overrides, not checked into git
        .add_source(File::with_name("config/local").required(false))
        // APP__RADARR__INSTANCES etc.
        .add_source(Environment::with_prefix("APP").separator("__"))
        .add_source(Environment::default().ignore_empty(true))
        .build()
}

/// Application settings shared by every transport.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppSettings {
    /// Command words that start each workflow.
    #[serde(default)]
    pub entrypoints: Entrypoints,

    /// Password expected by the authenticate command.
    #[serde(default)]
    pub auth_password: String,

    /// Chat receiving admin notifications, if any.
    pub admin_notify_id: Option<i64>,

    /// Stay silent towards users missing from the allow-list.
    #[serde(default)]
    pub enable_allowlist: bool,

    /// Restrict admin-only actions to users listed in the admin file.
    #[serde(default)]
    pub enable_admin: bool,

    /// File holding authenticated chats.
    #[serde(default = "default_chat_ids_path")]
    pub chat_ids_path: String,

    /// File holding allowed users.
    #[serde(default = "default_allowlist_path")]
    pub allowlist_path: String,

    /// File holding admins.
    #[serde(default = "default_admins_path")]
    pub admins_path: String,

    /// Timeout for a single backend request.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Radarr instances.
    #[serde(default)]
    pub radarr: ServiceSettings,

    /// Sonarr instances.
    #[serde(default)]
    pub sonarr: ServiceSettings,

    /// Download client.
    #[serde(default)]
    pub qbittorrent: QbittorrentSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            entrypoints: Entrypoints::default(),
            auth_password: String::new(),
            admin_notify_id: None,
            enable_allowlist: false,
            enable_admin: false,
            chat_ids_path: default_chat_ids_path(),
            allowlist_path: default_allowlist_path(),
            admins_path: default_admins_path(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            radarr: ServiceSettings::default(),
            sonarr: ServiceSettings::default(),
            qbittorrent: QbittorrentSettings::default(),
        }
    }
}

fn default_chat_ids_path() -> String {
    "chatid.txt".to_string()
}

fn default_allowlist_path() -> String {
    "allowlist.txt".to_string()
}

fn default_admins_path() -> String {
    "admin.txt".to_string()
}

const fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

const fn default_true() -> bool {
    true
}

/// Command words, compared case-insensitively and with or without a leading `/`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Entrypoints {
    /// Authenticate a chat.
    pub auth: String,
    /// Start adding media of any kind.
    pub add: String,
    /// Start adding a movie.
    pub movie: String,
    /// Start adding a series.
    pub series: String,
    /// Start deleting media.
    pub delete: String,
    /// List every movie of an instance.
    pub all_movies: String,
    /// List every series of an instance.
    pub all_series: String,
    /// Toggle the download client speed mode.
    pub speed: String,
    /// Subscribe to backend notifications.
    pub notify: String,
    /// Show help.
    pub help: String,
    /// Manage authenticated users.
    pub users: String,
    /// Cancel the active workflow.
    pub stop: String,
}

impl Default for Entrypoints {
    fn default() -> Self {
        Self {
            auth: "auth".to_string(),
            add: "add".to_string(),
            movie: "movie".to_string(),
            series: "series".to_string(),
            delete: "delete".to_string(),
            all_movies: "allMovies".to_string(),
            all_series: "allSeries".to_string(),
            speed: "qbittorrent".to_string(),
            notify: "notify".to_string(),
            help: "help".to_string(),
            users: "users".to_string(),
            stop: "stop".to_string(),
        }
    }
}

/// All instances of one media service.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ServiceSettings {
    /// Configured instances, in display order.
    #[serde(default)]
    pub instances: Vec<InstanceConfig>,
}

/// Connection parameters of an HTTP service.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host name or address.
    pub addr: String,
    /// TCP port.
    pub port: u16,
    /// Base path the service is mounted on.
    #[serde(default = "default_server_path")]
    pub path: String,
    /// Use https.
    #[serde(default)]
    pub ssl: bool,
}

fn default_server_path() -> String {
    "/".to_string()
}

impl ServerConfig {
    /// Base URL with a trailing slash, e.g. `http://host:7878/radarr/`.
    #[must_use]
    pub fn base_url(&self) -> String {
        let scheme = if self.ssl { "https" } else { "http" };
        let trimmed = self.path.trim_matches('/');
        if trimmed.is_empty() {
            format!("{scheme}://{}:{}/", self.addr, self.port)
        } else {
            format!("{scheme}://{}:{}/{trimmed}/", self.addr, self.port)
        }
    }
}

/// API key authentication.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct ApiKeyAuth {
    /// API key sent with every request.
    pub apikey: String,
}

/// One Radarr or Sonarr deployment and its policy flags.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct InstanceConfig {
    /// Unique label shown in instance choosers.
    pub label: String,
    /// Where the instance listens.
    pub server: ServerConfig,
    /// API credentials.
    pub auth: ApiKeyAuth,
    /// Trigger a search right after adding.
    #[serde(default = "default_true")]
    pub search_on_add: bool,
    /// Radarr minimum availability for new movies.
    #[serde(default = "default_minimum_availability")]
    pub minimum_availability: String,
    /// Sonarr season folders for new series.
    #[serde(default = "default_true")]
    pub season_folder: bool,
    /// Only admins may use this instance.
    #[serde(default)]
    pub admin_restrictions: bool,
    /// Tag added media with the requesting chat id.
    #[serde(default)]
    pub add_requester_id_tag: bool,
    /// Tags applied to every added item.
    #[serde(default)]
    pub default_tags: Vec<String>,
    /// Root folders hidden from the path chooser.
    #[serde(default)]
    pub excluded_root_folders: Vec<String>,
    /// Quality profiles hidden from the quality chooser.
    #[serde(default)]
    pub excluded_quality_profiles: Vec<String>,
    /// Show only the last path segment in the path chooser.
    #[serde(default)]
    pub narrow_root_folder_names: bool,
}

fn default_minimum_availability() -> String {
    "announced".to_string()
}

/// qBittorrent connection and policy.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct QbittorrentSettings {
    /// Offer the speed toggle at all.
    #[serde(default)]
    pub enable: bool,
    /// Only admins may toggle.
    #[serde(default)]
    pub only_admin: bool,
    /// Web UI address.
    #[serde(default)]
    pub server: ServerConfig,
    /// Web UI credentials.
    #[serde(default)]
    pub auth: QbittorrentAuth,
}

/// qBittorrent Web UI credentials.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct QbittorrentAuth {
    /// User name.
    #[serde(default)]
    pub username: String,
    /// Password.
    #[serde(default)]
    pub password: String,
}

impl AppSettings {
    /// Load settings from the layered sources and validate them.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading or validation fails.
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_config(build_config()?)
    }

    /// Deserialize and validate settings from an already built source.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if deserialization or validation fails.
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Self = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject instance lists that the workflows cannot address unambiguously.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` naming the offending instance.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (service, settings) in [("radarr", &self.radarr), ("sonarr", &self.sonarr)] {
            let mut seen = HashSet::new();
            for instance in &settings.instances {
                if instance.label.trim().is_empty() {
                    return Err(ConfigError::Message(format!(
                        "{service}: instance without a label"
                    )));
                }
                if !seen.insert(instance.label.as_str()) {
                    return Err(ConfigError::Message(format!(
                        "{service}: duplicate instance label '{}'",
                        instance.label
                    )));
                }
            }
        }
        Ok(())
    }

    /// Timeout applied to each backend request.
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
