//! Media service facades.
//!
//! Every configured Radarr or Sonarr instance is reached through a [`MediaBackend`]
//! bound to exactly that instance, so no call ever depends on a "current instance".
//! [`BackendRegistry`] groups the bound backends by [`MediaKind`].

mod arr;
/// HTTP helpers shared by the facades.
pub mod http_utils;
/// Radarr facade.
pub mod radarr;
/// Backends grouped by media kind.
pub mod registry;
/// Sonarr facade.
pub mod sonarr;

pub use radarr::RadarrClient;
pub use registry::BackendRegistry;
pub use sonarr::SonarrClient;

use crate::config::InstanceConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Errors returned by backend facades
#[derive(Error, Debug)]
pub enum BackendError {
    /// Connectivity problem or timeout
    #[error("Network error: {0}")]
    Network(String),
    /// Non-success response carrying an error body
    #[error("API error: {0}")]
    Api(String),
    /// Response body could not be decoded
    #[error("JSON error: {0}")]
    Json(String),
    /// Mutation answered with an unexpected status
    #[error("Request rejected with status {0}")]
    Rejected(u16),
    /// Referenced item is not known to the backend
    #[error("Not found: {0}")]
    NotFound(String),
    /// Operation not offered by this kind of backend
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
}

/// Kind of media a backend manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    /// Handled by Radarr.
    Movie,
    /// Handled by Sonarr.
    Series,
}

impl MediaKind {
    /// Name of the service managing this kind.
    #[must_use]
    pub const fn service_name(self) -> &'static str {
        match self {
            Self::Movie => "Radarr",
            Self::Series => "Sonarr",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie => f.write_str("Movie"),
            Self::Series => f.write_str("Series"),
        }
    }
}

/// A normalized search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Catalog id (TMDB for movies, TVDB for series).
    pub id: i64,
    /// Title.
    pub title: String,
    /// Release year.
    pub year: i32,
    /// Synopsis, possibly empty.
    pub overview: String,
    /// Remote poster URL.
    pub poster: Option<String>,
    /// Number of seasons (series only).
    pub season_count: Option<u32>,
    /// Monitored flag reported by the lookup (series only).
    pub monitored: Option<bool>,
    /// Airing status reported by the lookup (series only).
    pub status: Option<String>,
}

/// A storage location offered for new media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootFolder {
    /// Absolute path on the backend host.
    pub path: String,
    /// Free space in bytes, if reported.
    pub free_space: Option<u64>,
}

/// A backend quality policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityProfile {
    /// Backend id.
    pub id: i64,
    /// Display name.
    pub name: String,
}

/// A backend tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Backend id.
    pub id: i64,
    /// Label, stored lowercase by the backends.
    pub label: String,
}

/// One item of a backend library listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryEntry {
    /// Title.
    pub title: String,
    /// Release year.
    pub year: i32,
    /// Backend status string (e.g. `released`, `continuing`).
    pub status: String,
    /// Whether the backend monitors the item.
    pub monitored: bool,
}

/// Monitoring choice for one season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonSelection {
    /// Season number, 0 for specials.
    pub season_number: u32,
    /// Monitor the season.
    pub monitored: bool,
}

/// Everything needed to add one catalog item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddRequest {
    /// Catalog id of the item.
    pub catalog_id: i64,
    /// Root folder path.
    pub path: String,
    /// Quality profile id.
    pub quality_profile_id: i64,
    /// Tag ids.
    pub tags: Vec<i64>,
    /// Season monitoring (series only).
    pub seasons: Option<Vec<SeasonSelection>>,
}

/// Uniform contract of a media service instance.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Kind of media this backend manages.
    fn kind(&self) -> MediaKind;
    /// Configuration of the bound instance.
    fn instance(&self) -> &InstanceConfig;
    /// Raw lookup results for a free-text term.
    async fn search(&self, term: &str) -> Result<Vec<Value>, BackendError>;
    /// Keep the results that carry every field a candidate needs.
    fn normalize(&self, raw: &[Value]) -> Vec<Candidate>;
    /// Whether the catalog item is already in the library.
    async fn in_library(&self, catalog_id: i64) -> Result<bool, BackendError>;
    /// Add a catalog item to the library.
    async fn add_to_library(&self, request: &AddRequest) -> Result<(), BackendError>;
    /// Remove a catalog item and its files.
    async fn remove_from_library(&self, catalog_id: i64) -> Result<(), BackendError>;
    /// Root folders offered for new media.
    async fn list_root_folders(&self) -> Result<Vec<RootFolder>, BackendError>;
    /// Quality profiles offered for new media.
    async fn list_quality_profiles(&self) -> Result<Vec<QualityProfile>, BackendError>;
    /// Season numbers of a catalog item.
    async fn list_seasons(&self, catalog_id: i64) -> Result<Vec<u32>, BackendError>;
    /// Id of the tag with this label, created when missing.
    async fn find_or_create_tag(&self, label: &str) -> Result<i64, BackendError>;
    /// Every item of the library.
    async fn list_library(&self) -> Result<Vec<LibraryEntry>, BackendError>;
    /// Whether a notification profile for this chat exists.
    async fn notification_profile_exists(&self, chat_id: i64) -> Result<bool, BackendError>;
    /// Create a Telegram notification profile for this chat.
    async fn create_notification_profile(
        &self,
        name: &str,
        chat_id: i64,
    ) -> Result<(), BackendError>;
}

/// Root folders left after applying the instance's exclusion list.
#[must_use]
pub fn visible_root_folders(instance: &InstanceConfig, folders: Vec<RootFolder>) -> Vec<RootFolder> {
    folders
        .into_iter()
        .filter(|f| !instance.excluded_root_folders.contains(&f.path))
        .collect()
}

/// Quality profiles left after applying the instance's exclusion list.
#[must_use]
pub fn visible_quality_profiles(
    instance: &InstanceConfig,
    profiles: Vec<QualityProfile>,
) -> Vec<QualityProfile> {
    profiles
        .into_iter()
        .filter(|p| !instance.excluded_quality_profiles.contains(&p.name))
        .collect()
}
