//! Radarr v3 facade.

use super::arr::{copy_fields, telegram_notification_body, ArrApi};
use super::{
    AddRequest, BackendError, Candidate, LibraryEntry, MediaBackend, MediaKind, QualityProfile,
    RootFolder,
};
use crate::config::InstanceConfig;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{info, warn};

/// Lookup fields copied verbatim into the add body.
const ADD_MOVIE_FIELDS: &[&str] = &["tmdbId", "year", "title", "titleSlug", "images"];

const NOTIFICATION_EVENTS: &[(&str, bool)] = &[
    ("onGrab", false),
    ("onDownload", true),
    ("onUpgrade", true),
    ("onRename", false),
    ("onMovieAdded", false),
    ("onMovieDelete", false),
    ("onMovieFileDelete", false),
    ("onHealthIssue", false),
    ("onApplicationUpdate", false),
];

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MovieDto {
    id: i64,
    tmdb_id: i64,
    title: String,
    #[serde(default)]
    year: i32,
    #[serde(default)]
    status: String,
    #[serde(default)]
    monitored: bool,
}

/// Radarr instance client.
pub struct RadarrClient {
    api: ArrApi,
    instance: InstanceConfig,
    bot_token: String,
}

impl RadarrClient {
    /// Bind a client to one instance.
    #[must_use]
    pub fn new(instance: InstanceConfig, bot_token: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api: ArrApi::new(&instance, timeout),
            instance,
            bot_token: bot_token.into(),
        }
    }

    async fn movies(&self) -> Result<Vec<MovieDto>, BackendError> {
        self.api.get("movie", &[]).await
    }

    fn build_add_body(&self, lookup: &Value, request: &AddRequest) -> Value {
        let mut body = Map::new();
        body.insert("qualityProfileId".into(), json!(request.quality_profile_id));
        body.insert(
            "minimumAvailability".into(),
            json!(self.instance.minimum_availability),
        );
        body.insert("rootFolderPath".into(), json!(request.path));
        body.insert(
            "addOptions".into(),
            json!({ "searchForMovie": self.instance.search_on_add }),
        );
        body.insert("monitored".into(), json!(true));
        body.insert("tags".into(), json!(request.tags));
        copy_fields(&mut body, lookup, ADD_MOVIE_FIELDS);
        Value::Object(body)
    }
}

/// Movie lookup result to candidate; `None` when a required field is missing.
fn normalize_movie(raw: &Value) -> Option<Candidate> {
    Some(Candidate {
        id: raw.get("tmdbId")?.as_i64()?,
        title: raw.get("title")?.as_str()?.to_string(),
        year: i32::try_from(raw.get("year")?.as_i64()?).ok()?,
        overview: raw
            .get("overview")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        poster: raw
            .get("remotePoster")
            .and_then(Value::as_str)
            .map(str::to_string),
        season_count: None,
        monitored: None,
        status: None,
    })
}

#[async_trait]
impl MediaBackend for RadarrClient {
    fn kind(&self) -> MediaKind {
        MediaKind::Movie
    }

    fn instance(&self) -> &InstanceConfig {
        &self.instance
    }

    async fn search(&self, term: &str) -> Result<Vec<Value>, BackendError> {
        self.api
            .get("movie/lookup", &[("term", term.to_string())])
            .await
    }

    fn normalize(&self, raw: &[Value]) -> Vec<Candidate> {
        raw.iter().filter_map(normalize_movie).collect()
    }

    async fn in_library(&self, catalog_id: i64) -> Result<bool, BackendError> {
        Ok(self.movies().await?.iter().any(|m| m.tmdb_id == catalog_id))
    }

    async fn add_to_library(&self, request: &AddRequest) -> Result<(), BackendError> {
        let lookup: Value = self
            .api
            .get(
                "movie/lookup/tmdb",
                &[("tmdbId", request.catalog_id.to_string())],
            )
            .await?;
        let body = self.build_add_body(&lookup, request);

        let (status, _) = self.api.post("movie", &body).await?;
        if status == StatusCode::CREATED {
            info!(
                "[{}] Added movie {} to {}",
                self.instance.label, request.catalog_id, request.path
            );
            Ok(())
        } else {
            warn!(
                "[{}] Adding movie {} returned {status}",
                self.instance.label, request.catalog_id
            );
            Err(BackendError::Rejected(status.as_u16()))
        }
    }

    async fn remove_from_library(&self, catalog_id: i64) -> Result<(), BackendError> {
        let db_id = self
            .movies()
            .await?
            .into_iter()
            .find(|m| m.tmdb_id == catalog_id)
            .map(|m| m.id)
            .ok_or_else(|| BackendError::NotFound(format!("movie {catalog_id}")))?;

        let status = self
            .api
            .delete(
                &format!("movie/{db_id}"),
                &[("deleteFiles", "true".to_string())],
            )
            .await?;
        if status == StatusCode::OK {
            Ok(())
        } else {
            Err(BackendError::Rejected(status.as_u16()))
        }
    }

    async fn list_root_folders(&self) -> Result<Vec<RootFolder>, BackendError> {
        self.api.root_folders().await
    }

    async fn list_quality_profiles(&self) -> Result<Vec<QualityProfile>, BackendError> {
        self.api.quality_profiles().await
    }

    async fn list_seasons(&self, _catalog_id: i64) -> Result<Vec<u32>, BackendError> {
        Err(BackendError::Unsupported("movies have no seasons"))
    }

    async fn find_or_create_tag(&self, label: &str) -> Result<i64, BackendError> {
        self.api.find_or_create_tag(label).await
    }

    async fn list_library(&self) -> Result<Vec<LibraryEntry>, BackendError> {
        Ok(self
            .movies()
            .await?
            .into_iter()
            .map(|m| LibraryEntry {
                title: m.title,
                year: m.year,
                status: m.status,
                monitored: m.monitored,
            })
            .collect())
    }

    async fn notification_profile_exists(&self, chat_id: i64) -> Result<bool, BackendError> {
        self.api.notification_profile_exists(chat_id).await
    }

    async fn create_notification_profile(
        &self,
        name: &str,
        chat_id: i64,
    ) -> Result<(), BackendError> {
        let tag_id = self.api.find_or_create_tag(&chat_id.to_string()).await?;
        let body = telegram_notification_body(
            name,
            chat_id,
            &self.bot_token,
            tag_id,
            NOTIFICATION_EVENTS,
        );
        self.api.create_notification_profile(&body).await
    }
}
