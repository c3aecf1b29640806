//! Sonarr v3 facade.

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

const ADD_SERIES_FIELDS: &[&str] = &["tvdbId", "tvRageId", "title", "titleSlug", "images"];

const NOTIFICATION_EVENTS: &[(&str, bool)] = &[
    ("onGrab", false),
    ("onDownload", true),
    ("onUpgrade", true),
    ("onRename", false),
    ("onSeriesAdd", false),
    ("onSeriesDelete", false),
    ("onEpisodeFileDelete", false),
    ("onHealthIssue", false),
    ("onApplicationUpdate", false),
];

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeriesDto {
    id: i64,
    tvdb_id: i64,
    title: String,
    #[serde(default)]
    year: i32,
    #[serde(default)]
    status: String,
    #[serde(default)]
    monitored: bool,
}

/// Sonarr instance client.
pub struct SonarrClient {
    api: ArrApi,
    instance: InstanceConfig,
    bot_token: String,
}

impl SonarrClient {
    /// Bind a client to one instance.
    #[must_use]
    pub fn new(instance: InstanceConfig, bot_token: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api: ArrApi::new(&instance, timeout),
            instance,
            bot_token: bot_token.into(),
        }
    }

    async fn series(&self) -> Result<Vec<SeriesDto>, BackendError> {
        self.api.get("series", &[]).await
    }

    async fn lookup_tvdb(&self, tvdb_id: i64) -> Result<Value, BackendError> {
        let results: Vec<Value> = self
            .api
            .get("series/lookup", &[("term", format!("tvdb:{tvdb_id}"))])
            .await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::NotFound(format!("series tvdb:{tvdb_id}")))
    }

    fn build_add_body(&self, lookup: &Value, request: &AddRequest) -> Value {
        let mut body = Map::new();
        body.insert("qualityProfileId".into(), json!(request.quality_profile_id));
        body.insert(
            "addOptions".into(),
            json!({
                "ignoreEpisodesWithFiles": true,
                "ignoreEpisodesWithoutFiles": false,
                "searchForMissingEpisodes": self.instance.search_on_add,
            }),
        );
        body.insert("rootFolderPath".into(), json!(request.path));
        body.insert("seasonFolder".into(), json!(self.instance.season_folder));
        body.insert("monitored".into(), json!(true));
        // Seasons released later are monitored too
        body.insert("monitorNewItems".into(), json!("all"));
        body.insert("tags".into(), json!(request.tags));
        copy_fields(&mut body, lookup, ADD_SERIES_FIELDS);
        body.insert(
            "seasons".into(),
            json!(request.seasons.clone().unwrap_or_default()),
        );
        Value::Object(body)
    }
}

/// Series lookup result to candidate; `None` when a required field is missing.
fn normalize_series(raw: &Value) -> Option<Candidate> {
    let season_count = raw
        .pointer("/statistics/seasonCount")
        .and_then(Value::as_u64)
        .or_else(|| {
            raw.get("seasons")
                .and_then(Value::as_array)
                .map(|s| s.len() as u64)
        })
        .and_then(|n| u32::try_from(n).ok());

    Some(Candidate {
        id: raw.get("tvdbId")?.as_i64()?,
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
        season_count,
        monitored: raw.get("monitored").and_then(Value::as_bool),
        status: raw.get("status").and_then(Value::as_str).map(str::to_string),
    })
}

#[async_trait]
impl MediaBackend for SonarrClient {
    fn kind(&self) -> MediaKind {
        MediaKind::Series
    }

    fn instance(&self) -> &InstanceConfig {
        &self.instance
    }

    async fn search(&self, term: &str) -> Result<Vec<Value>, BackendError> {
        self.api
            .get("series/lookup", &[("term", term.to_string())])
            .await
    }

    fn normalize(&self, raw: &[Value]) -> Vec<Candidate> {
        raw.iter().filter_map(normalize_series).collect()
    }

    async fn in_library(&self, catalog_id: i64) -> Result<bool, BackendError> {
        Ok(self.series().await?.iter().any(|s| s.tvdb_id == catalog_id))
    }

    async fn add_to_library(&self, request: &AddRequest) -> Result<(), BackendError> {
        let lookup = self.lookup_tvdb(request.catalog_id).await?;
        let body = self.build_add_body(&lookup, request);

        let (status, _) = self.api.post("series", &body).await?;
        if status == StatusCode::CREATED {
            info!(
                "[{}] Added series {} to {}",
                self.instance.label, request.catalog_id, request.path
            );
            Ok(())
        } else {
            warn!(
                "[{}] Adding series {} returned {status}",
                self.instance.label, request.catalog_id
            );
            Err(BackendError::Rejected(status.as_u16()))
        }
    }

    async fn remove_from_library(&self, catalog_id: i64) -> Result<(), BackendError> {
        let db_id = self
            .series()
            .await?
            .into_iter()
            .find(|s| s.tvdb_id == catalog_id)
            .map(|s| s.id)
            .ok_or_else(|| BackendError::NotFound(format!("series {catalog_id}")))?;

        let status = self
            .api
            .delete(
                &format!("series/{db_id}"),
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

    async fn list_seasons(&self, catalog_id: i64) -> Result<Vec<u32>, BackendError> {
        let lookup = self.lookup_tvdb(catalog_id).await?;
        let seasons = lookup
            .get("seasons")
            .and_then(Value::as_array)
            .map(|seasons| {
                seasons
                    .iter()
                    .filter_map(|s| s.get("seasonNumber").and_then(Value::as_u64))
                    .filter_map(|n| u32::try_from(n).ok())
                    .collect()
            })
            .unwrap_or_default();
        Ok(seasons)
    }

    async fn find_or_create_tag(&self, label: &str) -> Result<i64, BackendError> {
        self.api.find_or_create_tag(label).await
    }

    async fn list_library(&self) -> Result<Vec<LibraryEntry>, BackendError> {
        Ok(self
            .series()
            .await?
            .into_iter()
            .map(|s| LibraryEntry {
                title: s.title,
                year: s.year,
                status: s.status,
                monitored: s.monitored,
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
