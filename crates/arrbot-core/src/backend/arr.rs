//! Plumbing shared by the Radarr and Sonarr v3 APIs.

use super::http_utils::{create_http_client, network_error, read_json};
use super::{BackendError, QualityProfile, RootFolder, Tag};
use crate::config::InstanceConfig;
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::debug;

const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RootFolderDto {
    path: String,
    free_space: Option<u64>,
}

#[derive(Deserialize)]
struct QualityProfileDto {
    id: i64,
    name: String,
}

#[derive(Deserialize)]
struct NotificationDto {
    #[serde(default)]
    name: String,
}

/// HTTP access to one `*arr` instance.
pub(crate) struct ArrApi {
    http: HttpClient,
    base_url: String,
    api_key: String,
    label: String,
}

impl ArrApi {
    pub(crate) fn new(instance: &InstanceConfig, timeout: Duration) -> Self {
        Self {
            http: create_http_client(timeout),
            base_url: format!("{}api/v3/", instance.server.base_url()),
            api_key: instance.auth.apikey.clone(),
            label: instance.label.clone(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, BackendError> {
        debug!("[{}] GET {endpoint}", self.label);
        let response = self
            .http
            .get(self.url(endpoint))
            .header(API_KEY_HEADER, &self.api_key)
            .query(query)
            .send()
            .await
            .map_err(|e| network_error(&e))?;
        read_json(response).await
    }

    /// POST a JSON body and return the raw status with the decoded body (if any).
    pub(crate) async fn post(
        &self,
        endpoint: &str,
        body: &Value,
    ) -> Result<(StatusCode, Value), BackendError> {
        debug!("[{}] POST {endpoint}", self.label);
        let response = self
            .http
            .post(self.url(endpoint))
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| network_error(&e))?;
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    pub(crate) async fn delete(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<StatusCode, BackendError> {
        debug!("[{}] DELETE {endpoint}", self.label);
        let response = self
            .http
            .delete(self.url(endpoint))
            .header(API_KEY_HEADER, &self.api_key)
            .query(query)
            .send()
            .await
            .map_err(|e| network_error(&e))?;
        Ok(response.status())
    }

    pub(crate) async fn root_folders(&self) -> Result<Vec<RootFolder>, BackendError> {
        let folders: Vec<RootFolderDto> = self.get("rootfolder", &[]).await?;
        Ok(folders
            .into_iter()
            .map(|f| RootFolder {
                path: f.path,
                free_space: f.free_space,
            })
            .collect())
    }

    pub(crate) async fn quality_profiles(&self) -> Result<Vec<QualityProfile>, BackendError> {
        let profiles: Vec<QualityProfileDto> = self.get("qualityprofile", &[]).await?;
        Ok(profiles
            .into_iter()
            .map(|p| QualityProfile {
                id: p.id,
                name: p.name,
            })
            .collect())
    }

    pub(crate) async fn tags(&self) -> Result<Vec<Tag>, BackendError> {
        self.get("tag", &[]).await
    }

    /// Tag labels are compared lowercase, as the backends store them.
    pub(crate) async fn find_or_create_tag(&self, label: &str) -> Result<i64, BackendError> {
        let wanted = label.to_lowercase();
        if let Some(tag) = self
            .tags()
            .await?
            .into_iter()
            .find(|t| t.label.to_lowercase() == wanted)
        {
            return Ok(tag.id);
        }

        let (status, body) = self.post("tag", &json!({ "label": label })).await?;
        if !status.is_success() {
            return Err(BackendError::Rejected(status.as_u16()));
        }
        body.get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| BackendError::Json("created tag without id".to_string()))
    }

    pub(crate) async fn notification_profile_exists(
        &self,
        chat_id: i64,
    ) -> Result<bool, BackendError> {
        let profiles: Vec<NotificationDto> = self.get("notification", &[]).await?;
        let needle = chat_id.to_string();
        Ok(profiles.iter().any(|p| p.name.contains(&needle)))
    }

    pub(crate) async fn create_notification_profile(&self, body: &Value) -> Result<(), BackendError> {
        let (status, _) = self.post("notification", body).await?;
        if status == StatusCode::CREATED || status == StatusCode::OK {
            Ok(())
        } else {
            Err(BackendError::Rejected(status.as_u16()))
        }
    }
}

/// Telegram notification profile understood by both Radarr and Sonarr.
///
/// `events` carries the service specific `on*` switches.
pub(crate) fn telegram_notification_body(
    name: &str,
    chat_id: i64,
    bot_token: &str,
    tag_id: i64,
    events: &[(&str, bool)],
) -> Value {
    let mut body = json!({
        "name": name,
        "implementation": "Telegram",
        "configContract": "TelegramSettings",
        "enable": true,
        "fields": [
            { "name": "botToken", "value": bot_token },
            { "name": "chatId", "value": chat_id.to_string() },
            { "name": "sendSilently", "value": false },
        ],
        "tags": [tag_id],
        "includeHealthWarnings": false,
    });

    if let Some(map) = body.as_object_mut() {
        let switches: Map<String, Value> = events
            .iter()
            .map(|(key, on)| ((*key).to_string(), Value::Bool(*on)))
            .collect();
        map.extend(switches);
    }
    body
}

/// Copies the listed fields of a lookup result into an add body.
pub(crate) fn copy_fields(target: &mut Map<String, Value>, source: &Value, fields: &[&str]) {
    for field in fields {
        if let Some(value) = source.get(*field) {
            target.insert((*field).to_string(), value.clone());
        }
    }
}
