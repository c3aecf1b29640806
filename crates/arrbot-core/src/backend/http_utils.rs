//! HTTP utilities for backend facades
//!
//! Shared request/response handling so the Radarr, Sonarr and qBittorrent
//! clients map transport failures the same way.

use super::BackendError;
use crate::utils::truncate_str;
use reqwest::{Client as HttpClient, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

const MAX_ERROR_BODY_CHARS: usize = 300;

/// Creates an HTTP client with a per-request timeout.
///
/// A hung backend then blocks only the chat waiting on it, and only until the timeout.
#[must_use]
pub fn create_http_client(timeout: Duration) -> HttpClient {
    HttpClient::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| HttpClient::new())
}

/// Maps a `reqwest` error to [`BackendError::Network`].
#[must_use]
pub fn network_error(error: &reqwest::Error) -> BackendError {
    if error.is_timeout() {
        BackendError::Network(format!("request timed out: {error}"))
    } else {
        BackendError::Network(error.to_string())
    }
}

/// Turns a non-success response into [`BackendError::Api`], keeping successes.
///
/// # Errors
///
/// Returns `BackendError::Api` with a shortened body for any non-2xx status.
pub async fn ensure_success(response: Response) -> Result<Response, BackendError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();

    // Reverse proxies answer with HTML pages
    let trimmed = error_text.trim_start();
    let is_html = trimmed.starts_with("<!DOCTYPE")
        || trimmed.starts_with("<html")
        || trimmed.starts_with("<HTML");

    let message = if is_html {
        format!("{status} (server returned an HTML error page)")
    } else if error_text.is_empty() {
        status.to_string()
    } else {
        format!(
            "{status}: {}",
            truncate_str(&error_text, MAX_ERROR_BODY_CHARS)
        )
    };
    Err(BackendError::Api(message))
}

/// Checks the status and decodes a JSON body.
///
/// # Errors
///
/// Returns `BackendError::Api` on non-success status or `BackendError::Json`
/// if the body does not match `T`.
pub async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let response = ensure_success(response).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| BackendError::Json(e.to_string()))
}
