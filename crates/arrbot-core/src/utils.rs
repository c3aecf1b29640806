//! Utility functions for message formatting and transport retries.

use anyhow::Result;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;
use tracing::warn;
use unicode_segmentation::UnicodeSegmentation;

/// Human readable size in binary units, one decimal (e.g. `1.5GiB`).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 8] = ["", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei", "Zi"];

    let mut value = bytes as f64;
    for unit in UNITS {
        if value.abs() < 1024.0 {
            return format!("{value:.1}{unit}B");
        }
        value /= 1024.0;
    }
    format!("{value:.1}YiB")
}

/// Splits a long message into parts of at most `max_chars` characters.
///
/// Splits happen at line boundaries. A single line longer than `max_chars` is cut
/// by grapheme clusters so multi-byte characters are never broken.
#[must_use]
pub fn split_long_message(message: &str, max_chars: usize) -> Vec<String> {
    if message.is_empty() {
        return Vec::new();
    }
    if message.chars().count() <= max_chars {
        return vec![message.to_string()];
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in message.lines() {
        let line_len = line.chars().count();

        if line_len > max_chars {
            if !current.is_empty() {
                parts.push(current.trim_end().to_string());
                current.clear();
                current_len = 0;
            }
            let mut chunk = String::new();
            let mut chunk_len = 0;
            for grapheme in line.graphemes(true) {
                let grapheme_len = grapheme.chars().count();
                if chunk_len + grapheme_len > max_chars {
                    parts.push(std::mem::take(&mut chunk));
                    chunk_len = 0;
                }
                chunk.push_str(grapheme);
                chunk_len += grapheme_len;
            }
            if !chunk.is_empty() {
                parts.push(chunk);
            }
            continue;
        }

        // +1 for the newline
        if current_len + line_len + 1 > max_chars && !current.is_empty() {
            parts.push(current.trim_end().to_string());
            current.clear();
            current_len = 0;
        }
        current.push_str(line);
        current.push('\n');
        current_len += line_len + 1;
    }

    if !current.trim_end().is_empty() {
        parts.push(current.trim_end().to_string());
    }

    parts
}

/// Packs whole entries into messages of at most `max_chars` characters.
///
/// An entry is never split across two messages unless it is longer than
/// `max_chars` on its own, in which case it falls back to [`split_long_message`].
#[must_use]
pub fn pack_entries<S: AsRef<str>>(entries: &[S], max_chars: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for entry in entries {
        let entry = entry.as_ref();
        let entry_len = entry.chars().count();

        if entry_len > max_chars {
            if !current.is_empty() {
                parts.push(std::mem::take(&mut current));
                current_len = 0;
            }
            parts.extend(split_long_message(entry, max_chars));
            continue;
        }

        if current_len + entry_len > max_chars {
            parts.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push_str(entry);
        current_len += entry_len;
    }

    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Safely truncates a string to a maximum character length (not bytes).
pub fn truncate_str(s: impl AsRef<str>, max_chars: usize) -> String {
    let s = s.as_ref();
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    s.char_indices()
        .nth(max_chars)
        .map_or_else(|| s.to_string(), |(pos, _)| s[..pos].to_string())
}

/// Retry a chat transport operation with exponential backoff and jitter.
///
/// Only for idempotent transport calls (send, edit, delete of chat messages).
/// Backend mutations are never routed through here.
///
/// # Errors
///
/// Returns the last error once all attempts are exhausted.
pub async fn retry_transport_operation<F, Fut, T>(operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    use crate::config::{
        TELEGRAM_API_INITIAL_BACKOFF_MS, TELEGRAM_API_MAX_BACKOFF_MS, TELEGRAM_API_MAX_RETRIES,
    };

    let retry_strategy = ExponentialBackoff::from_millis(TELEGRAM_API_INITIAL_BACKOFF_MS)
        .max_delay(Duration::from_millis(TELEGRAM_API_MAX_BACKOFF_MS))
        .map(jitter)
        .take(TELEGRAM_API_MAX_RETRIES);

    Retry::spawn(retry_strategy, operation).await.map_err(|e| {
        warn!(
            "Transport operation failed after {} attempts: {}",
            TELEGRAM_API_MAX_RETRIES, e
        );
        e
    })
}
