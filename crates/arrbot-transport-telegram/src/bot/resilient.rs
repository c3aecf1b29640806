//! Resilient messaging utilities with automatic retry for Telegram API operations.
//!
//! Sends and edits go through [`arrbot_core::utils::retry_transport_operation`],
//! which retries transient failures with exponential backoff and jitter. Every
//! message is sent with HTML parse mode.

use anyhow::Result;
use arrbot_core::config::MESSAGE_CHAR_LIMIT;
use arrbot_core::utils::truncate_str;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardMarkup, Message, MessageId, ParseMode};
use tracing::debug;

const TRUNCATION_MARK: &str = "…";

/// Keep text within the Bot API message limit.
fn fit(text: &str) -> String {
    if text.chars().count() <= MESSAGE_CHAR_LIMIT {
        return text.to_string();
    }
    let mut truncated = truncate_str(text, MESSAGE_CHAR_LIMIT - TRUNCATION_MARK.chars().count());
    truncated.push_str(TRUNCATION_MARK);
    truncated
}

/// Send an HTML message with automatic retry on network failures.
///
/// # Errors
///
/// Returns an error after all retries are exhausted.
pub async fn send_message_resilient(
    bot: &Bot,
    chat_id: ChatId,
    text: &str,
    markup: Option<InlineKeyboardMarkup>,
) -> Result<Message> {
    let text = fit(text);
    arrbot_core::utils::retry_transport_operation(|| async {
        let mut req = bot
            .send_message(chat_id, text.clone())
            .parse_mode(ParseMode::Html);
        if let Some(markup) = markup.clone() {
            req = req.reply_markup(markup);
        }
        req.await
            .map_err(|e| anyhow::anyhow!("Telegram send error: {e}"))
    })
    .await
}

/// Edit an HTML message with automatic retry on network failures.
///
/// Without `markup` the message loses its buttons. An edit that changes
/// nothing counts as success.
///
/// # Errors
///
/// Returns an error after all retries are exhausted.
pub async fn edit_message_resilient(
    bot: &Bot,
    chat_id: ChatId,
    msg_id: MessageId,
    text: &str,
    markup: Option<InlineKeyboardMarkup>,
) -> Result<()> {
    let text = fit(text);
    arrbot_core::utils::retry_transport_operation(|| async {
        let mut req = bot
            .edit_message_text(chat_id, msg_id, text.clone())
            .parse_mode(ParseMode::Html);
        if let Some(markup) = markup.clone() {
            req = req.reply_markup(markup);
        }
        match req.await {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().contains("message is not modified") => {
                debug!("Message update skipped: message is not modified");
                Ok(())
            }
            Err(e) => Err(anyhow::anyhow!("Telegram edit error: {e}")),
        }
    })
    .await
}
