//! Result card pagination.
//!
//! A result card is three messages: a caption, an optional poster and an action
//! message with the buttons. Images cannot be edited in place, so on every move
//! the caption is edited, the poster deleted and resent, and the action message
//! deleted and resent below it.

use crate::gateway::{Keyboard, NotificationGateway};
use crate::session::Session;
use anyhow::Result;
use tracing::{debug, warn};

/// Cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards the first result.
    Previous,
    /// Towards the last result.
    Next,
}

/// Move a cursor over `len` results. Clamps at both ends, never wraps.
#[must_use]
pub fn advance(cursor: usize, len: usize, direction: Direction) -> usize {
    if len == 0 {
        return 0;
    }
    let cursor = cursor.min(len - 1);
    match direction {
        Direction::Previous => cursor.saturating_sub(1),
        Direction::Next => (cursor + 1).min(len - 1),
    }
}

/// What the card at a cursor position shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageView {
    /// Zero-based position.
    pub index: usize,
    /// Number of results.
    pub total: usize,
    /// "Previous" is enabled.
    pub has_prev: bool,
    /// "Next" is enabled.
    pub has_next: bool,
}

impl PageView {
    /// View of position `cursor`; `None` when there are no results.
    #[must_use]
    pub fn new(cursor: usize, total: usize) -> Option<Self> {
        if total == 0 {
            return None;
        }
        let index = cursor.min(total - 1);
        Some(Self {
            index,
            total,
            has_prev: index > 0,
            has_next: index + 1 < total,
        })
    }

    /// View of the session's cursor.
    #[must_use]
    pub fn of(session: &Session) -> Option<Self> {
        Self::new(session.cursor, session.candidates.len())
    }
}

/// Draw or redraw the card for the session's current candidate.
///
/// On the first draw an existing prompt message (e.g. the instance chooser) is
/// reused as the caption.
///
/// # Errors
///
/// Returns an error if the caption or action message cannot be delivered.
/// Poster failures are logged and the card is shown without an image.
pub async fn show_card(
    gateway: &dyn NotificationGateway,
    chat_id: i64,
    session: &mut Session,
    caption: &str,
    question: &str,
    keyboard: &Keyboard,
) -> Result<()> {
    match (session.caption, session.prompt.take()) {
        (Some(handle), prompt) => {
            gateway.edit_text(handle, caption, None).await?;
            session.prompt = prompt;
        }
        (None, Some(handle)) => {
            gateway.edit_text(handle, caption, None).await?;
            session.caption = Some(handle);
        }
        (None, None) => {
            session.caption = Some(gateway.send_text(chat_id, caption, None).await?);
        }
    }

    if let Some(poster) = session.poster.take() {
        if let Err(e) = gateway.delete_message(poster).await {
            debug!(chat_id, error = %e, "Poster already gone");
        }
    }
    if let Some(url) = session.current_candidate().and_then(|c| c.poster.clone()) {
        match gateway.send_image(chat_id, &url).await {
            Ok(handle) => session.poster = Some(handle),
            Err(e) => warn!(chat_id, error = %e, "Poster could not be sent"),
        }
    }

    if let Some(action) = session.prompt.take() {
        if let Err(e) = gateway.delete_message(action).await {
            debug!(chat_id, error = %e, "Action message already gone");
        }
    }
    session.prompt = Some(gateway.send_text(chat_id, question, Some(keyboard)).await?);
    Ok(())
}

/// Delete the caption and poster of the session's card, if one is shown.
///
/// The action message is left alone; callers replace it with the outcome.
pub async fn discard_card(gateway: &dyn NotificationGateway, chat_id: i64, session: &mut Session) {
    for handle in [session.caption.take(), session.poster.take()]
        .into_iter()
        .flatten()
    {
        if let Err(e) = gateway.delete_message(handle).await {
            debug!(chat_id, error = %e, "Card message already gone");
        }
    }
}
