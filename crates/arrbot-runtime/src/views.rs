//! View layer for workflow output
//!
//! Message texts and keyboards. Every text is HTML; dynamic parts are escaped.

use crate::event::{Action, EntryCommand};
use crate::gateway::{escape, Button, Keyboard};
use crate::pagination::PageView;
use crate::session::UserOp;
use arrbot_core::access::{AccessEntry, Requester};
use arrbot_core::backend::{Candidate, LibraryEntry, MediaKind};
use arrbot_core::config::Entrypoints;
use arrbot_core::download::SpeedMode;
use std::fmt::Write as _;

/// Ask for the password.
pub const AUTHORIZE: &str = "🔒 Please authenticate first: send the password.";
/// Password accepted.
pub const AUTHENTICATED: &str = "✅ Authenticated. You can start using the bot.";
/// Chat already in the chat-id list.
pub const ALREADY_AUTHENTICATED: &str = "This chat is already authenticated.";
/// Password rejected.
pub const WRONG_PASSWORD: &str = "❌ Wrong password.";
/// Admin-only action refused.
pub const NOT_ADMIN: &str = "⛔ Only admins can do that.";
/// End-of-conversation acknowledgment.
pub const END: &str = "👋 End of conversation.";
/// Title prompt.
pub const ASK_TITLE: &str = "🏷 What is the title?";
/// Media kind prompt.
pub const ASK_KIND: &str = "What is this?";
/// Instance prompt.
pub const SELECT_INSTANCE: &str = "Select an instance:";
/// Root folder prompt.
pub const SELECT_PATH: &str = "Select a path:";
/// Quality profile prompt.
pub const SELECT_QUALITY: &str = "Select a quality profile:";
/// Season prompt.
pub const SELECT_SEASONS: &str = "Select the seasons to monitor:";
/// Shown while a library is fetched.
pub const LOADING_ALL: &str = "⏳ Loading the library, this can take a moment...";
/// Library without items.
pub const EMPTY_LIBRARY: &str = "The library is empty.";
/// Speed prompt.
pub const SELECT_SPEED: &str = "Which speed limits should be active?";
/// Download client disabled.
pub const SPEED_NOT_ENABLED: &str = "qBittorrent is not enabled.";
/// Download client failure.
pub const SPEED_ERROR: &str = "❌ Could not change the qBittorrent speed limits.";
/// User operation prompt.
pub const SELECT_USER_OPERATION: &str = "Select a user operation:";
/// User id prompt.
pub const ENTER_USER_ID: &str = "Send the chat id of the user:";
/// Invalid user id.
pub const INVALID_USER_ID: &str = "That is not a valid chat id, try again.";
/// No authenticated chats.
pub const NO_USERS: &str = "No authenticated users yet.";
/// Every instance already notifies this chat.
pub const PROFILE_EXISTS: &str = "🔔 You are already subscribed to notifications.";
/// Notification profiles created.
pub const PROFILE_CREATED: &str = "🔔 Notifications are set up for this chat.";
/// Reply to `/notify` when no instance could be subscribed.
pub const PROFILE_FAILED: &str = "❌ Notifications could not be set up, please try again later.";
/// Generic workflow failure.
pub const FAILURE: &str = "❌ Something went wrong, the request was cancelled.";

const fn with_article(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Movie => "the movie",
        MediaKind::Series => "the series",
    }
}

/// Result count line.
#[must_use]
pub fn search_results(count: usize) -> String {
    match count {
        1 => "Found 1 result".to_string(),
        n => format!("Found {n} results"),
    }
}

/// Caption of the result card.
#[must_use]
pub fn card_caption(view: &PageView, candidate: &Candidate) -> String {
    let mut caption = format!(
        "{} ({}/{})\n\n<b>{} ({})</b>",
        search_results(view.total),
        view.index + 1,
        view.total,
        escape(&candidate.title),
        candidate.year
    );
    if let Some(count) = candidate.season_count {
        let _ = write!(caption, "\nSeasons: {count}");
    }
    if let Some(status) = &candidate.status {
        let _ = write!(caption, "\nStatus: {}", escape(status));
    }
    caption
}

/// Question under the result card of the add workflow.
#[must_use]
pub fn add_question(kind: MediaKind) -> String {
    format!("Is this {} you are looking for?", with_article(kind))
}

/// Question under the result card of the delete workflow.
#[must_use]
pub fn delete_question(kind: MediaKind) -> String {
    format!("Is this {} you want to delete?", with_article(kind))
}

/// Add/Prev/Next/New/Stop buttons under a result card.
#[must_use]
pub fn add_card_keyboard(view: &PageView) -> Keyboard {
    let mut paging = Vec::new();
    if view.has_prev {
        paging.push(Button::new("⏮ Previous", Action::Prev));
    }
    if view.has_next {
        paging.push(Button::new("⏭ Next", Action::Next));
    }
    Keyboard::new()
        .row(vec![Button::new("➕ Add", Action::Add)])
        .row(paging)
        .row(vec![new_button(), stop_button()])
}

/// Delete/New/Stop buttons under a result card.
#[must_use]
pub fn delete_card_keyboard() -> Keyboard {
    Keyboard::new()
        .row(vec![Button::new("🗑 Delete", Action::Delete)])
        .row(vec![new_button(), stop_button()])
}

/// Movie/Series chooser.
#[must_use]
pub fn kind_keyboard() -> Keyboard {
    Keyboard::new()
        .row(vec![
            Button::new("🎬 Movie", Action::Kind(MediaKind::Movie)),
            Button::new("📺 Series", Action::Kind(MediaKind::Series)),
        ])
        .row(vec![new_button(), stop_button()])
}

fn new_button() -> Button {
    Button::new("🔍 New", Action::New)
}

/// Button ending the conversation.
#[must_use]
pub fn stop_button() -> Button {
    Button::new("🛑 Stop", Action::Stop)
}

/// Season toggles, bulk action and commit button.
///
/// Exactly one bulk button is shown: "Deselect all" when every season is
/// selected, "Select all" otherwise.
#[must_use]
pub fn seasons_keyboard(available: &[u32], is_selected: impl Fn(u32) -> bool, all_selected: bool) -> Keyboard {
    let mut keyboard = Keyboard::new().row(vec![Button::new(
        "🗓 Selected and future seasons",
        Action::CommitSeasons,
    )]);
    for &season in available {
        let mark = if is_selected(season) { "✅" } else { "⬜" };
        keyboard = keyboard.row(vec![Button::new(
            format!("{mark} Season {season}"),
            Action::Season(season),
        )]);
    }
    let bulk = if all_selected {
        Button::new("Deselect all seasons", Action::NoSeasons)
    } else {
        Button::new("Select all seasons", Action::AllSeasons)
    };
    keyboard.row(vec![bulk]).row(vec![stop_button()])
}

/// Alternate/Normal chooser.
#[must_use]
pub fn speed_keyboard() -> Keyboard {
    Keyboard::new()
        .row(vec![
            Button::new("🐌 Alternate", Action::Speed(SpeedMode::Alternate)),
            Button::new("🐎 Normal", Action::Speed(SpeedMode::Normal)),
        ])
        .row(vec![stop_button()])
}

/// List/Add/Revoke chooser.
#[must_use]
pub fn users_keyboard() -> Keyboard {
    Keyboard::new()
        .row(vec![
            Button::new("📋 List users", Action::Users(UserOp::List)),
            Button::new("➕ Add user", Action::Users(UserOp::Add)),
            Button::new("🚫 Revoke user", Action::Users(UserOp::Revoke)),
        ])
        .row(vec![stop_button()])
}

/// Item already in the library.
#[must_use]
pub fn already_exists(kind: MediaKind) -> String {
    format!("{} is already in the library.", capitalize(with_article(kind)))
}

/// Add succeeded.
#[must_use]
pub fn add_success(kind: MediaKind, title: &str) -> String {
    format!(
        "✅ {} <b>{}</b> was added successfully.",
        capitalize(with_article(kind)),
        escape(title)
    )
}

/// Add failed.
#[must_use]
pub fn add_failed(kind: MediaKind) -> String {
    format!("❌ Adding {} failed.", with_article(kind))
}

/// Delete target is not in the library.
#[must_use]
pub fn does_not_exist(kind: MediaKind) -> String {
    format!("{} is not in the library.", capitalize(with_article(kind)))
}

/// Delete succeeded.
#[must_use]
pub fn delete_success(kind: MediaKind) -> String {
    format!("🗑 {} was deleted.", capitalize(with_article(kind)))
}

/// Delete failed.
#[must_use]
pub fn delete_failed(kind: MediaKind) -> String {
    format!("❌ Deleting {} failed.", with_article(kind))
}

/// Speed limits switched.
#[must_use]
pub fn speed_changed(mode: SpeedMode) -> String {
    format!("✅ qBittorrent now uses the {mode} speed limits.")
}

/// Named failure for a missing option set.
#[must_use]
pub fn no_options(what: &str) -> String {
    format!("❌ No {what} available, the request was cancelled.")
}

/// One library item of a listing.
#[must_use]
pub fn library_entry(entry: &LibraryEntry) -> String {
    format!(
        "• {} ({})\n        status: {}\n        monitored: {}\n",
        escape(&entry.title),
        entry.year,
        escape(&entry.status),
        entry.monitored
    )
}

/// Numbered authenticated chats.
#[must_use]
pub fn user_list(entries: &[AccessEntry]) -> String {
    let mut text = String::from("📋 Authenticated users\n");
    for (i, entry) in entries.iter().enumerate() {
        let _ = match &entry.display_name {
            Some(name) => write!(text, "\n{}. {} - <i>{}</i>", i + 1, escape(name), escape(&entry.id)),
            None => write!(text, "\n{}. <i>{}</i>", i + 1, escape(&entry.id)),
        };
    }
    text
}

/// User added by an admin.
#[must_use]
pub fn user_added(entry: &AccessEntry) -> String {
    format!("✅ {} was added.", escape(&entry.to_line()))
}

/// User already authenticated.
#[must_use]
pub fn user_exists(chat_id: i64) -> String {
    format!("{chat_id} is already authenticated.")
}

/// User revoked by an admin.
#[must_use]
pub fn user_revoked(chat_id: i64) -> String {
    format!("🚫 {chat_id} was revoked.")
}

/// Revoke target unknown.
#[must_use]
pub fn user_not_found(chat_id: i64) -> String {
    format!("{chat_id} is not an authenticated user.")
}

/// Help listing the configured entry points.
#[must_use]
pub fn help(entrypoints: &Entrypoints) -> String {
    let mut text = String::from("<b>Available commands</b>\n");
    for command in EntryCommand::ALL {
        let _ = write!(
            text,
            "\n/{} - {}",
            escape(command.word(entrypoints)),
            command.description()
        );
    }
    let _ = write!(
        text,
        "\n\nShortcut: <code>{} &lt;title&gt;</code> or <code>{} &lt;title&gt;</code>",
        escape(&entrypoints.movie),
        escape(&entrypoints.series)
    );
    text
}

fn who(requester: &Requester) -> String {
    format!("{} ({})", escape(&requester.display_name), requester.chat_id)
}

/// Admin notice: a workflow was started.
#[must_use]
pub fn admin_started(requester: &Requester, what: &str) -> String {
    format!("ℹ️ {} started {what}.", who(requester))
}

/// Admin notice: a workflow was stopped.
#[must_use]
pub fn admin_stopped(requester: &Requester) -> String {
    format!("ℹ️ {} stopped the conversation.", who(requester))
}

/// How an add request ended, for the admin notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Item added.
    Added,
    /// Backend rejected the add.
    Failed,
    /// Item was already in the library.
    Exists,
}

/// Admin notice: add outcome.
#[must_use]
pub fn admin_add_outcome(requester: &Requester, kind: MediaKind, title: &str, outcome: AddOutcome) -> String {
    let title = escape(title);
    let item = with_article(kind);
    match outcome {
        AddOutcome::Added => format!("ℹ️ {} added {item} <b>{title}</b>.", who(requester)),
        AddOutcome::Failed => format!("ℹ️ {} failed to add {item} <b>{title}</b>.", who(requester)),
        AddOutcome::Exists => format!(
            "ℹ️ {} requested {item} <b>{title}</b>, which is already in the library.",
            who(requester)
        ),
    }
}

/// Admin notice: an item was deleted.
#[must_use]
pub fn admin_deleted(requester: &Requester, kind: MediaKind, title: &str) -> String {
    format!(
        "ℹ️ {} deleted {} <b>{}</b>.",
        who(requester),
        with_article(kind),
        escape(title)
    )
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
