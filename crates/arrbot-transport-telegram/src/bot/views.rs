//! Conversions from runtime views to Bot API types.

use arrbot_core::config::Entrypoints;
use arrbot_runtime::{EntryCommand, Keyboard};
use teloxide::types::{BotCommand, InlineKeyboardButton, InlineKeyboardMarkup};

/// Inline keyboard with one callback button per runtime button.
#[must_use]
pub fn inline_keyboard(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.rows.iter().map(|row| {
        row.iter()
            .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.token.clone()))
            .collect::<Vec<_>>()
    }))
}

/// Command menu for the configured entry points.
///
/// Telegram only accepts lowercase command names, so words that are not are
/// left out of the menu. They still work when typed.
#[must_use]
pub fn bot_commands(entrypoints: &Entrypoints) -> Vec<BotCommand> {
    EntryCommand::ALL
        .iter()
        .map(|c| (c.word(entrypoints), c.description()))
        .filter(|(word, _)| is_menu_word(word))
        .map(|(word, description)| BotCommand::new(word, description))
        .collect()
}

fn is_menu_word(word: &str) -> bool {
    (1..=32).contains(&word.len())
        && word
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
