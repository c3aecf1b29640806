//! Option resolution.
//!
//! Instance, root folder and quality profile steps all follow the same policy:
//! a single option is taken without asking, several are offered in a chooser,
//! none is reported to the caller.

use crate::event::Action;
use crate::gateway::{Button, Keyboard, MessageHandle, NotificationGateway};
use crate::views;
use anyhow::Result;
use arrbot_core::backend::{QualityProfile, RootFolder};
use arrbot_core::config::InstanceConfig;
use arrbot_core::utils::format_bytes;

/// Something offered in a chooser.
pub trait Choice {
    /// Button text.
    fn label(&self) -> String;
    /// Action sent back when picked.
    fn action(&self) -> Action;
}

impl Choice for InstanceConfig {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn action(&self) -> Action {
        Action::Instance(self.label.clone())
    }
}

impl Choice for QualityProfile {
    fn label(&self) -> String {
        format!("Quality: {}", self.name)
    }

    fn action(&self) -> Action {
        Action::Quality(self.id)
    }
}

/// A root folder offered at a position in the chooser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathChoice {
    /// Position among the offered folders.
    pub index: usize,
    /// Button text.
    pub text: String,
}

impl PathChoice {
    /// Choices for `folders`; `narrow` shows only the last path segment.
    #[must_use]
    pub fn from_folders(folders: &[RootFolder], narrow: bool) -> Vec<Self> {
        folders
            .iter()
            .enumerate()
            .map(|(index, folder)| {
                let name = if narrow {
                    folder
                        .path
                        .trim_end_matches('/')
                        .rsplit('/')
                        .next()
                        .unwrap_or(&folder.path)
                } else {
                    folder.path.as_str()
                };
                let free = folder.free_space.map_or_else(|| "?".to_string(), format_bytes);
                Self {
                    index,
                    text: format!("Path: {name}, Free: {free}"),
                }
            })
            .collect()
    }
}

impl Choice for PathChoice {
    fn label(&self) -> String {
        self.text.clone()
    }

    fn action(&self) -> Action {
        Action::Path(self.index)
    }
}

/// Outcome of [`resolve`].
#[derive(Debug, PartialEq, Eq)]
pub enum Decision<'a, T> {
    /// Exactly one option; it was taken.
    Advanced(&'a T),
    /// A chooser was shown.
    AwaitingInput,
    /// Nothing to choose from.
    NoOptionsAvailable,
}

/// One button per option, then a stop button.
#[must_use]
pub fn chooser_keyboard<T: Choice>(options: &[T]) -> Keyboard {
    options
        .iter()
        .fold(Keyboard::new(), |keyboard, option| {
            keyboard.row(vec![Button::new(option.label(), option.action())])
        })
        .row(vec![views::stop_button()])
}

/// The option a pressed button refers to, if it is still on offer.
#[must_use]
pub fn find_choice<'a, T: Choice>(options: &'a [T], action: &Action) -> Option<&'a T> {
    options.iter().find(|o| o.action() == *action)
}

/// Show `text` with `keyboard`, editing the prompt message when there is one.
///
/// # Errors
///
/// Returns an error if the message cannot be sent or edited.
pub async fn present(
    gateway: &dyn NotificationGateway,
    chat_id: i64,
    prompt: &mut Option<MessageHandle>,
    text: &str,
    keyboard: &Keyboard,
) -> Result<()> {
    match prompt {
        Some(handle) => gateway.edit_text(*handle, text, Some(keyboard)).await,
        None => {
            *prompt = Some(gateway.send_text(chat_id, text, Some(keyboard)).await?);
            Ok(())
        }
    }
}

/// Take a single option, or offer several in a chooser.
///
/// # Errors
///
/// Returns an error if the chooser cannot be delivered.
pub async fn resolve<'a, T: Choice + Sync>(
    gateway: &dyn NotificationGateway,
    chat_id: i64,
    prompt: &mut Option<MessageHandle>,
    text: &str,
    options: &'a [T],
) -> Result<Decision<'a, T>> {
    match options {
        [] => Ok(Decision::NoOptionsAvailable),
        [only] => Ok(Decision::Advanced(only)),
        _ => {
            present(gateway, chat_id, prompt, text, &chooser_keyboard(options)).await?;
            Ok(Decision::AwaitingInput)
        }
    }
}
