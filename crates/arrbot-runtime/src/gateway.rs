//! Outbound messaging contract.
//!
//! Texts are HTML formatted. Anything user or backend supplied must be passed
//! through [`escape`] before it is embedded.

use anyhow::Result;
use async_trait::async_trait;

/// A message previously sent through the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHandle {
    /// Chat the message lives in.
    pub chat_id: i64,
    /// Transport message id.
    pub message_id: i32,
}

/// An inline button carrying an opaque action token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// Visible text.
    pub label: String,
    /// Token returned when the button is pressed.
    pub token: String,
}

impl Button {
    /// Button with a label and token.
    pub fn new(label: impl Into<String>, token: impl ToString) -> Self {
        Self {
            label: label.into(),
            token: token.to_string(),
        }
    }
}

/// Rows of inline buttons attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    /// Button rows, top to bottom.
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// Empty keyboard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row; empty rows are skipped.
    #[must_use]
    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        if !buttons.is_empty() {
            self.rows.push(buttons);
        }
        self
    }

    /// Every token on the keyboard, in display order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().map(|b| b.token.as_str())
    }
}

/// Delivers chat output for the workflows.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// Send an HTML text message.
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageHandle>;

    /// Replace the text (and keyboard) of a sent message.
    async fn edit_text(
        &self,
        handle: MessageHandle,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<()>;

    /// Send an image by URL.
    async fn send_image(&self, chat_id: i64, url: &str) -> Result<MessageHandle>;

    /// Delete a sent message.
    async fn delete_message(&self, handle: MessageHandle) -> Result<()>;

    /// Name of a chat, when the transport can resolve it.
    async fn chat_display_name(&self, _chat_id: i64) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Escape text for HTML message bodies.
#[must_use]
pub fn escape(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}
