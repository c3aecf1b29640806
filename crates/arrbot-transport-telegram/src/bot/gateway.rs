use super::resilient::{edit_message_resilient, send_message_resilient};
use super::views::inline_keyboard;
use anyhow::{Context, Result};
use arrbot_runtime::{Keyboard, MessageHandle, NotificationGateway};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InputFile, MessageId};

/// [`NotificationGateway`] backed by the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    /// Gateway sending through `bot`.
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn handle(message: &Message) -> MessageHandle {
    MessageHandle {
        chat_id: message.chat.id.0,
        message_id: message.id.0,
    }
}

#[async_trait]
impl NotificationGateway for TelegramGateway {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageHandle> {
        let message =
            send_message_resilient(&self.bot, ChatId(chat_id), text, keyboard.map(inline_keyboard))
                .await?;
        Ok(handle(&message))
    }

    async fn edit_text(
        &self,
        target: MessageHandle,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<()> {
        edit_message_resilient(
            &self.bot,
            ChatId(target.chat_id),
            MessageId(target.message_id),
            text,
            keyboard.map(inline_keyboard),
        )
        .await
    }

    async fn send_image(&self, chat_id: i64, url: &str) -> Result<MessageHandle> {
        let url = url
            .parse::<reqwest::Url>()
            .with_context(|| format!("Invalid image URL: {url}"))?;
        let message = self
            .bot
            .send_photo(ChatId(chat_id), InputFile::url(url))
            .await
            .context("Telegram photo error")?;
        Ok(handle(&message))
    }

    async fn delete_message(&self, target: MessageHandle) -> Result<()> {
        self.bot
            .delete_message(ChatId(target.chat_id), MessageId(target.message_id))
            .await
            .context("Telegram delete error")?;
        Ok(())
    }

    async fn chat_display_name(&self, chat_id: i64) -> Result<Option<String>> {
        let chat = self
            .bot
            .get_chat(ChatId(chat_id))
            .await
            .context("Telegram chat lookup error")?;
        let name = chat
            .title()
            .or_else(|| chat.username())
            .or_else(|| chat.first_name())
            .map(str::to_string);
        Ok(name)
    }
}
