//! Testing helpers for runtime unit tests.

use crate::gateway::{Keyboard, MessageHandle, NotificationGateway};
use anyhow::Result;
use arrbot_core::backend::Candidate;
use async_trait::async_trait;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Send(String),
    Edit(i32, String),
    Image(String),
    Delete(i32),
}

/// Gateway recording every call and handing out increasing message ids.
#[derive(Default)]
pub struct RecordingGateway {
    next_id: AtomicI32,
    calls: Mutex<Vec<GatewayCall>>,
    keyboards: Mutex<Vec<Keyboard>>,
}

impl RecordingGateway {
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn last_keyboard(&self) -> Option<Keyboard> {
        self.keyboards.lock().ok().and_then(|k| k.last().cloned())
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn record(&self, call: GatewayCall, keyboard: Option<&Keyboard>) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if let (Some(keyboard), Ok(mut keyboards)) = (keyboard, self.keyboards.lock()) {
            keyboards.push(keyboard.clone());
        }
    }

    fn handle(&self, chat_id: i64) -> MessageHandle {
        MessageHandle {
            chat_id,
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
        }
    }
}

#[async_trait]
impl NotificationGateway for RecordingGateway {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageHandle> {
        self.record(GatewayCall::Send(text.to_string()), keyboard);
        Ok(self.handle(chat_id))
    }

    async fn edit_text(
        &self,
        handle: MessageHandle,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<()> {
        self.record(GatewayCall::Edit(handle.message_id, text.to_string()), keyboard);
        Ok(())
    }

    async fn send_image(&self, chat_id: i64, url: &str) -> Result<MessageHandle> {
        self.record(GatewayCall::Image(url.to_string()), None);
        Ok(self.handle(chat_id))
    }

    async fn delete_message(&self, handle: MessageHandle) -> Result<()> {
        self.record(GatewayCall::Delete(handle.message_id), None);
        Ok(())
    }
}

pub fn candidate(id: i64, title: &str) -> Candidate {
    Candidate {
        id,
        title: title.to_string(),
        year: 2000,
        overview: String::new(),
        poster: None,
        season_count: None,
        monitored: None,
        status: None,
    }
}
