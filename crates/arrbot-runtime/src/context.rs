use crate::error::WorkflowError;
use crate::gateway::{MessageHandle, NotificationGateway};
use arrbot_core::access::{AccessPolicy, Requester};
use arrbot_core::backend::{BackendRegistry, MediaBackend, MediaKind};
use arrbot_core::config::AppSettings;
use arrbot_core::download::DownloadClient;
use std::sync::Arc;
use tracing::warn;

/// Collaborators shared by every chat.
///
/// Everything here is read-only after startup; per-chat state lives in the
/// session only.
#[derive(Clone)]
pub struct WorkflowContext {
    /// Chat output.
    pub gateway: Arc<dyn NotificationGateway>,
    /// Media backends by kind.
    pub backends: Arc<BackendRegistry>,
    /// Download client, when enabled.
    pub download: Option<Arc<dyn DownloadClient>>,
    /// Access lists.
    pub access: Arc<dyn AccessPolicy>,
    /// Application settings.
    pub settings: Arc<AppSettings>,
}

impl WorkflowContext {
    /// Backend bound to the labelled instance.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::UnknownInstance` if no such instance is configured.
    pub fn backend(&self, kind: MediaKind, label: &str) -> Result<Arc<dyn MediaBackend>, WorkflowError> {
        self.backends
            .get(kind, label)
            .ok_or_else(|| WorkflowError::UnknownInstance(label.to_string()))
    }

    /// Send a message without buttons.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Gateway` if delivery fails.
    pub async fn say(&self, chat_id: i64, text: &str) -> Result<MessageHandle, WorkflowError> {
        Ok(self.gateway.send_text(chat_id, text, None).await?)
    }

    /// Replace the prompt message with `text`, or send it when there is none.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Gateway` if delivery fails.
    pub async fn finish_prompt(
        &self,
        chat_id: i64,
        prompt: Option<MessageHandle>,
        text: &str,
    ) -> Result<(), WorkflowError> {
        match prompt {
            Some(handle) => self.gateway.edit_text(handle, text, None).await?,
            None => {
                self.gateway.send_text(chat_id, text, None).await?;
            }
        }
        Ok(())
    }

    /// Whether the requester is an admin. Lookup failures count as "no".
    pub async fn is_admin(&self, requester: &Requester) -> bool {
        match self.access.is_admin(requester).await {
            Ok(admin) => admin,
            Err(e) => {
                warn!("Admin lookup for {} failed: {e}", requester.chat_id);
                false
            }
        }
    }

    /// Forward a notice to the admin chat, unless the requester is an admin or
    /// no admin chat is configured. Failures are logged only.
    pub async fn notify_admin(&self, requester: &Requester, text: &str) {
        let Some(admin_chat) = self.settings.admin_notify_id else {
            return;
        };
        if self.is_admin(requester).await {
            return;
        }
        if let Err(e) = self.gateway.send_text(admin_chat, text, None).await {
            warn!("Admin notification to {admin_chat} failed: {e}");
        }
    }
}
