//! Update handlers.
//!
//! Both handlers only translate Telegram updates into [`Inbound`] events; every
//! decision is taken by the dialog router.

use arrbot_core::access::Requester;
use arrbot_runtime::{DialogRouter, Inbound, InboundKind};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::prelude::Requester as _;
use teloxide::types::{CallbackQuery, User};
use tracing::{debug, warn};

/// Requester identity of a Telegram user in a chat.
#[must_use]
pub fn requester(user: Option<&User>, chat_id: ChatId) -> Requester {
    Requester {
        chat_id: chat_id.0,
        user_id: user.map_or(0, |u| u.id.0.cast_signed()),
        username: user.and_then(|u| u.username.clone()),
        display_name: user.map_or_else(|| chat_id.0.to_string(), User::full_name),
    }
}

/// Forward a text message to the router.
///
/// # Errors
///
/// Never fails; the signature matches the dispatcher's endpoint contract.
pub async fn handle_message(
    msg: Message,
    router: Arc<DialogRouter>,
) -> Result<(), teloxide::RequestError> {
    let Some(text) = msg.text() else {
        return respond(());
    };
    let inbound = Inbound {
        requester: requester(msg.from.as_ref(), msg.chat.id),
        kind: InboundKind::Text(text.to_string()),
    };
    router.handle(inbound).await;
    respond(())
}

/// Acknowledge a button press and forward its token to the router.
///
/// # Errors
///
/// Never fails; the signature matches the dispatcher's endpoint contract.
pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    router: Arc<DialogRouter>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        debug!("Callback answer failed: {e}");
    }

    let Some(token) = q.data.clone() else {
        return respond(());
    };
    let Some(chat_id) = q.message.as_ref().map(|m| m.chat().id) else {
        warn!("Callback from {} without a message, ignoring", q.from.id);
        return respond(());
    };

    let inbound = Inbound {
        requester: requester(Some(&q.from), chat_id),
        kind: InboundKind::Action(token),
    };
    router.handle(inbound).await;
    respond(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::UserId;

    #[test]
    fn test_requester_from_user() {
        let user = User {
            id: UserId(42),
            is_bot: false,
            first_name: "Ada".to_string(),
            last_name: Some("Lovelace".to_string()),
            username: Some("ada".to_string()),
            language_code: None,
            is_premium: false,
            added_to_attachment_menu: false,
        };

        let r = requester(Some(&user), ChatId(-100));

        assert_eq!(r.chat_id, -100);
        assert_eq!(r.user_id, 42);
        assert_eq!(r.username.as_deref(), Some("ada"));
        assert_eq!(r.display_name, "Ada Lovelace");
    }

    #[test]
    fn test_requester_without_user() {
        let r = requester(None, ChatId(7));
        assert_eq!(r.user_id, 0);
        assert_eq!(r.display_name, "7");
    }
}
