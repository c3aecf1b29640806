//! Authenticated-user administration.

use super::Outcome;
use crate::context::WorkflowContext;
use crate::error::WorkflowError;
use crate::event::{Action, Event};
use crate::gateway::Keyboard;
use crate::resolver;
use crate::session::{Session, UserAdminState, UserOp, WorkflowState};
use crate::views;
use arrbot_core::access::{AccessEntry, Requester};
use tracing::info;

fn set_state(session: &mut Session, state: UserAdminState) {
    session.workflow = Some(WorkflowState::UserAdmin(state));
}

/// Offer list/add/revoke.
///
/// # Errors
///
/// Returns `WorkflowError::Gateway` if the prompt cannot be sent.
pub async fn start(
    ctx: &WorkflowContext,
    requester: &Requester,
    session: &mut Session,
) -> Result<Outcome, WorkflowError> {
    set_state(session, UserAdminState::AwaitingOperation);
    resolver::present(
        ctx.gateway.as_ref(),
        requester.chat_id,
        &mut session.prompt,
        views::SELECT_USER_OPERATION,
        &views::users_keyboard(),
    )
    .await?;
    Ok(Outcome::Waiting)
}

/// Advance user administration with one event.
///
/// # Errors
///
/// Returns a `WorkflowError` if the access lists or the gateway fail.
pub async fn handle(
    ctx: &WorkflowContext,
    requester: &Requester,
    session: &mut Session,
    state: UserAdminState,
    event: &Event,
) -> Result<Outcome, WorkflowError> {
    let chat_id = requester.chat_id;
    match (state, event) {
        (UserAdminState::AwaitingOperation, Event::Action(Action::Users(UserOp::List))) => {
            let users = ctx.access.list_users().await?;
            let text = if users.is_empty() {
                views::NO_USERS.to_string()
            } else {
                views::user_list(&users)
            };
            ctx.finish_prompt(chat_id, session.prompt, &text).await?;
            Ok(Outcome::Done)
        }
        (UserAdminState::AwaitingOperation, Event::Action(Action::Users(op))) => {
            session.user_op = Some(*op);
            ask_user_id(ctx, chat_id, session).await
        }
        (UserAdminState::AwaitingUserId, Event::Text(text)) => {
            let Ok(target) = text.trim().parse::<i64>() else {
                ctx.say(chat_id, views::INVALID_USER_ID).await?;
                return Ok(Outcome::Waiting);
            };
            apply(ctx, requester, session, target).await
        }
        (UserAdminState::AwaitingOperation, _) => start(ctx, requester, session).await,
        (UserAdminState::AwaitingUserId, _) => ask_user_id(ctx, chat_id, session).await,
    }
}

async fn ask_user_id(
    ctx: &WorkflowContext,
    chat_id: i64,
    session: &mut Session,
) -> Result<Outcome, WorkflowError> {
    set_state(session, UserAdminState::AwaitingUserId);
    let keyboard = Keyboard::new().row(vec![views::stop_button()]);
    resolver::present(
        ctx.gateway.as_ref(),
        chat_id,
        &mut session.prompt,
        views::ENTER_USER_ID,
        &keyboard,
    )
    .await?;
    Ok(Outcome::Waiting)
}

async fn apply(
    ctx: &WorkflowContext,
    requester: &Requester,
    session: &Session,
    target: i64,
) -> Result<Outcome, WorkflowError> {
    let text = match session.user_op {
        Some(UserOp::Add) => {
            let display_name = ctx.gateway.chat_display_name(target).await.ok().flatten();
            let entry = AccessEntry::new(target.to_string(), display_name);
            if ctx.access.add_user(&entry).await? {
                info!("User {target} added by {}", requester.chat_id);
                views::user_added(&entry)
            } else {
                views::user_exists(target)
            }
        }
        Some(UserOp::Revoke) => {
            if ctx.access.revoke_user(target).await? {
                info!("User {target} revoked by {}", requester.chat_id);
                views::user_revoked(target)
            } else {
                views::user_not_found(target)
            }
        }
        Some(UserOp::List) | None => return Err(WorkflowError::Incomplete("user operation")),
    };
    ctx.say(requester.chat_id, &text).await?;
    Ok(Outcome::Done)
}
