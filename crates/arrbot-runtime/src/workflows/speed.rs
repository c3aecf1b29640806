//! Download speed toggle.

use super::commands::check_password;
use super::Outcome;
use crate::context::WorkflowContext;
use crate::error::WorkflowError;
use crate::event::{Action, Event};
use crate::resolver;
use crate::session::{Session, SpeedState, WorkflowState};
use crate::views;
use arrbot_core::access::Requester;
use arrbot_core::download::SpeedMode;
use tracing::{error, info};

/// Offer the speed modes to an authenticated requester.
///
/// # Errors
///
/// Returns `WorkflowError::Gateway` if the prompt cannot be sent.
pub async fn start(
    ctx: &WorkflowContext,
    requester: &Requester,
    session: &mut Session,
) -> Result<Outcome, WorkflowError> {
    if ctx.settings.qbittorrent.only_admin && !ctx.is_admin(requester).await {
        ctx.finish_prompt(requester.chat_id, session.prompt.take(), views::NOT_ADMIN)
            .await?;
        return Ok(Outcome::Done);
    }
    offer_modes(ctx, requester.chat_id, session).await
}

/// Advance the speed toggle with one event.
///
/// # Errors
///
/// Returns a `WorkflowError` if the access lists or the gateway fail. A
/// download client failure is reported to the chat instead.
pub async fn handle(
    ctx: &WorkflowContext,
    requester: &Requester,
    session: &mut Session,
    state: SpeedState,
    event: &Event,
) -> Result<Outcome, WorkflowError> {
    match (state, event) {
        (SpeedState::AwaitingAuthentication, Event::Text(password)) => {
            if check_password(ctx, requester, password).await? {
                start(ctx, requester, session).await
            } else {
                Ok(Outcome::Waiting)
            }
        }
        (SpeedState::AwaitingModeChoice, Event::Action(Action::Speed(mode))) => {
            switch(ctx, requester, session, *mode).await
        }
        (SpeedState::AwaitingAuthentication, _) => {
            ctx.say(requester.chat_id, views::AUTHORIZE).await?;
            Ok(Outcome::Waiting)
        }
        (SpeedState::AwaitingModeChoice, _) => offer_modes(ctx, requester.chat_id, session).await,
    }
}

async fn offer_modes(
    ctx: &WorkflowContext,
    chat_id: i64,
    session: &mut Session,
) -> Result<Outcome, WorkflowError> {
    session.workflow = Some(WorkflowState::SpeedToggle(SpeedState::AwaitingModeChoice));
    resolver::present(
        ctx.gateway.as_ref(),
        chat_id,
        &mut session.prompt,
        views::SELECT_SPEED,
        &views::speed_keyboard(),
    )
    .await?;
    Ok(Outcome::Waiting)
}

async fn switch(
    ctx: &WorkflowContext,
    requester: &Requester,
    session: &mut Session,
    mode: SpeedMode,
) -> Result<Outcome, WorkflowError> {
    let chat_id = requester.chat_id;
    let text = match &ctx.download {
        None => views::SPEED_NOT_ENABLED.to_string(),
        Some(client) => match client.set_speed_mode(mode).await {
            Ok(()) => {
                info!("Speed mode set to {mode} by {chat_id}");
                views::speed_changed(mode)
            }
            Err(e) => {
                error!("Switching speed mode to {mode} failed: {e}");
                views::SPEED_ERROR.to_string()
            }
        },
    };
    ctx.finish_prompt(chat_id, session.prompt, &text).await?;
    Ok(Outcome::Done)
}
