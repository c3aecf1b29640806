use super::Outcome;
use crate::context::WorkflowContext;
use crate::error::WorkflowError;
use crate::session::{Session, WorkflowState};
use crate::views;
use arrbot_core::access::{AuthOutcome, Requester};
use tracing::{info, warn};

/// `/auth [password]`.
///
/// Without a password the next text message is taken as the attempt.
///
/// # Errors
///
/// Returns a `WorkflowError` if the access lists or the gateway fail.
pub async fn auth(
    ctx: &WorkflowContext,
    requester: &Requester,
    session: &mut Session,
    password: &str,
) -> Result<Outcome, WorkflowError> {
    if !password.trim().is_empty() {
        return authenticate(ctx, requester, session, password).await;
    }
    if ctx.access.is_authenticated(requester.chat_id).await? {
        ctx.say(requester.chat_id, views::ALREADY_AUTHENTICATED).await?;
        return Ok(Outcome::Done);
    }
    request_password(ctx, requester.chat_id, session, WorkflowState::Authenticate).await
}

/// Ask for the password and park the session in `state` until it arrives.
///
/// # Errors
///
/// Returns `WorkflowError::Gateway` if the prompt cannot be sent.
pub async fn request_password(
    ctx: &WorkflowContext,
    chat_id: i64,
    session: &mut Session,
    state: WorkflowState,
) -> Result<Outcome, WorkflowError> {
    session.workflow = Some(state);
    ctx.say(chat_id, views::AUTHORIZE).await?;
    Ok(Outcome::Waiting)
}

/// Treat `password` as an authentication attempt.
///
/// # Errors
///
/// Returns a `WorkflowError` if the access lists or the gateway fail.
pub async fn authenticate(
    ctx: &WorkflowContext,
    requester: &Requester,
    session: &mut Session,
    password: &str,
) -> Result<Outcome, WorkflowError> {
    if check_password(ctx, requester, password).await? {
        Ok(Outcome::Done)
    } else {
        session.workflow = Some(WorkflowState::Authenticate);
        Ok(Outcome::Waiting)
    }
}

/// Reply to a password attempt. `true` when the chat is authenticated now.
pub(crate) async fn check_password(
    ctx: &WorkflowContext,
    requester: &Requester,
    password: &str,
) -> Result<bool, WorkflowError> {
    let (text, authenticated) = match ctx.access.authenticate(requester, password).await? {
        AuthOutcome::Granted => (views::AUTHENTICATED, true),
        AuthOutcome::AlreadyAuthenticated => (views::ALREADY_AUTHENTICATED, true),
        AuthOutcome::WrongPassword => (views::WRONG_PASSWORD, false),
    };
    ctx.say(requester.chat_id, text).await?;
    Ok(authenticated)
}

/// `/help`.
///
/// # Errors
///
/// Returns `WorkflowError::Gateway` if the reply cannot be sent.
pub async fn help(ctx: &WorkflowContext, chat_id: i64) -> Result<(), WorkflowError> {
    ctx.say(chat_id, &views::help(&ctx.settings.entrypoints))
        .await?;
    Ok(())
}

/// `/notify`: make sure every instance notifies this chat.
///
/// Instances that fail are logged and skipped. The reply reports a failure only
/// when no instance has a profile for the chat afterwards.
///
/// # Errors
///
/// Returns `WorkflowError::Gateway` if the reply cannot be sent.
pub async fn notify(ctx: &WorkflowContext, requester: &Requester) -> Result<(), WorkflowError> {
    let chat_id = requester.chat_id;
    let name = format!("{chat_id} ({})", requester.display_name);
    let (mut created, mut existing) = (0, 0);

    for backend in ctx.backends.all() {
        let label = &backend.instance().label;
        match backend.notification_profile_exists(chat_id).await {
            Ok(true) => {
                existing += 1;
                continue;
            }
            Ok(false) => {}
            Err(e) => {
                warn!("[{label}] Notification lookup for {chat_id} failed: {e}");
                continue;
            }
        }
        match backend.create_notification_profile(&name, chat_id).await {
            Ok(()) => {
                info!("[{label}] Notification profile created for {chat_id}");
                created += 1;
            }
            Err(e) => warn!("[{label}] Notification profile for {chat_id} failed: {e}"),
        }
    }

    let text = if created > 0 {
        views::PROFILE_CREATED
    } else if existing > 0 {
        views::PROFILE_EXISTS
    } else {
        views::PROFILE_FAILED
    };
    ctx.say(chat_id, text).await?;
    Ok(())
}
