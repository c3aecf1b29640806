//! Workflow controllers.
//!
//! Each controller is a set of async steps over a locked [`Session`]. A step
//! returns [`Outcome::Waiting`] when it rendered a prompt and stored its state,
//! or [`Outcome::Done`] when the workflow is over and the session may be cleared.

/// Add a movie or series.
pub mod add;
/// One-shot commands: authenticate, help, notification subscription.
pub mod commands;
/// Delete a movie or series.
pub mod delete;
/// List a whole library.
pub mod list_all;
/// Switch download speed limits.
pub mod speed;
/// Manage authenticated chats.
pub mod users;

use crate::context::WorkflowContext;
use crate::error::WorkflowError;
use crate::resolver::{self, Decision};
use crate::session::Session;
use crate::views;
use arrbot_core::backend::{MediaBackend, MediaKind};
use arrbot_core::config::InstanceConfig;
use std::sync::Arc;

/// Result of one workflow step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Prompt shown, state stored.
    Waiting,
    /// Workflow finished.
    Done,
}

pub(crate) fn media_kind(session: &Session) -> Result<MediaKind, WorkflowError> {
    session.media_kind.ok_or(WorkflowError::Incomplete("media kind"))
}

pub(crate) fn selected_backend(
    ctx: &WorkflowContext,
    session: &Session,
) -> Result<Arc<dyn MediaBackend>, WorkflowError> {
    let label = session
        .instance_label
        .as_deref()
        .ok_or(WorkflowError::Incomplete("instance"))?;
    ctx.backend(media_kind(session)?, label)
}

/// Instance configs of a kind, in configuration order.
pub(crate) fn instances(ctx: &WorkflowContext, kind: MediaKind) -> Vec<InstanceConfig> {
    ctx.backends
        .instances(kind)
        .iter()
        .map(|b| b.instance().clone())
        .collect()
}

/// Offer the instances of the session's media kind.
///
/// Returns the label when there is exactly one, `None` when a chooser was shown.
pub(crate) async fn choose_instance(
    ctx: &WorkflowContext,
    chat_id: i64,
    session: &mut Session,
) -> Result<Option<String>, WorkflowError> {
    let options = instances(ctx, media_kind(session)?);
    match resolver::resolve(
        ctx.gateway.as_ref(),
        chat_id,
        &mut session.prompt,
        views::SELECT_INSTANCE,
        &options,
    )
    .await?
    {
        Decision::Advanced(instance) => Ok(Some(instance.label.clone())),
        Decision::AwaitingInput => Ok(None),
        Decision::NoOptionsAvailable => Err(WorkflowError::NoOptions("instances")),
    }
}

/// Ask for a title. The answer arrives below it, so the next prompt is a new message.
pub(crate) async fn ask_title(
    ctx: &WorkflowContext,
    chat_id: i64,
    session: &mut Session,
) -> Result<(), WorkflowError> {
    ctx.say(chat_id, views::ASK_TITLE).await?;
    session.prompt = None;
    Ok(())
}

/// Offer Movie/Series.
pub(crate) async fn ask_kind(
    ctx: &WorkflowContext,
    chat_id: i64,
    session: &mut Session,
) -> Result<(), WorkflowError> {
    resolver::present(
        ctx.gateway.as_ref(),
        chat_id,
        &mut session.prompt,
        views::ASK_KIND,
        &views::kind_keyboard(),
    )
    .await?;
    Ok(())
}
