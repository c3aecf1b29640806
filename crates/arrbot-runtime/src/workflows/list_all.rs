//! Library listing.

use super::{choose_instance, instances, media_kind, selected_backend, Outcome};
use crate::context::WorkflowContext;
use crate::error::WorkflowError;
use crate::event::{Action, Event};
use crate::resolver::find_choice;
use crate::session::{Session, WorkflowState};
use crate::views;
use arrbot_core::access::Requester;
use arrbot_core::backend::MediaKind;
use arrbot_core::config::MESSAGE_CHAR_LIMIT;
use arrbot_core::utils::pack_entries;
use tracing::{info, warn};

/// Start listing the `kind` library.
///
/// # Errors
///
/// Returns a `WorkflowError` if a backend or gateway call fails.
pub async fn start(
    ctx: &WorkflowContext,
    requester: &Requester,
    session: &mut Session,
    kind: MediaKind,
) -> Result<Outcome, WorkflowError> {
    session.workflow = Some(WorkflowState::ListAll);
    session.media_kind = Some(kind);
    offer_instances(ctx, requester, session).await
}

/// Handle the instance choice.
///
/// # Errors
///
/// Returns a `WorkflowError` if a backend or gateway call fails.
pub async fn handle(
    ctx: &WorkflowContext,
    requester: &Requester,
    session: &mut Session,
    event: &Event,
) -> Result<Outcome, WorkflowError> {
    if let Event::Action(action @ Action::Instance(_)) = event {
        let options = instances(ctx, media_kind(session)?);
        if let Some(instance) = find_choice(&options, action) {
            session.instance_label = Some(instance.label.clone());
            return list(ctx, requester, session).await;
        }
    }
    offer_instances(ctx, requester, session).await
}

async fn offer_instances(
    ctx: &WorkflowContext,
    requester: &Requester,
    session: &mut Session,
) -> Result<Outcome, WorkflowError> {
    match choose_instance(ctx, requester.chat_id, session).await? {
        Some(label) => {
            session.instance_label = Some(label);
            list(ctx, requester, session).await
        }
        None => Ok(Outcome::Waiting),
    }
}

async fn list(
    ctx: &WorkflowContext,
    requester: &Requester,
    session: &mut Session,
) -> Result<Outcome, WorkflowError> {
    let chat_id = requester.chat_id;
    let backend = selected_backend(ctx, session)?;
    let instance = backend.instance();

    if instance.admin_restrictions && !ctx.is_admin(requester).await {
        warn!("[{}] Listing denied for non-admin {chat_id}", instance.label);
        ctx.finish_prompt(chat_id, session.prompt.take(), views::NOT_ADMIN)
            .await?;
        return Ok(Outcome::Done);
    }

    ctx.finish_prompt(chat_id, session.prompt.take(), views::LOADING_ALL)
        .await?;
    let entries: Vec<String> = backend
        .list_library()
        .await?
        .iter()
        .map(views::library_entry)
        .collect();
    info!(
        "[{}] Listing {} items for chat {chat_id}",
        instance.label,
        entries.len()
    );

    if entries.is_empty() {
        ctx.say(chat_id, views::EMPTY_LIBRARY).await?;
        return Ok(Outcome::Done);
    }
    for chunk in pack_entries(&entries, MESSAGE_CHAR_LIMIT) {
        ctx.say(chat_id, &chunk).await?;
    }
    Ok(Outcome::Done)
}
