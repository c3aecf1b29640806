//! Delete workflow.

use super::{ask_kind, ask_title, choose_instance, instances, media_kind, selected_backend, Outcome};
use crate::context::WorkflowContext;
use crate::error::WorkflowError;
use crate::event::{Action, Event};
use crate::pagination::{self, PageView};
use crate::resolver::find_choice;
use crate::session::{DeleteState, Session, WorkflowState};
use crate::views;
use arrbot_core::access::Requester;
use arrbot_core::backend::{BackendError, MediaKind};
use tracing::{debug, error, info, warn};

fn set_state(session: &mut Session, state: DeleteState) {
    session.workflow = Some(WorkflowState::Delete(state));
}

/// Start deleting.
///
/// # Errors
///
/// Returns a `WorkflowError` if a backend or gateway call fails.
pub async fn start(
    ctx: &WorkflowContext,
    requester: &Requester,
    session: &mut Session,
    kind: Option<MediaKind>,
    title: Option<String>,
) -> Result<Outcome, WorkflowError> {
    ctx.notify_admin(requester, &views::admin_started(requester, "deleting media"))
        .await;
    session.media_kind = kind;

    match title.filter(|t| !t.trim().is_empty()) {
        Some(title) => {
            session.query_title = Some(title);
            after_title(ctx, requester, session).await
        }
        None => {
            set_state(session, DeleteState::AwaitingTitle);
            ask_title(ctx, requester.chat_id, session).await?;
            Ok(Outcome::Waiting)
        }
    }
}

/// Advance the delete workflow with one event.
///
/// # Errors
///
/// Returns a `WorkflowError` if a backend or gateway call fails.
pub async fn handle(
    ctx: &WorkflowContext,
    requester: &Requester,
    session: &mut Session,
    state: DeleteState,
    event: &Event,
) -> Result<Outcome, WorkflowError> {
    match (state, event) {
        (DeleteState::AwaitingTitle, Event::Text(title)) => {
            session.query_title = Some(title.clone());
            after_title(ctx, requester, session).await
        }
        (_, Event::Action(Action::New)) if state != DeleteState::AwaitingTitle => {
            pagination::discard_card(ctx.gateway.as_ref(), requester.chat_id, session).await;
            session.clear();
            set_state(session, DeleteState::AwaitingTitle);
            ask_title(ctx, requester.chat_id, session).await?;
            Ok(Outcome::Waiting)
        }
        (DeleteState::AwaitingMediaKind, Event::Action(Action::Kind(kind))) => {
            session.media_kind = Some(*kind);
            offer_instances(ctx, requester, session).await
        }
        (DeleteState::AwaitingInstance, Event::Action(action @ Action::Instance(_))) => {
            let options = instances(ctx, media_kind(session)?);
            match find_choice(&options, action) {
                Some(instance) => {
                    session.instance_label = Some(instance.label.clone());
                    search(ctx, requester, session).await
                }
                None => rerender(ctx, requester, session, state).await,
            }
        }
        (DeleteState::AwaitingConfirmation, Event::Action(Action::Delete)) => {
            remove(ctx, requester, session).await
        }
        _ => {
            debug!(
                "Input {event:?} does not fit {state:?} for chat {}, re-rendering",
                requester.chat_id
            );
            rerender(ctx, requester, session, state).await
        }
    }
}

/// Show the prompt of the current step again.
///
/// # Errors
///
/// Returns a `WorkflowError` if a backend or gateway call fails.
pub async fn rerender(
    ctx: &WorkflowContext,
    requester: &Requester,
    session: &mut Session,
    state: DeleteState,
) -> Result<Outcome, WorkflowError> {
    match state {
        DeleteState::AwaitingTitle => ask_title(ctx, requester.chat_id, session).await?,
        DeleteState::AwaitingMediaKind => ask_kind(ctx, requester.chat_id, session).await?,
        DeleteState::AwaitingInstance => return offer_instances(ctx, requester, session).await,
        DeleteState::AwaitingConfirmation => show_card(ctx, requester.chat_id, session).await?,
    }
    Ok(Outcome::Waiting)
}

async fn after_title(
    ctx: &WorkflowContext,
    requester: &Requester,
    session: &mut Session,
) -> Result<Outcome, WorkflowError> {
    if session.media_kind.is_none() {
        set_state(session, DeleteState::AwaitingMediaKind);
        ask_kind(ctx, requester.chat_id, session).await?;
        return Ok(Outcome::Waiting);
    }
    offer_instances(ctx, requester, session).await
}

async fn offer_instances(
    ctx: &WorkflowContext,
    requester: &Requester,
    session: &mut Session,
) -> Result<Outcome, WorkflowError> {
    set_state(session, DeleteState::AwaitingInstance);
    match choose_instance(ctx, requester.chat_id, session).await? {
        Some(label) => {
            session.instance_label = Some(label);
            search(ctx, requester, session).await
        }
        None => Ok(Outcome::Waiting),
    }
}

/// Look the title up and offer the best match, if the library has it.
async fn search(
    ctx: &WorkflowContext,
    requester: &Requester,
    session: &mut Session,
) -> Result<Outcome, WorkflowError> {
    let chat_id = requester.chat_id;
    let kind = media_kind(session)?;
    let backend = selected_backend(ctx, session)?;
    let title = session
        .query_title
        .clone()
        .ok_or(WorkflowError::Incomplete("title"))?;

    if backend.instance().admin_restrictions && !ctx.is_admin(requester).await {
        warn!(
            "[{}] Delete denied for non-admin {chat_id}",
            backend.instance().label
        );
        ctx.finish_prompt(chat_id, session.prompt.take(), views::NOT_ADMIN)
            .await?;
        return Ok(Outcome::Done);
    }

    let raw = backend.search(&title).await?;
    let Some(best) = backend.normalize(&raw).into_iter().next() else {
        ctx.finish_prompt(chat_id, session.prompt.take(), &views::search_results(0))
            .await?;
        return Ok(Outcome::Done);
    };

    if !backend.in_library(best.id).await? {
        info!(
            "[{}] Delete of '{}' requested by {chat_id}, not in library",
            backend.instance().label,
            best.title
        );
        ctx.finish_prompt(chat_id, session.prompt.take(), &views::does_not_exist(kind))
            .await?;
        return Ok(Outcome::Done);
    }

    session.set_candidates(vec![best]);
    set_state(session, DeleteState::AwaitingConfirmation);
    show_card(ctx, chat_id, session).await?;
    Ok(Outcome::Waiting)
}

async fn show_card(
    ctx: &WorkflowContext,
    chat_id: i64,
    session: &mut Session,
) -> Result<(), WorkflowError> {
    let kind = media_kind(session)?;
    let view = PageView::of(session).ok_or(WorkflowError::Incomplete("search results"))?;
    let caption = session
        .current_candidate()
        .map(|c| views::card_caption(&view, c))
        .ok_or(WorkflowError::Incomplete("search results"))?;

    pagination::show_card(
        ctx.gateway.as_ref(),
        chat_id,
        session,
        &caption,
        &views::delete_question(kind),
        &views::delete_card_keyboard(),
    )
    .await?;
    Ok(())
}

async fn remove(
    ctx: &WorkflowContext,
    requester: &Requester,
    session: &mut Session,
) -> Result<Outcome, WorkflowError> {
    let chat_id = requester.chat_id;
    let kind = media_kind(session)?;
    let backend = selected_backend(ctx, session)?;
    let candidate = session
        .current_candidate()
        .cloned()
        .ok_or(WorkflowError::Incomplete("selected result"))?;
    let label = &backend.instance().label;

    let text = match backend.remove_from_library(candidate.id).await {
        Ok(()) => {
            info!("[{label}] {kind} '{}' deleted by {chat_id}", candidate.title);
            ctx.notify_admin(
                requester,
                &views::admin_deleted(requester, kind, &candidate.title),
            )
            .await;
            views::delete_success(kind)
        }
        Err(BackendError::NotFound(_)) => views::does_not_exist(kind),
        Err(e) => {
            error!("[{label}] Deleting {kind} '{}' failed: {e}", candidate.title);
            views::delete_failed(kind)
        }
    };
    ctx.finish_prompt(chat_id, session.prompt, &text).await?;
    Ok(Outcome::Done)
}
