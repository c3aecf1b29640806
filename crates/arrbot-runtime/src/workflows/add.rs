//! Add workflow.
//!
//! Title, kind, instance, result confirmation, root folder, quality profile and
//! (for series) seasons, then a single add call. Steps with exactly one option
//! are skipped.

use super::{ask_kind, ask_title, choose_instance, instances, media_kind, selected_backend, Outcome};
use crate::context::WorkflowContext;
use crate::error::WorkflowError;
use crate::event::{Action, Event};
use crate::pagination::{self, Direction, PageView};
use crate::resolver::{self, chooser_keyboard, find_choice, Decision, PathChoice};
use crate::session::{AddState, Session, WorkflowState};
use crate::views::{self, AddOutcome};
use arrbot_core::access::Requester;
use arrbot_core::backend::{
    visible_quality_profiles, visible_root_folders, AddRequest, MediaBackend, MediaKind,
};
use tracing::{debug, error, info, warn};

fn set_state(session: &mut Session, state: AddState) {
    session.workflow = Some(WorkflowState::Add(state));
}

/// Start adding. Shortcuts like `movie <title>` preset the kind and title.
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
    ctx.notify_admin(requester, &views::admin_started(requester, "adding media"))
        .await;
    session.media_kind = kind;

    match title.filter(|t| !t.trim().is_empty()) {
        Some(title) => {
            session.query_title = Some(title);
            after_title(ctx, requester, session).await
        }
        None => {
            set_state(session, AddState::AwaitingTitle);
            ask_title(ctx, requester.chat_id, session).await?;
            Ok(Outcome::Waiting)
        }
    }
}

/// Advance the add workflow with one event.
///
/// Input that does not fit the current step re-renders that step.
///
/// # Errors
///
/// Returns a `WorkflowError` if a backend or gateway call fails.
pub async fn handle(
    ctx: &WorkflowContext,
    requester: &Requester,
    session: &mut Session,
    state: AddState,
    event: &Event,
) -> Result<Outcome, WorkflowError> {
    match (state, event) {
        (AddState::AwaitingTitle, Event::Text(title)) => {
            session.query_title = Some(title.clone());
            after_title(ctx, requester, session).await
        }
        (_, Event::Action(Action::New)) if state != AddState::AwaitingTitle => {
            restart(ctx, requester.chat_id, session).await
        }
        (AddState::AwaitingMediaKind, Event::Action(Action::Kind(kind))) => {
            session.media_kind = Some(*kind);
            offer_instances(ctx, requester, session).await
        }
        (AddState::AwaitingInstance, Event::Action(action @ Action::Instance(_))) => {
            let options = instances(ctx, media_kind(session)?);
            match find_choice(&options, action) {
                Some(instance) => {
                    session.instance_label = Some(instance.label.clone());
                    search(ctx, requester, session).await
                }
                None => rerender(ctx, requester, session, state).await,
            }
        }
        (AddState::AwaitingResultConfirmation, Event::Action(Action::Prev | Action::Next)) => {
            let direction = if matches!(event, Event::Action(Action::Prev)) {
                Direction::Previous
            } else {
                Direction::Next
            };
            session.cursor = pagination::advance(session.cursor, session.candidates.len(), direction);
            show_result(ctx, requester.chat_id, session).await?;
            Ok(Outcome::Waiting)
        }
        (AddState::AwaitingResultConfirmation, Event::Action(Action::Add)) => {
            offer_paths(ctx, requester, session).await
        }
        (AddState::AwaitingPath, Event::Action(Action::Path(index)))
            if *index < session.available_paths.len() =>
        {
            select_path(ctx, requester, session, *index).await
        }
        (AddState::AwaitingQualityProfile, Event::Action(action @ Action::Quality(_))) => {
            match find_choice(&session.available_quality_profiles, action).map(|p| p.id) {
                Some(id) => select_quality(ctx, requester, session, id).await,
                None => rerender(ctx, requester, session, state).await,
            }
        }
        (AddState::AwaitingSeasons, Event::Action(Action::Season(season)))
            if session.toggle_season(*season) =>
        {
            render_seasons(ctx, requester.chat_id, session).await?;
            Ok(Outcome::Waiting)
        }
        (AddState::AwaitingSeasons, Event::Action(Action::AllSeasons))
            if !session.all_seasons_selected() =>
        {
            session.select_all_seasons();
            render_seasons(ctx, requester.chat_id, session).await?;
            Ok(Outcome::Waiting)
        }
        (AddState::AwaitingSeasons, Event::Action(Action::NoSeasons))
            if session.all_seasons_selected() =>
        {
            session.deselect_all_seasons();
            render_seasons(ctx, requester.chat_id, session).await?;
            Ok(Outcome::Waiting)
        }
        (AddState::AwaitingSeasons, Event::Action(Action::CommitSeasons)) => {
            commit(ctx, requester, session).await
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
    state: AddState,
) -> Result<Outcome, WorkflowError> {
    let chat_id = requester.chat_id;
    match state {
        AddState::AwaitingTitle => ask_title(ctx, chat_id, session).await?,
        AddState::AwaitingMediaKind => ask_kind(ctx, chat_id, session).await?,
        AddState::AwaitingInstance => return offer_instances(ctx, requester, session).await,
        AddState::AwaitingResultConfirmation => show_result(ctx, chat_id, session).await?,
        AddState::AwaitingPath => {
            let narrow = selected_backend(ctx, session)?
                .instance()
                .narrow_root_folder_names;
            let keyboard = chooser_keyboard(&PathChoice::from_folders(&session.available_paths, narrow));
            resolver::present(ctx.gateway.as_ref(), chat_id, &mut session.prompt, views::SELECT_PATH, &keyboard)
                .await?;
        }
        AddState::AwaitingQualityProfile => {
            let keyboard = chooser_keyboard(&session.available_quality_profiles);
            resolver::present(ctx.gateway.as_ref(), chat_id, &mut session.prompt, views::SELECT_QUALITY, &keyboard)
                .await?;
        }
        AddState::AwaitingSeasons => render_seasons(ctx, chat_id, session).await?,
    }
    Ok(Outcome::Waiting)
}

async fn restart(
    ctx: &WorkflowContext,
    chat_id: i64,
    session: &mut Session,
) -> Result<Outcome, WorkflowError> {
    pagination::discard_card(ctx.gateway.as_ref(), chat_id, session).await;
    session.clear();
    set_state(session, AddState::AwaitingTitle);
    ask_title(ctx, chat_id, session).await?;
    Ok(Outcome::Waiting)
}

async fn after_title(
    ctx: &WorkflowContext,
    requester: &Requester,
    session: &mut Session,
) -> Result<Outcome, WorkflowError> {
    if session.media_kind.is_none() {
        set_state(session, AddState::AwaitingMediaKind);
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
    set_state(session, AddState::AwaitingInstance);
    match choose_instance(ctx, requester.chat_id, session).await? {
        Some(label) => {
            debug!("Only instance {label} configured, skipping the chooser");
            session.instance_label = Some(label);
            search(ctx, requester, session).await
        }
        None => Ok(Outcome::Waiting),
    }
}

async fn search(
    ctx: &WorkflowContext,
    requester: &Requester,
    session: &mut Session,
) -> Result<Outcome, WorkflowError> {
    let chat_id = requester.chat_id;
    let backend = selected_backend(ctx, session)?;
    let title = session
        .query_title
        .clone()
        .ok_or(WorkflowError::Incomplete("title"))?;

    let raw = backend.search(&title).await?;
    let candidates = backend.normalize(&raw);
    info!(
        "[{}] Search '{title}' for chat {chat_id}: {} results",
        backend.instance().label,
        candidates.len()
    );

    if candidates.is_empty() {
        ctx.finish_prompt(chat_id, session.prompt.take(), &views::search_results(0))
            .await?;
        return Ok(Outcome::Done);
    }

    session.set_candidates(candidates);
    set_state(session, AddState::AwaitingResultConfirmation);
    show_result(ctx, chat_id, session).await?;
    Ok(Outcome::Waiting)
}

async fn show_result(
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
        &views::add_question(kind),
        &views::add_card_keyboard(&view),
    )
    .await?;
    Ok(())
}

async fn offer_paths(
    ctx: &WorkflowContext,
    requester: &Requester,
    session: &mut Session,
) -> Result<Outcome, WorkflowError> {
    let backend = selected_backend(ctx, session)?;
    let folders = visible_root_folders(backend.instance(), backend.list_root_folders().await?);
    let choices = PathChoice::from_folders(&folders, backend.instance().narrow_root_folder_names);
    session.available_paths = folders;
    set_state(session, AddState::AwaitingPath);

    let picked = match resolver::resolve(
        ctx.gateway.as_ref(),
        requester.chat_id,
        &mut session.prompt,
        views::SELECT_PATH,
        &choices,
    )
    .await?
    {
        Decision::Advanced(choice) => choice.index,
        Decision::AwaitingInput => return Ok(Outcome::Waiting),
        Decision::NoOptionsAvailable => return Err(WorkflowError::NoOptions("root folders")),
    };
    select_path(ctx, requester, session, picked).await
}

async fn select_path(
    ctx: &WorkflowContext,
    requester: &Requester,
    session: &mut Session,
    index: usize,
) -> Result<Outcome, WorkflowError> {
    let path = session
        .available_paths
        .get(index)
        .map(|f| f.path.clone())
        .ok_or(WorkflowError::Incomplete("root folder"))?;
    session.selected_path = Some(path);
    offer_quality_profiles(ctx, requester, session).await
}

async fn offer_quality_profiles(
    ctx: &WorkflowContext,
    requester: &Requester,
    session: &mut Session,
) -> Result<Outcome, WorkflowError> {
    let backend = selected_backend(ctx, session)?;
    session.available_quality_profiles =
        visible_quality_profiles(backend.instance(), backend.list_quality_profiles().await?);
    set_state(session, AddState::AwaitingQualityProfile);

    let picked = match resolver::resolve(
        ctx.gateway.as_ref(),
        requester.chat_id,
        &mut session.prompt,
        views::SELECT_QUALITY,
        &session.available_quality_profiles,
    )
    .await?
    {
        Decision::Advanced(profile) => profile.id,
        Decision::AwaitingInput => return Ok(Outcome::Waiting),
        Decision::NoOptionsAvailable => return Err(WorkflowError::NoOptions("quality profiles")),
    };
    select_quality(ctx, requester, session, picked).await
}

async fn select_quality(
    ctx: &WorkflowContext,
    requester: &Requester,
    session: &mut Session,
    profile_id: i64,
) -> Result<Outcome, WorkflowError> {
    session.selected_quality_profile = Some(profile_id);
    match media_kind(session)? {
        MediaKind::Movie => commit(ctx, requester, session).await,
        MediaKind::Series => offer_seasons(ctx, requester, session).await,
    }
}

async fn offer_seasons(
    ctx: &WorkflowContext,
    requester: &Requester,
    session: &mut Session,
) -> Result<Outcome, WorkflowError> {
    let backend = selected_backend(ctx, session)?;
    let catalog_id = session
        .current_candidate()
        .map(|c| c.id)
        .ok_or(WorkflowError::Incomplete("selected result"))?;
    session.offer_seasons(backend.list_seasons(catalog_id).await?);

    // Nothing to choose between
    if session.available_seasons.len() <= 1 {
        return commit(ctx, requester, session).await;
    }

    set_state(session, AddState::AwaitingSeasons);
    render_seasons(ctx, requester.chat_id, session).await?;
    Ok(Outcome::Waiting)
}

async fn render_seasons(
    ctx: &WorkflowContext,
    chat_id: i64,
    session: &mut Session,
) -> Result<(), WorkflowError> {
    let keyboard = views::seasons_keyboard(
        &session.available_seasons,
        |s| session.selected_seasons.contains(&s),
        session.all_seasons_selected(),
    );
    resolver::present(
        ctx.gateway.as_ref(),
        chat_id,
        &mut session.prompt,
        views::SELECT_SEASONS,
        &keyboard,
    )
    .await?;
    Ok(())
}

/// Requester tag (when enabled) followed by the default tags.
///
/// A tag that cannot be found or created is left out; the add goes ahead.
async fn resolve_tags(backend: &dyn MediaBackend, chat_id: i64) -> Vec<i64> {
    let instance = backend.instance();
    let mut tags = Vec::new();

    if instance.add_requester_id_tag {
        match backend.find_or_create_tag(&chat_id.to_string()).await {
            Ok(id) => tags.push(id),
            Err(e) => warn!(
                "[{}] Requester tag for {chat_id} unavailable, adding without it: {e}",
                instance.label
            ),
        }
    }

    for label in &instance.default_tags {
        match backend.find_or_create_tag(label).await {
            Ok(id) if !tags.contains(&id) => tags.push(id),
            Ok(_) => {}
            Err(e) => warn!("[{}] Default tag '{label}' unavailable: {e}", instance.label),
        }
    }
    tags
}

async fn commit(
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
    let label = backend.instance().label.clone();

    if backend.in_library(candidate.id).await? {
        info!("[{label}] {} already in library, requested by {chat_id}", candidate.id);
        ctx.finish_prompt(chat_id, session.prompt, &views::already_exists(kind))
            .await?;
        ctx.notify_admin(
            requester,
            &views::admin_add_outcome(requester, kind, &candidate.title, AddOutcome::Exists),
        )
        .await;
        return Ok(Outcome::Done);
    }

    let request = AddRequest {
        catalog_id: candidate.id,
        path: session
            .selected_path
            .clone()
            .ok_or(WorkflowError::Incomplete("root folder"))?,
        quality_profile_id: session
            .selected_quality_profile
            .ok_or(WorkflowError::Incomplete("quality profile"))?,
        tags: resolve_tags(backend.as_ref(), chat_id).await,
        seasons: (kind == MediaKind::Series).then(|| session.season_selections()),
    };

    let (text, outcome) = match backend.add_to_library(&request).await {
        Ok(()) => {
            info!("[{label}] {} '{}' added for chat {chat_id}", kind, candidate.title);
            (views::add_success(kind, &candidate.title), AddOutcome::Added)
        }
        Err(e) => {
            error!("[{label}] Adding {} '{}' failed: {e}", kind, candidate.title);
            (views::add_failed(kind), AddOutcome::Failed)
        }
    };
    ctx.finish_prompt(chat_id, session.prompt, &text).await?;
    ctx.notify_admin(
        requester,
        &views::admin_add_outcome(requester, kind, &candidate.title, outcome),
    )
    .await;
    Ok(Outcome::Done)
}
