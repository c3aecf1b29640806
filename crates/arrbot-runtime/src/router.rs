use crate::context::WorkflowContext;
use crate::error::WorkflowError;
use crate::event::{EntryCommand, Event, EventClassifier};
use crate::pagination;
use crate::session::{Session, SessionStore, SpeedState, WorkflowState};
use crate::views;
use crate::workflows::{add, commands, delete, list_all, speed, users, Outcome};
use arrbot_core::access::Requester;
use arrbot_core::backend::MediaKind;
use tracing::{debug, error, info, instrument, warn};

/// Raw input as the transport received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundKind {
    /// A text message.
    Text(String),
    /// A pressed button's token.
    Action(String),
}

/// One inbound chat event.
#[derive(Debug, Clone)]
pub struct Inbound {
    /// Who sent it, and from which chat.
    pub requester: Requester,
    /// What was sent.
    pub kind: InboundKind,
}

/// Routes inbound events to the workflow owning the chat's session.
///
/// Events of one chat are handled strictly one after another: the session lock
/// is held until the event is fully processed. Different chats never wait on
/// each other.
#[derive(Clone)]
pub struct DialogRouter {
    ctx: WorkflowContext,
    sessions: SessionStore,
    classifier: EventClassifier,
}

impl DialogRouter {
    /// Router over `sessions`, classifying with the configured entry points.
    #[must_use]
    pub fn new(ctx: WorkflowContext, sessions: SessionStore) -> Self {
        let classifier = EventClassifier::new(&ctx.settings.entrypoints);
        Self {
            ctx,
            sessions,
            classifier,
        }
    }

    /// The classifier in use.
    #[must_use]
    pub const fn classifier(&self) -> &EventClassifier {
        &self.classifier
    }

    /// The session store in use.
    #[must_use]
    pub const fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handle one inbound event to completion.
    ///
    /// Never fails: workflow errors are reported to the chat and end the
    /// workflow.
    #[instrument(skip_all, fields(chat_id = inbound.requester.chat_id))]
    pub async fn handle(&self, inbound: Inbound) {
        let Inbound { requester, kind } = inbound;
        let chat_id = requester.chat_id;

        match self.ctx.access.is_allowed(&requester).await {
            Ok(true) => {}
            Ok(false) => {
                debug!("Dropping event from {chat_id}: not on the allow-list");
                return;
            }
            Err(e) => {
                error!("Allow-list lookup for {chat_id} failed: {e}");
                return;
            }
        }

        let event = match &kind {
            InboundKind::Text(text) => self.classifier.classify_text(text),
            InboundKind::Action(token) => EventClassifier::classify_action(token),
        };

        let session = self.sessions.get(chat_id).await;
        let mut session = session.lock().await;

        match self.dispatch(&requester, &mut session, &event).await {
            Ok(Outcome::Waiting) => {}
            Ok(Outcome::Done) => {
                pagination::discard_card(self.ctx.gateway.as_ref(), chat_id, &mut session).await;
                session.clear();
            }
            Err(e) => {
                error!("Workflow for {chat_id} failed: {e}");
                let text = match &e {
                    WorkflowError::NoOptions(what) => views::no_options(what),
                    _ => views::FAILURE.to_string(),
                };
                if let Err(e) = self.ctx.finish_prompt(chat_id, session.prompt, &text).await {
                    warn!("Could not report the failure to {chat_id}: {e}");
                }
                pagination::discard_card(self.ctx.gateway.as_ref(), chat_id, &mut session).await;
                session.clear();
            }
        }
    }

    async fn dispatch(
        &self,
        requester: &Requester,
        session: &mut Session,
        event: &Event,
    ) -> Result<Outcome, WorkflowError> {
        if event.is_stop() {
            return self.stop(requester, session).await;
        }

        match event {
            Event::Command { command, args } => self.start(requester, session, *command, args).await,
            _ => match session.workflow {
                Some(state) => self.resume(requester, session, state, event).await,
                None => {
                    debug!("No workflow for {}, ignoring {event:?}", requester.chat_id);
                    Ok(Outcome::Waiting)
                }
            },
        }
    }

    async fn stop(&self, requester: &Requester, session: &mut Session) -> Result<Outcome, WorkflowError> {
        if session.is_active() {
            self.ctx
                .notify_admin(requester, &views::admin_stopped(requester))
                .await;
        }
        self.ctx
            .finish_prompt(requester.chat_id, session.prompt.take(), views::END)
            .await?;
        Ok(Outcome::Done)
    }

    /// Entry commands replace whatever workflow was active.
    async fn start(
        &self,
        requester: &Requester,
        session: &mut Session,
        command: EntryCommand,
        args: &str,
    ) -> Result<Outcome, WorkflowError> {
        let ctx = &self.ctx;
        let chat_id = requester.chat_id;
        info!("Chat {chat_id} started {command:?}");

        if command == EntryCommand::Notify && ctx.access.is_authenticated(chat_id).await? {
            commands::notify(ctx, requester).await?;
            return Ok(Outcome::Waiting);
        }

        match command {
            EntryCommand::Stop => return self.stop(requester, session).await,
            // The active workflow, if any, stays where it was.
            EntryCommand::Help => {
                commands::help(ctx, chat_id).await?;
                return Ok(Outcome::Waiting);
            }
            EntryCommand::Auth => {
                session.clear();
                return commands::auth(ctx, requester, session, args).await;
            }
            _ => session.clear(),
        }

        if command == EntryCommand::Speed
            && (!ctx.settings.qbittorrent.enable || ctx.download.is_none())
        {
            ctx.say(chat_id, views::SPEED_NOT_ENABLED).await?;
            return Ok(Outcome::Done);
        }
        if matches!(command, EntryCommand::Delete | EntryCommand::Users)
            && ctx.access.admin_enabled()
            && !ctx.is_admin(requester).await
        {
            warn!("Chat {chat_id} tried admin-only {command:?}");
            ctx.say(chat_id, views::NOT_ADMIN).await?;
            return Ok(Outcome::Done);
        }

        if !ctx.access.is_authenticated(chat_id).await? {
            let pending = match command {
                EntryCommand::Speed => WorkflowState::SpeedToggle(SpeedState::AwaitingAuthentication),
                _ => WorkflowState::Authenticate,
            };
            return commands::request_password(ctx, chat_id, session, pending).await;
        }

        let title = Some(args.to_string());
        match command {
            EntryCommand::Add => add::start(ctx, requester, session, None, title).await,
            EntryCommand::Movie => add::start(ctx, requester, session, Some(MediaKind::Movie), title).await,
            EntryCommand::Series => add::start(ctx, requester, session, Some(MediaKind::Series), title).await,
            EntryCommand::Delete => delete::start(ctx, requester, session, None, title).await,
            EntryCommand::AllMovies => list_all::start(ctx, requester, session, MediaKind::Movie).await,
            EntryCommand::AllSeries => list_all::start(ctx, requester, session, MediaKind::Series).await,
            EntryCommand::Speed => speed::start(ctx, requester, session).await,
            EntryCommand::Users => users::start(ctx, requester, session).await,
            // Unauthenticated notify asks for the password above; the rest returned early.
            EntryCommand::Notify | EntryCommand::Auth | EntryCommand::Help | EntryCommand::Stop => {
                Ok(Outcome::Done)
            }
        }
    }

    async fn resume(
        &self,
        requester: &Requester,
        session: &mut Session,
        state: WorkflowState,
        event: &Event,
    ) -> Result<Outcome, WorkflowError> {
        let ctx = &self.ctx;
        match state {
            WorkflowState::Authenticate => match event {
                Event::Text(password) => commands::authenticate(ctx, requester, session, password).await,
                _ => commands::request_password(ctx, requester.chat_id, session, state).await,
            },
            WorkflowState::Add(step) => add::handle(ctx, requester, session, step, event).await,
            WorkflowState::Delete(step) => delete::handle(ctx, requester, session, step, event).await,
            WorkflowState::ListAll => list_all::handle(ctx, requester, session, event).await,
            WorkflowState::SpeedToggle(step) => speed::handle(ctx, requester, session, step, event).await,
            WorkflowState::UserAdmin(step) => users::handle(ctx, requester, session, step, event).await,
        }
    }
}
