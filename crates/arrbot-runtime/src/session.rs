//! Per-chat session state.
//!
//! A [`Session`] is a typed record holding everything one conversation has
//! gathered so far. The [`SessionStore`] hands out one lock per chat; holding it
//! for the whole handling of an event keeps each chat strictly sequential while
//! different chats proceed in parallel.

use crate::gateway::MessageHandle;
use arrbot_core::backend::{Candidate, MediaKind, QualityProfile, RootFolder, SeasonSelection};
use moka::future::Cache;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Sessions idle for longer than this are dropped.
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(60 * 60);

const MAX_SESSIONS: u64 = 10_000;

/// Steps of the add workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddState {
    /// Waiting for a title.
    AwaitingTitle,
    /// Waiting for movie/series.
    AwaitingMediaKind,
    /// Waiting for an instance.
    AwaitingInstance,
    /// Showing search results.
    AwaitingResultConfirmation,
    /// Waiting for a root folder.
    AwaitingPath,
    /// Waiting for a quality profile.
    AwaitingQualityProfile,
    /// Toggling seasons (series only).
    AwaitingSeasons,
}

/// Steps of the delete workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteState {
    /// Waiting for a title.
    AwaitingTitle,
    /// Waiting for movie/series.
    AwaitingMediaKind,
    /// Waiting for an instance.
    AwaitingInstance,
    /// Showing the item to delete.
    AwaitingConfirmation,
}

/// Steps of the speed toggle workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedState {
    /// Waiting for the password.
    AwaitingAuthentication,
    /// Waiting for normal/alternate.
    AwaitingModeChoice,
}

/// Steps of the user administration workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAdminState {
    /// Waiting for list/add/revoke.
    AwaitingOperation,
    /// Waiting for a chat id.
    AwaitingUserId,
}

/// User administration operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserOp {
    /// Show authenticated chats.
    List,
    /// Authenticate a chat.
    Add,
    /// Forget a chat.
    Revoke,
}

/// Which controller owns the session, and where it stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    /// Waiting for a password after a bare auth command.
    Authenticate,
    /// Adding media.
    Add(AddState),
    /// Deleting media.
    Delete(DeleteState),
    /// Listing a library, waiting for an instance.
    ListAll,
    /// Switching download speed limits.
    SpeedToggle(SpeedState),
    /// Managing authenticated chats.
    UserAdmin(UserAdminState),
}

/// State of one chat's conversation.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Active workflow and step, `None` when idle.
    pub workflow: Option<WorkflowState>,
    /// Movie or series.
    pub media_kind: Option<MediaKind>,
    /// Search term.
    pub query_title: Option<String>,
    /// Selected instance.
    pub instance_label: Option<String>,
    /// Search results for `query_title`.
    pub candidates: Vec<Candidate>,
    /// Index into `candidates`.
    pub cursor: usize,
    /// Root folders offered on the selected instance.
    pub available_paths: Vec<RootFolder>,
    /// Chosen root folder.
    pub selected_path: Option<String>,
    /// Quality profiles offered on the selected instance.
    pub available_quality_profiles: Vec<QualityProfile>,
    /// Chosen quality profile id.
    pub selected_quality_profile: Option<i64>,
    /// Seasons of the chosen series.
    pub available_seasons: Vec<u32>,
    /// Seasons to monitor.
    pub selected_seasons: BTreeSet<u32>,
    /// Message carrying the current prompt or action buttons.
    pub prompt: Option<MessageHandle>,
    /// Result caption message.
    pub caption: Option<MessageHandle>,
    /// Result poster message.
    pub poster: Option<MessageHandle>,
    /// Pending user administration operation.
    pub user_op: Option<UserOp>,
}

impl Session {
    /// Drop every field. Clearing an idle session is a no-op.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether a workflow owns the session.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.workflow.is_some()
    }

    /// Store new search results and rewind the cursor.
    pub fn set_candidates(&mut self, candidates: Vec<Candidate>) {
        self.candidates = candidates;
        self.cursor = 0;
    }

    /// Result under the cursor.
    #[must_use]
    pub fn current_candidate(&self) -> Option<&Candidate> {
        self.candidates.get(self.cursor)
    }

    /// Offer `seasons`, all of them selected.
    pub fn offer_seasons(&mut self, seasons: Vec<u32>) {
        self.selected_seasons = seasons.iter().copied().collect();
        self.available_seasons = seasons;
    }

    /// Flip one season. Returns `false` for a season that is not offered.
    pub fn toggle_season(&mut self, season: u32) -> bool {
        if !self.available_seasons.contains(&season) {
            return false;
        }
        if !self.selected_seasons.remove(&season) {
            self.selected_seasons.insert(season);
        }
        true
    }

    /// Whether every offered season is selected.
    #[must_use]
    pub fn all_seasons_selected(&self) -> bool {
        self.available_seasons
            .iter()
            .all(|s| self.selected_seasons.contains(s))
    }

    /// Select every offered season.
    pub fn select_all_seasons(&mut self) {
        self.selected_seasons = self.available_seasons.iter().copied().collect();
    }

    /// Deselect every season.
    pub fn deselect_all_seasons(&mut self) {
        self.selected_seasons.clear();
    }

    /// Monitoring flag for every offered season.
    #[must_use]
    pub fn season_selections(&self) -> Vec<SeasonSelection> {
        self.available_seasons
            .iter()
            .map(|&season_number| SeasonSelection {
                season_number,
                monitored: self.selected_seasons.contains(&season_number),
            })
            .collect()
    }
}

/// Sessions keyed by chat id.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<i64, Arc<Mutex<Session>>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_IDLE)
    }
}

impl SessionStore {
    /// Store evicting sessions idle for `idle`.
    #[must_use]
    pub fn new(idle: Duration) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(MAX_SESSIONS)
                .time_to_idle(idle)
                .build(),
        }
    }

    /// Session of a chat, created empty on first use.
    pub async fn get(&self, chat_id: i64) -> Arc<Mutex<Session>> {
        self.sessions
            .get_with(chat_id, async { Arc::new(Mutex::new(Session::default())) })
            .await
    }

    /// Clear a chat's session. Must not be called while holding its lock.
    pub async fn clear(&self, chat_id: i64) {
        if let Some(session) = self.sessions.get(&chat_id).await {
            session.lock().await.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_clear_is_idempotent() {
        let mut session = Session {
            workflow: Some(WorkflowState::Add(AddState::AwaitingPath)),
            query_title: Some("Foo".to_string()),
            cursor: 2,
            ..Session::default()
        };
        session.offer_seasons(vec![1, 2]);

        session.clear();
        assert!(!session.is_active());
        assert!(session.query_title.is_none());
        assert!(session.selected_seasons.is_empty());
        assert_eq!(session.cursor, 0);

        session.clear();
        assert!(!session.is_active());
    }

    #[test]
    fn test_season_selection_flags() {
        let mut session = Session::default();
        session.offer_seasons(vec![0, 1, 2]);
        assert!(session.all_seasons_selected());

        assert!(session.toggle_season(0));
        assert!(!session.toggle_season(9));
        assert!(!session.all_seasons_selected());

        let flags: Vec<(u32, bool)> = session
            .season_selections()
            .iter()
            .map(|s| (s.season_number, s.monitored))
            .collect();
        assert_eq!(flags, vec![(0, false), (1, true), (2, true)]);

        session.select_all_seasons();
        assert!(session.all_seasons_selected());
        session.deselect_all_seasons();
        assert!(session.selected_seasons.is_empty());
    }

    #[tokio::test]
    async fn test_store_isolates_chats() {
        let store = SessionStore::default();
        store.get(1).await.lock().await.query_title = Some("one".to_string());

        assert!(store.get(2).await.lock().await.query_title.is_none());
        assert_eq!(
            store.get(1).await.lock().await.query_title.as_deref(),
            Some("one")
        );

        store.clear(1).await;
        store.clear(3).await;
        assert!(store.get(1).await.lock().await.query_title.is_none());
    }

    proptest! {
        #[test]
        fn prop_toggle_twice_restores_selection(
            seasons in proptest::collection::btree_set(0u32..30, 1..12),
            deselected in proptest::collection::vec(0u32..30, 0..6),
            pick in 0usize..12,
        ) {
            let seasons: Vec<u32> = seasons.into_iter().collect();
            let mut session = Session::default();
            session.offer_seasons(seasons.clone());
            for s in deselected {
                session.toggle_season(s);
            }
            let before = session.selected_seasons.clone();
            let season = seasons[pick % seasons.len()];

            session.toggle_season(season);
            session.toggle_season(season);

            prop_assert_eq!(session.selected_seasons, before);
        }
    }
}
