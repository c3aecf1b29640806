#![allow(dead_code)]

use anyhow::Result;
use arrbot_core::access::{AccessEntry, AccessError, AccessPolicy, AuthOutcome, Requester};
use arrbot_core::backend::{
    AddRequest, BackendError, BackendRegistry, Candidate, LibraryEntry, MediaBackend, MediaKind,
    QualityProfile, RootFolder,
};
use arrbot_core::config::{ApiKeyAuth, AppSettings, InstanceConfig, ServerConfig};
use arrbot_runtime::gateway::{Keyboard, MessageHandle, NotificationGateway};
use arrbot_runtime::session::{Session, WorkflowState};
use arrbot_runtime::{DialogRouter, Inbound, InboundKind, SessionStore, WorkflowContext};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const PASSWORD: &str = "hunter2";
pub const ADMIN_CHAT: i64 = 999;

pub fn instance(label: &str) -> InstanceConfig {
    InstanceConfig {
        label: label.to_string(),
        server: ServerConfig {
            addr: "localhost".to_string(),
            port: 1,
            path: "/".to_string(),
            ssl: false,
        },
        auth: ApiKeyAuth::default(),
        search_on_add: false,
        minimum_availability: "announced".to_string(),
        season_folder: true,
        admin_restrictions: false,
        add_requester_id_tag: false,
        default_tags: Vec::new(),
        excluded_root_folders: Vec::new(),
        excluded_quality_profiles: Vec::new(),
        narrow_root_folder_names: false,
    }
}

pub fn candidate(id: i64, title: &str) -> Candidate {
    Candidate {
        id,
        title: title.to_string(),
        year: 1979,
        overview: String::new(),
        poster: None,
        season_count: None,
        monitored: None,
        status: None,
    }
}

pub fn folder(path: &str) -> RootFolder {
    RootFolder {
        path: path.to_string(),
        free_space: Some(1 << 30),
    }
}

/// In-memory media backend counting its mutations.
pub struct FakeBackend {
    pub kind: MediaKind,
    pub instance: InstanceConfig,
    pub results: Vec<Candidate>,
    pub library: Mutex<HashSet<i64>>,
    pub folders: Vec<RootFolder>,
    pub profiles: Vec<QualityProfile>,
    pub seasons: Vec<u32>,
    pub entries: Vec<LibraryEntry>,
    pub adds: Mutex<Vec<AddRequest>>,
    pub removes: AtomicUsize,
    pub tags: Mutex<Vec<String>>,
    pub profile_exists: bool,
    pub profile_fails: bool,
}

impl FakeBackend {
    pub fn new(kind: MediaKind, label: &str) -> Self {
        Self {
            kind,
            instance: instance(label),
            results: vec![candidate(1, "Alien")],
            library: Mutex::new(HashSet::new()),
            folders: vec![folder("/data/media")],
            profiles: vec![QualityProfile {
                id: 4,
                name: "HD-1080p".to_string(),
            }],
            seasons: Vec::new(),
            entries: Vec::new(),
            adds: Mutex::new(Vec::new()),
            removes: AtomicUsize::new(0),
            tags: Mutex::new(Vec::new()),
            profile_exists: false,
            profile_fails: false,
        }
    }

    pub fn with_library(self, ids: &[i64]) -> Self {
        if let Ok(mut library) = self.library.lock() {
            library.extend(ids);
        }
        self
    }

    pub fn adds(&self) -> Vec<AddRequest> {
        self.adds.lock().map(|a| a.clone()).unwrap_or_default()
    }

    pub fn removes(&self) -> usize {
        self.removes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaBackend for FakeBackend {
    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn instance(&self) -> &InstanceConfig {
        &self.instance
    }

    async fn search(&self, _term: &str) -> Result<Vec<Value>, BackendError> {
        Ok(self.results.iter().map(|c| json!({ "id": c.id })).collect())
    }

    fn normalize(&self, raw: &[Value]) -> Vec<Candidate> {
        raw.iter()
            .filter_map(|v| v.get("id").and_then(Value::as_i64))
            .filter_map(|id| self.results.iter().find(|c| c.id == id).cloned())
            .collect()
    }

    async fn in_library(&self, catalog_id: i64) -> Result<bool, BackendError> {
        Ok(self
            .library
            .lock()
            .map(|l| l.contains(&catalog_id))
            .unwrap_or(false))
    }

    async fn add_to_library(&self, request: &AddRequest) -> Result<(), BackendError> {
        if let Ok(mut adds) = self.adds.lock() {
            adds.push(request.clone());
        }
        if let Ok(mut library) = self.library.lock() {
            library.insert(request.catalog_id);
        }
        Ok(())
    }

    async fn remove_from_library(&self, catalog_id: i64) -> Result<(), BackendError> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        let removed = self
            .library
            .lock()
            .map(|mut l| l.remove(&catalog_id))
            .unwrap_or(false);
        if removed {
            Ok(())
        } else {
            Err(BackendError::NotFound(catalog_id.to_string()))
        }
    }

    async fn list_root_folders(&self) -> Result<Vec<RootFolder>, BackendError> {
        Ok(self.folders.clone())
    }

    async fn list_quality_profiles(&self) -> Result<Vec<QualityProfile>, BackendError> {
        Ok(self.profiles.clone())
    }

    async fn list_seasons(&self, _catalog_id: i64) -> Result<Vec<u32>, BackendError> {
        Ok(self.seasons.clone())
    }

    async fn find_or_create_tag(&self, label: &str) -> Result<i64, BackendError> {
        let mut tags = self
            .tags
            .lock()
            .map_err(|_| BackendError::Api("poisoned".to_string()))?;
        let index = match tags.iter().position(|t| t == label) {
            Some(index) => index,
            None => {
                tags.push(label.to_string());
                tags.len() - 1
            }
        };
        Ok(i64::try_from(index).unwrap_or_default() + 1)
    }

    async fn list_library(&self) -> Result<Vec<LibraryEntry>, BackendError> {
        Ok(self.entries.clone())
    }

    async fn notification_profile_exists(&self, _chat_id: i64) -> Result<bool, BackendError> {
        Ok(self.profile_exists)
    }

    async fn create_notification_profile(
        &self,
        _name: &str,
        _chat_id: i64,
    ) -> Result<(), BackendError> {
        if self.profile_fails {
            return Err(BackendError::Api("notification endpoint down".to_string()));
        }
        Ok(())
    }
}

/// Access lists held in memory.
pub struct MemoryAccess {
    pub users: Mutex<Vec<AccessEntry>>,
    pub admins: Vec<i64>,
    pub enable_admin: bool,
    pub allowed: bool,
}

impl MemoryAccess {
    pub fn with_users(ids: &[i64]) -> Self {
        Self {
            users: Mutex::new(ids.iter().map(|id| AccessEntry::new(id.to_string(), None)).collect()),
            admins: Vec::new(),
            enable_admin: false,
            allowed: true,
        }
    }

    pub fn list_ids(&self) -> Vec<String> {
        self.users
            .lock()
            .map(|u| u.iter().map(|e| e.id.clone()).collect())
            .unwrap_or_default()
    }

    fn contains(&self, chat_id: i64) -> bool {
        let id = chat_id.to_string();
        self.users
            .lock()
            .map(|u| u.iter().any(|e| e.id == id))
            .unwrap_or(false)
    }
}

#[async_trait]
impl AccessPolicy for MemoryAccess {
    async fn is_allowed(&self, _requester: &Requester) -> Result<bool, AccessError> {
        Ok(self.allowed)
    }

    async fn is_authenticated(&self, chat_id: i64) -> Result<bool, AccessError> {
        Ok(self.contains(chat_id))
    }

    async fn is_admin(&self, requester: &Requester) -> Result<bool, AccessError> {
        Ok(self.admins.contains(&requester.user_id))
    }

    fn admin_enabled(&self) -> bool {
        self.enable_admin
    }

    async fn authenticate(
        &self,
        requester: &Requester,
        password: &str,
    ) -> Result<AuthOutcome, AccessError> {
        if self.contains(requester.chat_id) {
            return Ok(AuthOutcome::AlreadyAuthenticated);
        }
        if password.trim() != PASSWORD {
            return Ok(AuthOutcome::WrongPassword);
        }
        self.add_user(&AccessEntry::new(requester.chat_id.to_string(), None))
            .await?;
        Ok(AuthOutcome::Granted)
    }

    async fn list_users(&self) -> Result<Vec<AccessEntry>, AccessError> {
        Ok(self.users.lock().map(|u| u.clone()).unwrap_or_default())
    }

    async fn add_user(&self, entry: &AccessEntry) -> Result<bool, AccessError> {
        let mut users = self.users.lock().map_err(|_| poisoned())?;
        if users.iter().any(|e| e.id == entry.id) {
            return Ok(false);
        }
        users.push(entry.clone());
        Ok(true)
    }

    async fn revoke_user(&self, chat_id: i64) -> Result<bool, AccessError> {
        let mut users = self.users.lock().map_err(|_| poisoned())?;
        let before = users.len();
        let id = chat_id.to_string();
        users.retain(|e| e.id != id);
        Ok(users.len() != before)
    }
}

fn poisoned() -> AccessError {
    AccessError::Io(std::io::Error::other("poisoned"))
}

/// One outbound message as the chat would see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shown {
    pub chat_id: i64,
    pub text: String,
    pub tokens: Vec<String>,
    pub edited: bool,
}

/// Gateway keeping every text it was asked to show.
#[derive(Default)]
pub struct RecordingGateway {
    next_id: AtomicI32,
    shown: Mutex<Vec<Shown>>,
    handles: Mutex<Vec<MessageHandle>>,
    deleted: Mutex<Vec<MessageHandle>>,
}

impl RecordingGateway {
    pub fn shown(&self) -> Vec<Shown> {
        self.shown.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn deleted(&self) -> Vec<MessageHandle> {
        self.deleted.lock().map(|d| d.clone()).unwrap_or_default()
    }

    pub fn texts_to(&self, chat_id: i64) -> Vec<String> {
        self.shown()
            .into_iter()
            .filter(|s| s.chat_id == chat_id)
            .map(|s| s.text)
            .collect()
    }

    pub fn last_text(&self, chat_id: i64) -> Option<String> {
        self.texts_to(chat_id).pop()
    }

    pub fn last_tokens(&self, chat_id: i64) -> Vec<String> {
        self.shown()
            .into_iter()
            .rev()
            .find(|s| s.chat_id == chat_id && !s.tokens.is_empty())
            .map(|s| s.tokens)
            .unwrap_or_default()
    }

    fn record(&self, chat_id: i64, text: &str, keyboard: Option<&Keyboard>, edited: bool) {
        let tokens = keyboard
            .map(|k| k.tokens().map(str::to_string).collect())
            .unwrap_or_default();
        if let Ok(mut shown) = self.shown.lock() {
            shown.push(Shown {
                chat_id,
                text: text.to_string(),
                tokens,
                edited,
            });
        }
    }
}

#[async_trait]
impl NotificationGateway for RecordingGateway {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageHandle> {
        self.record(chat_id, text, keyboard, false);
        let handle = MessageHandle {
            chat_id,
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
        };
        if let Ok(mut handles) = self.handles.lock() {
            handles.push(handle);
        }
        Ok(handle)
    }

    async fn edit_text(
        &self,
        handle: MessageHandle,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<()> {
        self.record(handle.chat_id, text, keyboard, true);
        Ok(())
    }

    async fn send_image(&self, chat_id: i64, _url: &str) -> Result<MessageHandle> {
        Ok(MessageHandle {
            chat_id,
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
        })
    }

    async fn delete_message(&self, handle: MessageHandle) -> Result<()> {
        if let Ok(mut deleted) = self.deleted.lock() {
            deleted.push(handle);
        }
        Ok(())
    }
}

pub fn requester(chat_id: i64) -> Requester {
    Requester {
        chat_id,
        user_id: chat_id,
        username: None,
        display_name: format!("user{chat_id}"),
    }
}

/// A router wired to fakes.
pub struct Harness {
    pub router: DialogRouter,
    pub gateway: Arc<RecordingGateway>,
    pub movies: Arc<FakeBackend>,
    pub series: Arc<FakeBackend>,
    pub access: Arc<MemoryAccess>,
}

impl Harness {
    /// Chat 1 authenticated, no admin chat.
    pub fn new(movies: FakeBackend, series: FakeBackend) -> Self {
        Self::with(movies, series, MemoryAccess::with_users(&[1]), AppSettings::default())
    }

    pub fn with(
        movies: FakeBackend,
        series: FakeBackend,
        access: MemoryAccess,
        settings: AppSettings,
    ) -> Self {
        let gateway = Arc::new(RecordingGateway::default());
        let movies = Arc::new(movies);
        let series = Arc::new(series);
        let access = Arc::new(access);
        let backends = BackendRegistry::new(
            vec![movies.clone() as Arc<dyn MediaBackend>],
            vec![series.clone() as Arc<dyn MediaBackend>],
        );
        let ctx = WorkflowContext {
            gateway: gateway.clone(),
            backends: Arc::new(backends),
            download: None,
            access: access.clone(),
            settings: Arc::new(settings),
        };
        Self {
            router: DialogRouter::new(ctx, SessionStore::default()),
            gateway,
            movies,
            series,
            access,
        }
    }

    pub async fn text(&self, chat_id: i64, text: &str) {
        self.router
            .handle(Inbound {
                requester: requester(chat_id),
                kind: InboundKind::Text(text.to_string()),
            })
            .await;
    }

    pub async fn press(&self, chat_id: i64, token: &str) {
        self.router
            .handle(Inbound {
                requester: requester(chat_id),
                kind: InboundKind::Action(token.to_string()),
            })
            .await;
    }

    pub async fn session(&self, chat_id: i64) -> Session {
        self.router.sessions().get(chat_id).await.lock().await.clone()
    }

    pub async fn state(&self, chat_id: i64) -> Option<WorkflowState> {
        self.session(chat_id).await.workflow
    }
}
