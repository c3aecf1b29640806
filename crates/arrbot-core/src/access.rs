//! Access lists
//!
//! Authenticated chats, the allow-list and the admin list are plain text files
//! with one `<id> - <displayName>` (or bare `<id>`) entry per line. They are
//! shared with whatever manages them outside the bot, so lines this module does
//! not touch are written back byte for byte.

use crate::config::AppSettings;
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};

const SEPARATOR: &str = " - ";

/// Errors that can occur while reading or writing access lists
#[derive(Error, Debug)]
pub enum AccessError {
    /// Standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Who sent an event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Requester {
    /// Chat the event came from.
    pub chat_id: i64,
    /// Sending user.
    pub user_id: i64,
    /// Sending user's `@username`, if set.
    pub username: Option<String>,
    /// Best available display name.
    pub display_name: String,
}

impl Requester {
    /// Identifiers an access-list line may carry for this requester.
    #[must_use]
    pub fn identifiers(&self) -> Vec<String> {
        let mut ids = vec![self.user_id.to_string()];
        if let Some(username) = &self.username {
            ids.push(username.clone());
        }
        ids
    }
}

/// One access-list line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessEntry {
    /// Chat id, user id or username.
    pub id: String,
    /// Name shown next to the id.
    pub display_name: Option<String>,
}

impl AccessEntry {
    /// Entry for a chat, with an optional display name.
    #[must_use]
    pub fn new(id: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.filter(|n| !n.trim().is_empty()),
        }
    }

    /// Parse a line; blank lines yield `None`.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return None;
        }
        match line.split_once(SEPARATOR) {
            Some((id, name)) => Some(Self::new(id.trim(), Some(name.to_string()))),
            None => Some(Self::new(line.trim(), None)),
        }
    }

    /// The line written to disk, without the newline.
    #[must_use]
    pub fn to_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AccessEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            Some(name) => write!(f, "{}{SEPARATOR}{name}", self.id),
            None => f.write_str(&self.id),
        }
    }
}

/// A line-oriented access-list file. A missing file is an empty list.
pub struct AccessFile {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl AccessFile {
    /// List stored at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Location on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_lines(&self) -> Result<Vec<String>, AccessError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Parsed entries in file order.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::Io` if the file exists but cannot be read.
    pub async fn entries(&self) -> Result<Vec<AccessEntry>, AccessError> {
        Ok(self
            .read_lines()
            .await?
            .iter()
            .filter_map(|l| AccessEntry::parse(l))
            .collect())
    }

    /// Whether any line's id equals one of `ids`.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::Io` if the file exists but cannot be read.
    pub async fn contains_any(&self, ids: &[String]) -> Result<bool, AccessError> {
        Ok(self
            .entries()
            .await?
            .iter()
            .any(|e| ids.iter().any(|id| *id == e.id)))
    }

    /// Append an entry as a new line.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::Io` if the file cannot be opened for appending.
    pub async fn append(&self, entry: &AccessEntry) -> Result<(), AccessError> {
        let _guard = self.write_lock.lock().await;
        // Files edited by hand may lack the final newline
        let needs_break = match tokio::fs::read(&self.path).await {
            Ok(content) => content.last().is_some_and(|&b| b != b'\n'),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        let mut line = String::new();
        if needs_break {
            line.push('\n');
        }
        line.push_str(&entry.to_line());
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Drop every line whose id equals `id`. Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::Io` if the file cannot be read or rewritten.
    pub async fn remove(&self, id: &str) -> Result<bool, AccessError> {
        let _guard = self.write_lock.lock().await;
        let lines = self.read_lines().await?;
        let kept: Vec<&String> = lines
            .iter()
            .filter(|l| AccessEntry::parse(l).map_or(true, |e| e.id != id))
            .collect();
        if kept.len() == lines.len() {
            return Ok(false);
        }

        let mut content = kept
            .iter()
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        tokio::fs::write(&self.path, content).await?;
        Ok(true)
    }
}

/// Outcome of a password attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Chat was already authenticated.
    AlreadyAuthenticated,
    /// Password matched, chat recorded.
    Granted,
    /// Password did not match.
    WrongPassword,
}

/// Who may do what.
#[async_trait]
pub trait AccessPolicy: Send + Sync {
    /// `false` only when the allow-list is enabled and the requester is not on it.
    async fn is_allowed(&self, requester: &Requester) -> Result<bool, AccessError>;
    /// Whether the chat has authenticated.
    async fn is_authenticated(&self, chat_id: i64) -> Result<bool, AccessError>;
    /// Whether the requester is listed as admin.
    async fn is_admin(&self, requester: &Requester) -> Result<bool, AccessError>;
    /// Whether admin-only actions are restricted at all.
    fn admin_enabled(&self) -> bool;
    /// Check a password and record the chat on success.
    async fn authenticate(
        &self,
        requester: &Requester,
        password: &str,
    ) -> Result<AuthOutcome, AccessError>;
    /// Authenticated chats.
    async fn list_users(&self) -> Result<Vec<AccessEntry>, AccessError>;
    /// Record a chat as authenticated. Returns `false` if it already was.
    async fn add_user(&self, entry: &AccessEntry) -> Result<bool, AccessError>;
    /// Forget an authenticated chat. Returns `false` if it was unknown.
    async fn revoke_user(&self, chat_id: i64) -> Result<bool, AccessError>;
}

/// [`AccessPolicy`] backed by the three list files.
pub struct FileAccessPolicy {
    chat_ids: AccessFile,
    allowlist: AccessFile,
    admins: AccessFile,
    enable_allowlist: bool,
    enable_admin: bool,
    password: String,
}

impl FileAccessPolicy {
    /// Policy using the file locations and flags from settings.
    #[must_use]
    pub fn from_settings(settings: &AppSettings) -> Self {
        Self {
            chat_ids: AccessFile::new(&settings.chat_ids_path),
            allowlist: AccessFile::new(&settings.allowlist_path),
            admins: AccessFile::new(&settings.admins_path),
            enable_allowlist: settings.enable_allowlist,
            enable_admin: settings.enable_admin,
            password: settings.auth_password.clone(),
        }
    }
}

#[async_trait]
impl AccessPolicy for FileAccessPolicy {
    async fn is_allowed(&self, requester: &Requester) -> Result<bool, AccessError> {
        if !self.enable_allowlist {
            return Ok(true);
        }
        self.allowlist.contains_any(&requester.identifiers()).await
    }

    async fn is_authenticated(&self, chat_id: i64) -> Result<bool, AccessError> {
        self.chat_ids.contains_any(&[chat_id.to_string()]).await
    }

    async fn is_admin(&self, requester: &Requester) -> Result<bool, AccessError> {
        self.admins.contains_any(&requester.identifiers()).await
    }

    fn admin_enabled(&self) -> bool {
        self.enable_admin
    }

    async fn authenticate(
        &self,
        requester: &Requester,
        password: &str,
    ) -> Result<AuthOutcome, AccessError> {
        if self.is_authenticated(requester.chat_id).await? {
            return Ok(AuthOutcome::AlreadyAuthenticated);
        }
        if self.password.is_empty() || password.trim() != self.password {
            warn!(
                "Failed authentication attempt by {} ({})",
                requester.chat_id, requester.display_name
            );
            return Ok(AuthOutcome::WrongPassword);
        }

        let entry = AccessEntry::new(
            requester.chat_id.to_string(),
            Some(requester.display_name.clone()),
        );
        self.chat_ids.append(&entry).await?;
        info!("Chat {} authenticated", requester.chat_id);
        Ok(AuthOutcome::Granted)
    }

    async fn list_users(&self) -> Result<Vec<AccessEntry>, AccessError> {
        self.chat_ids.entries().await
    }

    async fn add_user(&self, entry: &AccessEntry) -> Result<bool, AccessError> {
        if self.chat_ids.contains_any(&[entry.id.clone()]).await? {
            return Ok(false);
        }
        self.chat_ids.append(entry).await?;
        Ok(true)
    }

    async fn revoke_user(&self, chat_id: i64) -> Result<bool, AccessError> {
        self.chat_ids.remove(&chat_id.to_string()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_parse_and_format() {
        let named = AccessEntry::parse("123 - alice\n");
        assert_eq!(
            named,
            Some(AccessEntry::new("123", Some("alice".to_string())))
        );
        assert_eq!(named.map(|e| e.to_line()).as_deref(), Some("123 - alice"));

        let bare = AccessEntry::parse("456");
        assert_eq!(bare.as_ref().map(|e| e.display_name.clone()), Some(None));
        assert_eq!(bare.map(|e| e.to_line()).as_deref(), Some("456"));

        assert_eq!(AccessEntry::parse("   "), None);
    }

    #[tokio::test]
    async fn test_append_after_unterminated_last_line() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("chatid.txt");
        tokio::fs::write(&path, "1 - alice").await.expect("seed file");
        let file = AccessFile::new(&path);

        file.append(&AccessEntry::new("2", Some("bob".to_string())))
            .await
            .expect("append");

        let content = tokio::fs::read_to_string(&path).await.expect("read back");
        assert_eq!(content, "1 - alice\n2 - bob\n");
        let ids: Vec<String> = file
            .entries()
            .await
            .expect("entries")
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_display_name_keeps_separator() {
        let entry = AccessEntry::parse("7 - Jean - Luc");
        assert_eq!(
            entry.as_ref().and_then(|e| e.display_name.as_deref()),
            Some("Jean - Luc")
        );
        assert_eq!(entry.map(|e| e.to_line()).as_deref(), Some("7 - Jean - Luc"));
    }

    #[test]
    fn test_requester_identifiers() {
        let requester = Requester {
            chat_id: 1,
            user_id: 2,
            username: Some("bob".to_string()),
            display_name: "Bob".to_string(),
        };
        assert_eq!(requester.identifiers(), vec!["2".to_string(), "bob".to_string()]);
    }
}
