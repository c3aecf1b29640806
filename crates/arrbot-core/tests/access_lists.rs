use arrbot_core::access::{AccessEntry, AccessPolicy, AuthOutcome, FileAccessPolicy, Requester};
use arrbot_core::config::AppSettings;
use std::path::Path;
use tempfile::TempDir;

fn settings_in(dir: &Path) -> AppSettings {
    let mut settings = AppSettings::default();
    settings.auth_password = "hunter2".to_string();
    settings.chat_ids_path = dir.join("chatid.txt").display().to_string();
    settings.allowlist_path = dir.join("allowlist.txt").display().to_string();
    settings.admins_path = dir.join("admin.txt").display().to_string();
    settings
}

fn requester(chat_id: i64, username: Option<&str>) -> Requester {
    Requester {
        chat_id,
        user_id: chat_id,
        username: username.map(str::to_string),
        display_name: format!("user{chat_id}"),
    }
}

#[tokio::test]
async fn authenticate_records_chat_once() {
    let dir = TempDir::new().expect("tempdir");
    let settings = settings_in(dir.path());
    let policy = FileAccessPolicy::from_settings(&settings);
    let alice = requester(42, None);

    assert!(!policy.is_authenticated(42).await.expect("read"));
    assert_eq!(
        policy.authenticate(&alice, "wrong").await.expect("attempt"),
        AuthOutcome::WrongPassword
    );
    assert_eq!(
        policy.authenticate(&alice, " hunter2 ").await.expect("attempt"),
        AuthOutcome::Granted
    );
    assert_eq!(
        policy.authenticate(&alice, "hunter2").await.expect("attempt"),
        AuthOutcome::AlreadyAuthenticated
    );

    let content = std::fs::read_to_string(&settings.chat_ids_path).expect("file");
    assert_eq!(content, "42 - user42\n");
}

#[tokio::test]
async fn empty_password_never_grants() {
    let dir = TempDir::new().expect("tempdir");
    let mut settings = settings_in(dir.path());
    settings.auth_password = String::new();
    let policy = FileAccessPolicy::from_settings(&settings);

    assert_eq!(
        policy.authenticate(&requester(1, None), "").await.expect("attempt"),
        AuthOutcome::WrongPassword
    );
}

#[tokio::test]
async fn revoke_keeps_other_lines_verbatim() {
    let dir = TempDir::new().expect("tempdir");
    let settings = settings_in(dir.path());
    std::fs::write(
        &settings.chat_ids_path,
        "1 - first\n2 - second  \n\n3\n",
    )
    .expect("seed");
    let policy = FileAccessPolicy::from_settings(&settings);

    assert!(policy.revoke_user(2).await.expect("revoke"));
    assert!(!policy.revoke_user(2).await.expect("revoke again"));

    let content = std::fs::read_to_string(&settings.chat_ids_path).expect("file");
    assert_eq!(content, "1 - first\n\n3\n");

    let users = policy.list_users().await.expect("list");
    assert_eq!(
        users,
        vec![
            AccessEntry::new("1", Some("first".to_string())),
            AccessEntry::new("3", None),
        ]
    );
}

#[tokio::test]
async fn add_user_is_idempotent() {
    let dir = TempDir::new().expect("tempdir");
    let settings = settings_in(dir.path());
    let policy = FileAccessPolicy::from_settings(&settings);
    let entry = AccessEntry::new("77", Some("guest".to_string()));

    assert!(policy.add_user(&entry).await.expect("add"));
    assert!(!policy.add_user(&entry).await.expect("add again"));
    assert!(policy.is_authenticated(77).await.expect("read"));
}

#[tokio::test]
async fn allowlist_matches_user_id_or_username() {
    let dir = TempDir::new().expect("tempdir");
    let mut settings = settings_in(dir.path());
    settings.enable_allowlist = true;
    std::fs::write(&settings.allowlist_path, "carol\n500 - dave\n").expect("seed");
    let policy = FileAccessPolicy::from_settings(&settings);

    assert!(policy
        .is_allowed(&requester(9, Some("carol")))
        .await
        .expect("read"));
    assert!(policy.is_allowed(&requester(500, None)).await.expect("read"));
    assert!(!policy
        .is_allowed(&requester(10, Some("mallory")))
        .await
        .expect("read"));
}

#[tokio::test]
async fn disabled_allowlist_admits_everyone() {
    let dir = TempDir::new().expect("tempdir");
    let settings = settings_in(dir.path());
    let policy = FileAccessPolicy::from_settings(&settings);

    assert!(policy.is_allowed(&requester(10, None)).await.expect("read"));
}

#[tokio::test]
async fn admin_file_drives_is_admin() {
    let dir = TempDir::new().expect("tempdir");
    let mut settings = settings_in(dir.path());
    settings.enable_admin = true;
    std::fs::write(&settings.admins_path, "42 - boss\n").expect("seed");
    let policy = FileAccessPolicy::from_settings(&settings);

    assert!(policy.admin_enabled());
    assert!(policy.is_admin(&requester(42, None)).await.expect("read"));
    assert!(!policy.is_admin(&requester(43, None)).await.expect("read"));
}
