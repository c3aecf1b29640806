#![deny(missing_docs)]
//! Arrbot core library.
//!
//! Shared logic for configuration, media backends, the download client and access lists.

/// Access lists (authenticated chats, allow-list, admins).
pub mod access;
/// Media service facades (Radarr, Sonarr).
pub mod backend;
/// Configuration management.
pub mod config;
/// Download client (qBittorrent).
pub mod download;
/// Utility functions.
pub mod utils;

#[cfg(test)]
pub mod testing;
