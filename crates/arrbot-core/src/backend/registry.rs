use super::{MediaBackend, MediaKind, RadarrClient, SonarrClient};
use crate::config::AppSettings;
use std::sync::Arc;

/// Backends grouped by the kind of media they manage.
///
/// Built once at startup and shared read-only between chats.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    movies: Vec<Arc<dyn MediaBackend>>,
    series: Vec<Arc<dyn MediaBackend>>,
}

impl BackendRegistry {
    /// Registry over already constructed backends.
    #[must_use]
    pub fn new(movies: Vec<Arc<dyn MediaBackend>>, series: Vec<Arc<dyn MediaBackend>>) -> Self {
        Self { movies, series }
    }

    /// One Radarr/Sonarr client per configured instance.
    #[must_use]
    pub fn from_settings(settings: &AppSettings, bot_token: &str) -> Self {
        let timeout = settings.http_timeout();
        let movies = settings
            .radarr
            .instances
            .iter()
            .map(|i| {
                Arc::new(RadarrClient::new(i.clone(), bot_token, timeout)) as Arc<dyn MediaBackend>
            })
            .collect();
        let series = settings
            .sonarr
            .instances
            .iter()
            .map(|i| {
                Arc::new(SonarrClient::new(i.clone(), bot_token, timeout)) as Arc<dyn MediaBackend>
            })
            .collect();
        Self { movies, series }
    }

    /// Backends for a media kind, in configuration order.
    #[must_use]
    pub fn instances(&self, kind: MediaKind) -> &[Arc<dyn MediaBackend>] {
        match kind {
            MediaKind::Movie => &self.movies,
            MediaKind::Series => &self.series,
        }
    }

    /// Backend with the given label.
    #[must_use]
    pub fn get(&self, kind: MediaKind, label: &str) -> Option<Arc<dyn MediaBackend>> {
        self.instances(kind)
            .iter()
            .find(|b| b.instance().label == label)
            .cloned()
    }

    /// Every backend, movies first.
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn MediaBackend>> {
        self.movies.iter().chain(self.series.iter())
    }
}
