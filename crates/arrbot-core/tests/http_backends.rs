//! Radarr, Sonarr and qBittorrent clients against a mock HTTP server.

use arrbot_core::backend::{
    AddRequest, BackendError, MediaBackend, RadarrClient, SeasonSelection, SonarrClient,
};
use arrbot_core::config::{
    ApiKeyAuth, InstanceConfig, QbittorrentAuth, QbittorrentSettings, ServerConfig,
};
use arrbot_core::download::{DownloadClient, QbittorrentClient, SpeedMode};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

fn server_for(mock: &MockServer) -> ServerConfig {
    let address = mock.address();
    ServerConfig {
        addr: address.ip().to_string(),
        port: address.port(),
        path: "/".to_string(),
        ssl: false,
    }
}

fn instance(mock: &MockServer) -> InstanceConfig {
    InstanceConfig {
        label: "Main".to_string(),
        server: server_for(mock),
        auth: ApiKeyAuth {
            apikey: "secret".to_string(),
        },
        search_on_add: false,
        minimum_availability: "released".to_string(),
        season_folder: true,
        admin_restrictions: false,
        add_requester_id_tag: false,
        default_tags: Vec::new(),
        excluded_root_folders: Vec::new(),
        excluded_quality_profiles: Vec::new(),
        narrow_root_folder_names: false,
    }
}

#[tokio::test]
async fn radarr_search_sends_api_key_and_normalizes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/movie/lookup"))
        .and(query_param("term", "alien"))
        .and(header("X-Api-Key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "title": "Alien", "year": 1979, "tmdbId": 348, "overview": "In space." },
            { "title": "Broken" }
        ])))
        .mount(&server)
        .await;

    let radarr = RadarrClient::new(instance(&server), "bot", TIMEOUT);
    let raw = radarr.search("alien").await.expect("search");
    let candidates = radarr.normalize(&raw);

    assert_eq!(raw.len(), 2);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].title, "Alien");
    assert_eq!(candidates[0].year, 1979);
}

#[tokio::test]
async fn radarr_add_posts_lookup_fields_and_policy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/movie/lookup/tmdb"))
        .and(query_param("tmdbId", "348"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tmdbId": 348, "year": 1979, "title": "Alien", "titleSlug": "alien-348",
            "images": [], "ratings": {}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v3/movie"))
        .and(body_partial_json(json!({
            "tmdbId": 348,
            "titleSlug": "alien-348",
            "qualityProfileId": 4,
            "rootFolderPath": "/movies",
            "minimumAvailability": "released",
            "addOptions": { "searchForMovie": false },
            "tags": [1, 2]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 10 })))
        .expect(1)
        .mount(&server)
        .await;

    let radarr = RadarrClient::new(instance(&server), "bot", TIMEOUT);
    let request = AddRequest {
        catalog_id: 348,
        path: "/movies".to_string(),
        quality_profile_id: 4,
        tags: vec![1, 2],
        seasons: None,
    };

    radarr.add_to_library(&request).await.expect("add");
}

#[tokio::test]
async fn radarr_add_reports_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/movie/lookup/tmdb"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tmdbId": 1 })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v3/movie"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!([{ "errorMessage": "exists" }])))
        .mount(&server)
        .await;

    let radarr = RadarrClient::new(instance(&server), "bot", TIMEOUT);
    let request = AddRequest {
        catalog_id: 1,
        path: "/m".to_string(),
        quality_profile_id: 1,
        tags: Vec::new(),
        seasons: None,
    };

    let result = radarr.add_to_library(&request).await;
    assert!(matches!(result, Err(BackendError::Rejected(400))));
}

#[tokio::test]
async fn radarr_remove_resolves_db_id_and_deletes_files() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/movie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 3, "tmdbId": 348, "title": "Alien", "year": 1979, "status": "released", "monitored": true },
            { "id": 9, "tmdbId": 679, "title": "Aliens", "year": 1986, "status": "released", "monitored": true }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v3/movie/9"))
        .and(query_param("deleteFiles", "true"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let radarr = RadarrClient::new(instance(&server), "bot", TIMEOUT);

    assert!(radarr.in_library(679).await.expect("library"));
    assert!(!radarr.in_library(1).await.expect("library"));
    radarr.remove_from_library(679).await.expect("remove");
    assert!(matches!(
        radarr.remove_from_library(1).await,
        Err(BackendError::NotFound(_))
    ));
}

#[tokio::test]
async fn find_or_create_tag_creates_once() {
    let server = MockServer::start().await;
    // First listing has no tag, later listings return the created one
    Mock::given(method("GET"))
        .and(path("/api/v3/tag"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/tag"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 5, "label": "4242" }])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v3/tag"))
        .and(body_partial_json(json!({ "label": "4242" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 5, "label": "4242" })))
        .expect(1)
        .mount(&server)
        .await;

    let sonarr = SonarrClient::new(instance(&server), "bot", TIMEOUT);

    let first = sonarr.find_or_create_tag("4242").await.expect("first");
    let second = sonarr.find_or_create_tag("4242").await.expect("second");
    assert_eq!(first, 5);
    assert_eq!(first, second);
}

#[tokio::test]
async fn sonarr_seasons_and_add_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/series/lookup"))
        .and(query_param("term", "tvdb:81189"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "tvdbId": 81189, "tvRageId": 18164, "title": "Breaking Bad",
            "titleSlug": "breaking-bad", "images": [],
            "seasons": [{ "seasonNumber": 0 }, { "seasonNumber": 1 }, { "seasonNumber": 2 }]
        }])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v3/series"))
        .and(body_partial_json(json!({
            "tvdbId": 81189,
            "seasonFolder": true,
            "monitored": true,
            "monitorNewItems": "all",
            "addOptions": { "ignoreEpisodesWithFiles": true, "ignoreEpisodesWithoutFiles": false },
            "seasons": [
                { "seasonNumber": 0, "monitored": false },
                { "seasonNumber": 1, "monitored": true },
                { "seasonNumber": 2, "monitored": true }
            ]
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let sonarr = SonarrClient::new(instance(&server), "bot", TIMEOUT);

    let seasons = sonarr.list_seasons(81189).await.expect("seasons");
    assert_eq!(seasons, vec![0, 1, 2]);

    let request = AddRequest {
        catalog_id: 81189,
        path: "/tv".to_string(),
        quality_profile_id: 1,
        tags: Vec::new(),
        seasons: Some(
            seasons
                .iter()
                .map(|&n| SeasonSelection {
                    season_number: n,
                    monitored: n != 0,
                })
                .collect(),
        ),
    };
    sonarr.add_to_library(&request).await.expect("add");
}

#[tokio::test]
async fn notification_profile_lookup_matches_chat_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/notification"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "4242 (alice)" }, { "name": "Discord" }
        ])))
        .mount(&server)
        .await;

    let radarr = RadarrClient::new(instance(&server), "bot", TIMEOUT);

    assert!(radarr.notification_profile_exists(4242).await.expect("lookup"));
    assert!(!radarr.notification_profile_exists(7).await.expect("lookup"));
}

#[tokio::test]
async fn server_errors_surface_as_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/rootfolder"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let radarr = RadarrClient::new(instance(&server), "bot", TIMEOUT);

    match radarr.list_root_folders().await {
        Err(BackendError::Api(message)) => assert!(message.contains("HTML")),
        other => panic!("unexpected result: {other:?}"),
    }
}

fn qbittorrent(server: &MockServer) -> QbittorrentClient {
    let settings = QbittorrentSettings {
        enable: true,
        only_admin: false,
        server: server_for(server),
        auth: QbittorrentAuth {
            username: "admin".to_string(),
            password: "adminadmin".to_string(),
        },
    };
    QbittorrentClient::new(&settings, TIMEOUT)
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v2/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "SID=abc123; HttpOnly; path=/")
                .set_body_string("Ok."),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn qbittorrent_toggles_with_session_cookie() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v2/transfer/speedLimitsMode"))
        .and(header_exists("cookie"))
        .respond_with(ResponseTemplate::new(200).set_body_string("0"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/transfer/toggleSpeedLimitsMode"))
        .and(header_exists("cookie"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    qbittorrent(&server)
        .set_speed_mode(SpeedMode::Alternate)
        .await
        .expect("toggle");
}

#[tokio::test]
async fn qbittorrent_skips_toggle_when_mode_matches() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v2/transfer/speedLimitsMode"))
        .respond_with(ResponseTemplate::new(200).set_body_string("1"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/transfer/toggleSpeedLimitsMode"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    qbittorrent(&server)
        .set_speed_mode(SpeedMode::Alternate)
        .await
        .expect("already alternate");
}

#[tokio::test]
async fn qbittorrent_rejected_login_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Fails."))
        .mount(&server)
        .await;

    let result = qbittorrent(&server).set_speed_mode(SpeedMode::Normal).await;
    assert!(matches!(result, Err(BackendError::Api(_))));
}
