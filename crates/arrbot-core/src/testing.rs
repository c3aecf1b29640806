//! Testing helpers and mock utilities.

use crate::backend::{MediaKind, MockMediaBackend};
use crate::config::{ApiKeyAuth, InstanceConfig, ServerConfig};

/// Instance config pointing at `localhost:1` with every policy flag off.
#[must_use]
pub fn instance(label: &str) -> InstanceConfig {
    InstanceConfig {
        label: label.to_string(),
        server: ServerConfig {
            addr: "localhost".to_string(),
            port: 1,
            path: "/".to_string(),
            ssl: false,
        },
        auth: ApiKeyAuth {
            apikey: "test-key".to_string(),
        },
        search_on_add: true,
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

/// Mock backend answering only identity queries.
///
/// Every other method panics when called, so tests state the calls they expect.
#[must_use]
pub fn mock_backend(kind: MediaKind, label: &str) -> MockMediaBackend {
    let mut mock = MockMediaBackend::new();
    mock.expect_kind().return_const(kind);
    mock.expect_instance().return_const(instance(label));
    mock
}
