//! Shared harness for the integration suites: a wiremock server standing
//! in for the CMS API, with the full session stack wired against it.

#![allow(dead_code)]

use std::sync::Arc;

use url::Url;
use wiremock::MockServer;

use authgate::{
    config::Config,
    navigator::{Navigator, RecordingNavigator},
    protocol::profile::User,
    session::SessionController,
    storage::{ClientStorage, MemoryStorage},
};

pub struct Harness {
    pub server: MockServer,
    pub controller: SessionController,
    pub storage: Arc<MemoryStorage>,
    pub navigator: Arc<RecordingNavigator>,
}

pub async fn harness() -> Harness {
    harness_with(RecordingNavigator::new()).await
}

pub async fn harness_with(navigator: RecordingNavigator) -> Harness {
    let _ = env_logger::builder().is_test(true).try_init();

    let server = MockServer::start().await;
    let config = Config::new(Url::parse(&server.uri()).expect("mock server uri"));

    let storage = Arc::new(MemoryStorage::new());
    let navigator = Arc::new(navigator);
    let controller = SessionController::new(
        config,
        Arc::clone(&storage) as Arc<dyn ClientStorage>,
        Arc::clone(&navigator) as Arc<dyn Navigator>,
    )
    .expect("session controller");

    Harness {
        server,
        controller,
        storage,
        navigator,
    }
}

/// A well-formed profile envelope for the default admin user.
pub fn profile_body(email: &str) -> serde_json::Value {
    serde_json::json!({
        "status": true,
        "data": {
            "id": "42",
            "email": email,
            "role": "ADMIN",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "profile": { "picture": "https://cdn.example.com/ada.png" }
        }
    })
}

pub fn admin_user() -> User {
    serde_json::from_value(profile_body("admin@example.com")["data"].clone()).expect("user")
}
