//! Shared helpers for storage integration tests

use std::sync::Arc;

use chrono::NaiveDate;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scanfiler_core::domain::{Classification, Destination};
use scanfiler_storage::google::DriveApi;
use scanfiler_storage::{GoogleOAuth, SqliteTokenStore};

/// Destination `Documents/scans/taxes/2024-05-01_steuerbescheid.pdf`
pub fn destination() -> Destination {
    let classification = Classification {
        title: "Steuerbescheid".into(),
        category: "taxes".into(),
        explanation: "Tax assessment".into(),
        file_name: "steuerbescheid.pdf".into(),
    };
    Destination::new(
        "Documents/scans",
        &classification,
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
    )
}

/// OAuth client whose token endpoint is `{server}/token`
pub fn oauth(server: &MockServer) -> Arc<GoogleOAuth> {
    Arc::new(
        GoogleOAuth::new(
            "client-123",
            "shh",
            "https://accounts.google.com/o/oauth2/auth",
            &format!("{}/token", server.uri()),
            "http://localhost:8080/callback",
        )
        .expect("oauth client"),
    )
}

/// Drive client whose API and upload endpoints live on `server`
pub fn drive_api(server: &MockServer) -> DriveApi {
    DriveApi::with_base_urls(
        format!("{}/drive/v3", server.uri()),
        format!("{}/upload/drive/v3", server.uri()),
    )
}

/// Token store holding a refresh token for `bob@example.com`
pub async fn token_store() -> SqliteTokenStore {
    let store = SqliteTokenStore::in_memory().await.expect("token store");
    store
        .save("bob@example.com", "rt-bob", "Bearer")
        .await
        .expect("save token");
    store
}

/// Mounts a refresh-token grant answering with access token `at-bob`
pub async fn mount_refresh(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "at-bob",
            "token_type": "Bearer",
            "expires_in": 3599
        })))
        .mount(server)
        .await;
}
