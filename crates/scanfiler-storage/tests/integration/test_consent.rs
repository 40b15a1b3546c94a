//! Integration tests for the Google consent server

use std::net::SocketAddr;

use hyper::{Method, StatusCode};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scanfiler_storage::{ConsentServer, SqliteTokenStore};

use crate::common;

fn peer() -> SocketAddr {
    "127.0.0.1:50000".parse().unwrap()
}

async fn mount_code_exchange(server: &MockServer, refresh_token: Option<&str>) {
    let mut body = serde_json::json!({
        "access_token": "at-new",
        "token_type": "Bearer",
        "expires_in": 3599
    });
    if let Some(rt) = refresh_token {
        body["refresh_token"] = serde_json::Value::from(rt);
    }
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=code-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_about(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/drive/v3/about"))
        .and(query_param("fields", "user"))
        .and(header("authorization", "Bearer at-new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "user": {"displayName": "Bob", "emailAddress": "bob@example.com"}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_auth_redirects_to_consent_screen() {
    let server = MockServer::start().await;
    let consent = ConsentServer::with_api(
        common::oauth(&server),
        SqliteTokenStore::in_memory().await.unwrap(),
        common::drive_api(&server),
    );

    let response = consent
        .handle(&Method::GET, &"/auth".parse().unwrap(), peer())
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response.headers()["location"].to_str().unwrap();
    assert!(location.starts_with("https://accounts.google.com/o/oauth2/auth?"));
    assert!(location.contains("access_type=offline"));
}

#[tokio::test]
async fn test_callback_stores_refresh_token() {
    let server = MockServer::start().await;
    mount_code_exchange(&server, Some("rt-new")).await;
    mount_about(&server).await;

    let store = SqliteTokenStore::in_memory().await.unwrap();
    let consent = ConsentServer::with_api(
        common::oauth(&server),
        store.clone(),
        common::drive_api(&server),
    );

    let response = consent
        .handle(&Method::GET, &"/callback?code=code-1&state=s".parse().unwrap(), peer())
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let token = store.get("bob@example.com").await.unwrap().unwrap();
    assert_eq!(token.refresh_token, "rt-new");
}

#[tokio::test]
async fn test_callback_without_refresh_token_fails() {
    let server = MockServer::start().await;
    mount_code_exchange(&server, None).await;
    mount_about(&server).await;

    let store = SqliteTokenStore::in_memory().await.unwrap();
    let consent =
        ConsentServer::with_api(common::oauth(&server), store.clone(), common::drive_api(&server));

    let response = consent
        .handle(&Method::GET, &"/callback?code=code-1".parse().unwrap(), peer())
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(store.get("bob@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_callback_without_code_is_bad_request() {
    let server = MockServer::start().await;
    let consent = ConsentServer::with_api(
        common::oauth(&server),
        SqliteTokenStore::in_memory().await.unwrap(),
        common::drive_api(&server),
    );

    let response = consent
        .handle(&Method::GET, &"/callback?error=access_denied".parse().unwrap(), peer())
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = consent
        .handle(&Method::GET, &"/other".parse().unwrap(), peer())
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_serve_answers_over_http_until_shutdown() {
    let server = MockServer::start().await;
    let consent = ConsentServer::with_api(
        common::oauth(&server),
        SqliteTokenStore::in_memory().await.unwrap(),
        common::drive_api(&server),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = tokio_util::sync::CancellationToken::new();
    let handle = tokio::spawn(consent.serve(listener, shutdown.clone()));

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();
    let response = client
        .get(format!("http://{addr}/auth"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 302);

    shutdown.cancel();
    handle.await.unwrap();
}
