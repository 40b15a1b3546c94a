//! Shared helpers for classifier integration tests

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scanfiler_classify::OpenAiClassifier;
use scanfiler_core::config::default_categories;

/// Starts a mock server and returns a classifier pointing at it
pub async fn setup_classifier() -> (MockServer, OpenAiClassifier) {
    let server = MockServer::start().await;
    let classifier =
        OpenAiClassifier::with_base_url("sk-test", "gpt-4", &default_categories(), server.uri());
    (server, classifier)
}

/// Wraps `content` in a chat completions response body
pub fn chat_response(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

/// Mounts a completions endpoint answering with `content`
pub async fn mount_answer(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response(content)))
        .mount(server)
        .await;
}
