//! Wire-level tests for the Gemini backend against a mock HTTP server.

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use packmate_assistant::GeminiBackend;
use packmate_core::GenerationBackend;

fn backend_for(server: &MockServer) -> GeminiBackend {
    GeminiBackend::with_config(
        server.uri(),
        "test-key".to_string(),
        "gemini-test".to_string(),
    )
}

#[tokio::test]
async fn generate_extracts_first_candidate_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-test:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [
                {"content": {"parts": [{"text": "{\"reply\": \"Pack light.\", \"actions\": []}"}]}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let text = backend.generate("what should I pack?").await.unwrap();
    assert_eq!(text, "{\"reply\": \"Pack light.\", \"actions\": []}");
}

#[tokio::test]
async fn generate_maps_http_errors_to_inference_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let err = backend.generate("hello").await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("Inference error"), "got: {}", msg);
    assert!(msg.contains("429"), "got: {}", msg);
}

#[tokio::test]
async fn generate_treats_empty_candidates_as_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})),
        )
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    assert!(backend.generate("hello").await.is_err());
}
