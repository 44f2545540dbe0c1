// ABOUTME: Tests for the Anthropic client against a mock HTTP server
// ABOUTME: Headers, fenced JSON answers, upstream errors and a missing API key

use pretty_assertions::assert_eq;
use reqtrack_ai::{AIConfig, AIService, AIServiceError};
use serde::Deserialize;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, PartialEq)]
struct Answer {
    ideas: Vec<String>,
}

fn service_for(server: &MockServer) -> AIService {
    AIService::new(AIConfig {
        api_key: Some("test-key".to_string()),
        model: "test-model".to_string(),
        base_url: server.uri(),
    })
}

fn message(text: &str) -> serde_json::Value {
    json!({
        "id": "msg_1",
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": text}],
        "usage": {"input_tokens": 12, "output_tokens": 30}
    })
}

#[tokio::test]
async fn test_generate_structured_parses_fenced_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(message("```json\n{\"ideas\": [\"SSO\", \"MFA\"]}\n```")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = service_for(&server)
        .generate_structured::<Answer>("prompt".to_string(), Some("system".to_string()))
        .await
        .unwrap();

    assert_eq!(
        response.data,
        Answer {
            ideas: vec!["SSO".to_string(), "MFA".to_string()]
        }
    );
    assert_eq!(response.usage.total_tokens(), 42);
}

#[tokio::test]
async fn test_upstream_error_keeps_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let result = service_for(&server)
        .generate_structured::<Answer>("prompt".to_string(), None)
        .await;

    match result {
        Err(AIServiceError::ApiError { status, message }) => {
            assert_eq!(status, 529);
            assert_eq!(message, "overloaded");
        }
        other => panic!("expected api error, got {:?}", other.map(|r| r.data)),
    }
}

#[tokio::test]
async fn test_non_json_answer_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(message("Sorry, I can't help.")))
        .mount(&server)
        .await;

    let result = service_for(&server)
        .generate_structured::<Answer>("prompt".to_string(), None)
        .await;
    assert!(matches!(result, Err(AIServiceError::ParseError(_))));
}

#[tokio::test]
async fn test_empty_content_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [],
            "usage": {"input_tokens": 1, "output_tokens": 0}
        })))
        .mount(&server)
        .await;

    let result = service_for(&server)
        .generate_structured::<Answer>("prompt".to_string(), None)
        .await;
    assert!(matches!(result, Err(AIServiceError::InvalidResponse)));
}

#[tokio::test]
async fn test_missing_api_key_skips_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let service = AIService::new(AIConfig {
        api_key: None,
        base_url: server.uri(),
        ..Default::default()
    });
    let result = service
        .generate_structured::<Answer>("prompt".to_string(), None)
        .await;
    assert!(matches!(result, Err(AIServiceError::NoApiKey)));
}
