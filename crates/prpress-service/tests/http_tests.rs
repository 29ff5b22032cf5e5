use std::time::Duration;

use prpress_service::{
    AnthropicService, GeminiService, ServiceConfig, ServiceError, ServiceKind, ServicePrompt,
    TextService,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn anthropic_config(server: &MockServer) -> ServiceConfig {
    ServiceConfig::new(ServiceKind::Anthropic, "test_anthropic_key".into())
        .with_api_url(format!("{}/v1/messages", server.uri()))
        .with_model("claude-test".into())
}

fn gemini_config(server: &MockServer) -> ServiceConfig {
    ServiceConfig::new(ServiceKind::Gemini, "test_gemini_key".into())
        .with_api_url(format!("{}/v1beta", server.uri()))
        .with_model("gemini-test".into())
}

fn prompt() -> ServicePrompt {
    ServicePrompt::new("You write articles.", "Describe this change.")
}

// ============================================================
// Anthropic
// ============================================================

#[tokio::test]
async fn test_anthropic_sends_messages_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test_anthropic_key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-test",
            "max_tokens": 4096,
            "system": "You write articles.",
            "messages": [{"role": "user", "content": "Describe this change."}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "content": [{"type": "text", "text": "SKIP"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = AnthropicService::new(anthropic_config(&server)).unwrap();
    let reply = service.complete(&prompt()).await.unwrap();

    assert_eq!(reply.text, "SKIP");
    assert_eq!(service.model(), "claude-test");
}

#[tokio::test]
async fn test_anthropic_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid x-api-key"))
        .mount(&server)
        .await;

    let service = AnthropicService::new(anthropic_config(&server)).unwrap();
    let err = service.complete(&prompt()).await.unwrap_err();

    match err {
        ServiceError::Unauthorized { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid x-api-key");
        }
        other => panic!("expected Unauthorized, got {:?}", other),
    }
}

#[tokio::test]
async fn test_anthropic_server_error_is_not_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let service = AnthropicService::new(anthropic_config(&server)).unwrap();
    let err = service.complete(&prompt()).await.unwrap_err();

    assert!(matches!(err, ServiceError::Status { status: 503, .. }));
    assert!(!err.is_malformed());
}

#[tokio::test]
async fn test_anthropic_non_json_envelope_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let service = AnthropicService::new(anthropic_config(&server)).unwrap();
    let err = service.complete(&prompt()).await.unwrap_err();

    assert!(err.is_malformed());
}

#[tokio::test]
async fn test_call_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"content": [{"type": "text", "text": "late"}]}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let config = anthropic_config(&server).with_timeout(Duration::from_millis(200));
    let service = AnthropicService::new(config).unwrap();
    let err = service.complete(&prompt()).await.unwrap_err();

    assert!(matches!(err, ServiceError::Timeout(d) if d == Duration::from_millis(200)));
}

// ============================================================
// Gemini
// ============================================================

#[tokio::test]
async fn test_gemini_sends_generate_content_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-test:generateContent"))
        .and(header("x-goog-api-key", "test_gemini_key"))
        .and(body_partial_json(json!({
            "systemInstruction": {"parts": [{"text": "You write articles."}]},
            "contents": [{"role": "user", "parts": [{"text": "Describe this change."}]}],
            "generationConfig": {"responseMimeType": "application/json"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"parts": [{"text": "{\"approved\": true, "}, {"text": "\"issues\": []}"}]}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = GeminiService::new(gemini_config(&server)).unwrap();
    let reply = service.complete(&prompt()).await.unwrap();

    assert_eq!(reply.text, "{\"approved\": true, \"issues\": []}");
}

#[tokio::test]
async fn test_gemini_forbidden_is_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
        .mount(&server)
        .await;

    let service = GeminiService::new(gemini_config(&server)).unwrap();
    let err = service.complete(&prompt()).await.unwrap_err();

    assert!(matches!(err, ServiceError::Unauthorized { status: 403, .. }));
}

#[tokio::test]
async fn test_gemini_without_candidates_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        })))
        .mount(&server)
        .await;

    let service = GeminiService::new(gemini_config(&server)).unwrap();
    let err = service.complete(&prompt()).await.unwrap_err();

    assert!(err.is_malformed());
}

#[tokio::test]
async fn test_concurrent_calls_share_one_adapter() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"content": [{"type": "text", "text": "ok"}]}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(4)
        .mount(&server)
        .await;

    let config = anthropic_config(&server).with_max_concurrent_requests(2);
    let service = AnthropicService::new(config).unwrap();
    let clone = service.clone();

    let prompt = prompt();
    let started = std::time::Instant::now();
    let calls = (0..4).map(|i| {
        let service = if i % 2 == 0 { &service } else { &clone };
        service.complete(&prompt)
    });
    let replies = futures::future::join_all(calls).await;
    let elapsed = started.elapsed();

    assert!(replies.iter().all(|r| r.as_ref().map(|r| r.text == "ok").unwrap_or(false)));
    // Two permits across clones means four delayed calls run in two waves
    assert!(elapsed >= Duration::from_millis(400), "took {:?}", elapsed);
}
