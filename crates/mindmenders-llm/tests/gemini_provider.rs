use mindmenders_core::HistoryTurn;
use mindmenders_llm::{CompletionClient, GeminiProvider, LLMError, ProviderConfig};
use mockito::Matcher;
use serde_json::json;
use tokio_test::assert_ok;

fn provider_for(server: &mockito::ServerGuard) -> GeminiProvider {
    let config = ProviderConfig::new("gemini", server.url())
        .with_api_key("test-key")
        .with_model("gemini-test");
    GeminiProvider::with_config(config).unwrap()
}

#[tokio::test]
async fn test_complete_sends_history_and_returns_text() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1beta/models/gemini-test:generateContent")
        .match_header("x-goog-api-key", "test-key")
        .match_body(Matcher::PartialJson(json!({
            "contents": [
                { "role": "user", "parts": [{ "text": "hello" }] },
                { "role": "model", "parts": [{ "text": "hi there" }] },
                { "role": "user", "parts": [{ "text": "I feel anxious" }] }
            ],
            "generationConfig": { "temperature": 0.7, "topP": 0.95 }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "I'm here with you." }] },
                    "finishReason": "STOP"
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let provider = provider_for(&server);
    let history = vec![HistoryTurn::user("hello"), HistoryTurn::ai("hi there")];
    let reply = assert_ok!(provider.complete(&history, "I feel anxious").await);

    assert_eq!(reply, "I'm here with you.");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_empty_reply_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1beta/models/gemini-test:generateContent")
        .with_status(200)
        .with_body(r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"  "}]}}]}"#)
        .create_async()
        .await;

    let result = provider_for(&server).complete(&[], "hi").await;
    assert!(matches!(result, Err(LLMError::EmptyResponse)));
}

#[tokio::test]
async fn test_status_codes_map_to_errors() {
    let mut server = mockito::Server::new_async().await;
    let provider = provider_for(&server);

    let _auth = server
        .mock("POST", "/v1beta/models/gemini-test:generateContent")
        .with_status(403)
        .with_body(r#"{"error":{"code":403,"message":"API key not valid","status":"PERMISSION_DENIED"}}"#)
        .expect(1)
        .create_async()
        .await;
    let result = provider.complete(&[], "hi").await;
    assert!(matches!(result, Err(LLMError::Auth(msg)) if msg == "API key not valid"));

    server.reset_async().await;
    let _limited = server
        .mock("POST", "/v1beta/models/gemini-test:generateContent")
        .with_status(429)
        .with_header("retry-after", "7")
        .create_async()
        .await;
    let result = provider.complete(&[], "hi").await;
    assert!(matches!(result, Err(LLMError::RateLimited { retry_after: 7 })));

    server.reset_async().await;
    let _broken = server
        .mock("POST", "/v1beta/models/gemini-test:generateContent")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;
    let result = provider.complete(&[], "hi").await;
    assert!(matches!(result, Err(LLMError::Api { status: 500, .. })));
}

#[tokio::test]
async fn test_validate_requires_key() {
    let provider = GeminiProvider::with_config(ProviderConfig::default()).unwrap();
    assert!(matches!(provider.validate().await, Err(LLMError::Auth(_))));

    let provider = GeminiProvider::new("key").unwrap();
    assert!(provider.validate().await.is_ok());
    assert_eq!(provider.model(), "gemini-3-pro-preview");
}

#[test]
fn test_provider_id_comes_from_config() {
    let provider = GeminiProvider::new("key").unwrap();
    assert_eq!(provider.provider_id(), "gemini");

    let provider =
        GeminiProvider::with_config(ProviderConfig::new("gemini-proxy", "http://localhost:9"))
            .unwrap();
    assert_eq!(provider.provider_id(), "gemini-proxy");
}
