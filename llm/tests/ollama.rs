use httpmock::Method::{GET, POST};
use httpmock::MockServer;
use llm::{Backend, BackendError, Generation, OllamaClient};
use serde_json::json;

#[tokio::test]
async fn generate_posts_non_streaming_request() {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/generate")
            .json_body_partial(r#"{"model":"qwen2:0.5b","stream":false,"options":{"num_predict":50}}"#);
        then.status(200)
            .json_body(json!({"model": "qwen2:0.5b", "response": "{\"action\":\"FORWARD\"}", "done": true}));
    });

    let client = OllamaClient::new(server.base_url(), "qwen2:0.5b");
    let text = client.generate(&Generation::terse("Action?")).await.unwrap();
    mock.assert();
    assert_eq!(text, "{\"action\":\"FORWARD\"}");
}

#[tokio::test]
async fn probe_requires_model_to_be_pulled() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/api/tags");
        then.status(200)
            .json_body(json!({"models": [{"name": "gemma:2b"}, {"name": "qwen2:latest"}]}));
    });

    let present = OllamaClient::new(server.base_url(), "qwen2");
    assert_eq!(present.probe().await.unwrap(), "qwen2:latest");

    let missing = OllamaClient::new(server.base_url(), "qwen2:0.5b");
    assert!(matches!(
        missing.probe().await,
        Err(BackendError::InvalidResponse)
    ));
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    let client = OllamaClient::new("http://127.0.0.1:9", "qwen2:0.5b");
    let err = client.generate(&Generation::terse("x")).await.unwrap_err();
    assert!(matches!(err, BackendError::Network(_) | BackendError::Timeout));
}
