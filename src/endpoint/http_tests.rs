use mockito::{Matcher, Server};
use serde_json::json;

use super::http::request_body;
use super::{HttpEndpoint, ModelEndpoint};
use crate::error::FanoutError;
use crate::model::{
    ChatMessage, ChatRequest, EmbeddingRequest, InputType, ModelRequest, RerankRequest, Truncate,
};

const CHAT_MODEL: &str = "meta/llama3-8b-instruct";

fn chat_request() -> ModelRequest {
    ChatRequest::new(
        vec![
            ChatMessage::system()
                .content("You are a helpful assistant.")
                .build(),
            ChatMessage::user()
                .content("What's the weather like today?")
                .build(),
        ],
        62,
    )
    .into()
}

#[tokio::test]
async fn posts_chat_completion_with_bearer_auth() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer nvapi-test")
        .match_body(Matcher::PartialJson(json!({
            "model": CHAT_MODEL,
            "max_tokens": 62,
            "messages": [
                {"role": "system", "content": "You are a helpful assistant."},
                {"role": "user", "content": "What's the weather like today?"}
            ]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "model": CHAT_MODEL,
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "Sunny."}}],
                "usage": {"prompt_tokens": 25, "completion_tokens": 3, "total_tokens": 28}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let endpoint = HttpEndpoint::new(
        format!("{}/v1", server.url()),
        Some("nvapi-test".into()),
        Some(5),
    )
    .unwrap();
    let response = endpoint.call(CHAT_MODEL, &chat_request()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.text(), Some("Sunny."));
    assert_eq!(response.completion_tokens(), Some(3));
}

#[tokio::test]
async fn maps_rate_limit_status() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(429)
        .with_body("too many requests")
        .create_async()
        .await;

    let endpoint = HttpEndpoint::new(server.url(), None, None).unwrap();
    let err = endpoint
        .call(CHAT_MODEL, &chat_request())
        .await
        .unwrap_err();
    assert!(matches!(err, FanoutError::RateLimited(msg) if msg.contains("too many requests")));
}

#[tokio::test]
async fn maps_auth_and_server_errors() {
    let mut server = Server::new_async().await;
    let _unauthorized = server
        .mock("POST", "/embeddings")
        .with_status(401)
        .create_async()
        .await;
    let _unavailable = server
        .mock("POST", "/ranking")
        .with_status(503)
        .create_async()
        .await;

    let endpoint = HttpEndpoint::new(server.url(), None, None).unwrap();
    let embed: ModelRequest = EmbeddingRequest {
        input: vec!["a".into()],
        input_type: InputType::Query,
    }
    .into();
    let rerank: ModelRequest = RerankRequest {
        query: "q".into(),
        passages: vec!["p".into()],
        truncate: Truncate::End,
    }
    .into();

    let err = endpoint.call("embedder", &embed).await.unwrap_err();
    assert!(matches!(err, FanoutError::AuthError(_)));
    let err = endpoint.call("reranker", &rerank).await.unwrap_err();
    assert!(matches!(err, FanoutError::ProviderError(_)));
}

#[tokio::test]
async fn undecodable_body_is_a_format_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body("<html>gateway</html>")
        .create_async()
        .await;

    let endpoint = HttpEndpoint::new(server.url(), None, None).unwrap();
    let err = endpoint
        .call(CHAT_MODEL, &chat_request())
        .await
        .unwrap_err();
    assert!(
        matches!(err, FanoutError::ResponseFormatError { raw_response, .. } if raw_response.contains("gateway"))
    );
}

#[test]
fn guided_json_is_sent_as_nvext() {
    let schema = json!({"type": "object", "required": ["title", "rating"]});
    let request: ModelRequest =
        ChatRequest::new(vec![ChatMessage::user().content("review").build()], 62)
            .temperature(Some(0.2))
            .guided_json(schema.clone())
            .into();
    let body = request_body("meta/llama3-70b-instruct", &request);
    assert_eq!(body["nvext"]["guided_json"], schema);
    assert!((body["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
}

#[test]
fn rerank_body_wraps_texts() {
    let request: ModelRequest = RerankRequest {
        query: "who wrote it".into(),
        passages: vec!["first".into(), "second".into()],
        truncate: Truncate::End,
    }
    .into();
    let body = request_body("nvidia/nv-rerankqa-mistral-4b-v3", &request);
    assert_eq!(
        body,
        json!({
            "model": "nvidia/nv-rerankqa-mistral-4b-v3",
            "query": {"text": "who wrote it"},
            "passages": [{"text": "first"}, {"text": "second"}],
            "truncate": "END"
        })
    );
}
