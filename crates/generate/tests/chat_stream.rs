//! Integration tests for the streaming chat-completions client against a mock
//! upstream.

use futures::StreamExt;
use generate::{ChatCompletionsClient, ChatMessage, GenerateConfig, GenerateError, Generator};
use httpmock::prelude::*;
use serde_json::json;

fn client_for(server: &MockServer) -> ChatCompletionsClient {
    ChatCompletionsClient::new(GenerateConfig {
        api_base: server.url("/v1"),
        api_key: "test-key".into(),
        request_timeout_secs: 5,
        idle_timeout_secs: 5,
        ..Default::default()
    })
    .expect("valid config")
}

fn sse_body(fragments: &[&str], done: bool) -> String {
    let mut body = String::new();
    body.push_str(&format!(
        "data: {}\n\n",
        json!({"choices": [{"index": 0, "delta": {"role": "assistant"}, "finish_reason": null}]})
    ));
    for fragment in fragments {
        body.push_str(&format!(
            "data: {}\n\n",
            json!({"choices": [{"index": 0, "delta": {"content": fragment}, "finish_reason": null}]})
        ));
    }
    if done {
        body.push_str(&format!(
            "data: {}\n\ndata: [DONE]\n\n",
            json!({"choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}]})
        ));
    }
    body
}

#[tokio::test]
async fn streams_fragments_in_arrival_order() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer test-key")
                .json_body_partial(r#"{"model": "gpt-4o-mini", "stream": true}"#);
            then.status(200)
                .header("content-type", "text/event-stream")
                .body(sse_body(&["Based", " on", " your query"], true));
        })
        .await;

    let messages = vec![
        ChatMessage::system("be helpful"),
        ChatMessage::user("Who teaches physics?"),
    ];
    let stream = client_for(&server).stream(&messages).await.expect("stream opens");
    let chunks: Vec<_> = stream.collect().await;

    mock.assert_async().await;
    let text: String = chunks
        .into_iter()
        .map(|c| c.expect("no stream error").text)
        .collect();
    assert_eq!(text, "Based on your query");
}

#[tokio::test]
async fn request_carries_full_message_list() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .json_body(json!({
                    "model": "gpt-4o-mini",
                    "stream": true,
                    "messages": [
                        {"role": "system", "content": "sys"},
                        {"role": "user", "content": "first"},
                        {"role": "assistant", "content": "reply"},
                        {"role": "user", "content": "second"}
                    ]
                }));
            then.status(200).body(sse_body(&[], true));
        })
        .await;

    let messages = vec![
        ChatMessage::system("sys"),
        ChatMessage::user("first"),
        ChatMessage::assistant("reply"),
        ChatMessage::user("second"),
    ];
    let chunks: Vec<_> = client_for(&server)
        .stream(&messages)
        .await
        .expect("stream opens")
        .collect()
        .await;

    mock.assert_async().await;
    assert!(chunks.iter().all(|c| c.as_ref().is_ok_and(|c| c.text.is_empty())));
}

#[tokio::test]
async fn unauthorized_fails_before_streaming() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(401).body(r#"{"error":{"message":"bad key"}}"#);
        })
        .await;

    let err = client_for(&server)
        .stream(&[ChatMessage::user("hi")])
        .await
        .err()
        .expect("request rejected");
    assert!(matches!(err, GenerateError::Unauthorized { status: 401 }));
}

#[tokio::test]
async fn rate_limited_surfaces_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(429).body("slow down");
        })
        .await;

    match client_for(&server).stream(&[ChatMessage::user("hi")]).await {
        Err(GenerateError::Status { status, body }) => {
            assert_eq!(status, 429);
            assert_eq!(body, "slow down");
        }
        Err(other) => panic!("unexpected error {other:?}"),
        Ok(_) => panic!("expected failure"),
    }
}

#[tokio::test]
async fn cut_off_body_is_reported_not_hidden() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).body(sse_body(&["Based", " on"], false));
        })
        .await;

    let chunks: Vec<_> = client_for(&server)
        .stream(&[ChatMessage::user("hi")])
        .await
        .expect("stream opens")
        .collect()
        .await;

    let (last, rest) = chunks.split_last().expect("at least one item");
    assert!(matches!(last, Err(GenerateError::Truncated)));
    let text: String = rest.iter().map(|c| c.as_ref().unwrap().text.as_str()).collect();
    assert_eq!(text, "Based on");
}

#[tokio::test]
async fn unreachable_upstream_is_request_error() {
    let client = ChatCompletionsClient::new(GenerateConfig {
        api_base: "http://127.0.0.1:9/v1".into(),
        api_key: "test-key".into(),
        connect_timeout_secs: 1,
        request_timeout_secs: 2,
        ..Default::default()
    })
    .unwrap();

    let err = client
        .stream(&[ChatMessage::user("hi")])
        .await
        .err()
        .expect("connection refused");
    assert!(matches!(
        err,
        GenerateError::Request(_) | GenerateError::Timeout(_)
    ));
}
