//! Integration tests for the Mistral client using wiremock.

use std::time::Duration;

use futures::StreamExt;
use mistral_stream::{
    CancellationToken, ChatConfig, ChatMessage, FinishReason, Mistral, MistralError, Model,
};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHAT_PATH: &str = "/v1/chat/completions";

fn client(server: &MockServer, key: &str) -> Mistral {
    Mistral::new(key).api_url(format!("{}{CHAT_PATH}", server.uri()))
}

fn messages() -> Vec<ChatMessage> {
    vec![ChatMessage::user("Hello")]
}

fn config() -> ChatConfig {
    ChatConfig::new(Model::MistralTiny)
}

fn chunk(content: &str) -> String {
    serde_json::json!({
        "id": "cmpl-e5cc70bb28c444948073e77776eb30ef",
        "object": "chat.completion.chunk",
        "created": 1702256327,
        "model": "mistral-tiny",
        "choices": [{
            "index": 0,
            "delta": { "content": content },
            "finish_reason": null
        }]
    })
    .to_string()
}

fn sse_body(records: &[String]) -> String {
    let mut body = String::new();
    for record in records {
        body.push_str("data: ");
        body.push_str(record);
        body.push_str("\n\n");
    }
    body
}

#[tokio::test]
async fn stream_sends_headers_and_body() {
    let mock_server = MockServer::start().await;

    let sse = sse_body(&[chunk("Hi"), "[DONE]".into()]);

    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(header("authorization", "Bearer test-api-key"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({
            "model": "mistral-tiny",
            "messages": [{"role": "user", "content": "Hello"}],
            "temperature": 0.2,
            "max_tokens": 16,
            "stream": true,
            "safe_prompt": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = config()
        .with_temperature(0.2)
        .with_max_tokens(16)
        .with_safe_mode(true);
    let tokens = client(&mock_server, "test-api-key")
        .stream_chat(&messages(), &config)
        .await
        .unwrap();

    assert_eq!(tokens.collect_text().await.unwrap(), "Hi");
}

#[tokio::test]
async fn stream_yields_tokens_in_order() {
    let mock_server = MockServer::start().await;

    let mut records = vec![
        serde_json::json!({
            "id": "cmpl-1",
            "object": "chat.completion.chunk",
            "created": 1702256327,
            "model": "mistral-tiny",
            "choices": [{"index": 0, "delta": {"role": "assistant"}, "finish_reason": null}]
        })
        .to_string(),
    ];
    records.push(chunk("Hel"));
    records.push(chunk("lo"));
    records.push(
        serde_json::json!({
            "id": "cmpl-1",
            "object": "chat.completion.chunk",
            "created": 1702256327,
            "model": "mistral-tiny",
            "choices": [{"index": 0, "delta": {"content": ""}, "finish_reason": "stop"}]
        })
        .to_string(),
    );
    records.push("[DONE]".into());

    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse_body(&records), "text/event-stream"))
        .mount(&mock_server)
        .await;

    let tokens: Vec<String> = client(&mock_server, "key")
        .stream_chat(&messages(), &config())
        .await
        .unwrap()
        .map(|t| t.unwrap())
        .collect()
        .await;

    assert_eq!(tokens, vec!["", "Hel", "lo", ""]);
}

#[tokio::test]
async fn stream_ignores_data_after_done() {
    let mock_server = MockServer::start().await;

    let mut sse = sse_body(&[chunk("one"), "[DONE]".into()]);
    sse.push_str("this is not a record\n\n");
    sse.push_str(&sse_body(&[chunk("two")]));

    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
        .mount(&mock_server)
        .await;

    let results: Vec<_> = client(&mock_server, "key")
        .stream_chat(&messages(), &config())
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].as_deref().unwrap(), "one");
}

#[tokio::test]
async fn stream_returns_api_error_on_401() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = client(&mock_server, "bad-key")
        .stream_chat(&messages(), &config())
        .await
        .unwrap_err();

    match err {
        MistralError::Api { status, body } => {
            assert_eq!(status.as_u16(), 401);
            assert_eq!(body, "Unauthorized");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn stream_returns_api_error_on_500_with_empty_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server, "key")
        .stream_chat(&messages(), &config())
        .await
        .unwrap_err();

    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn stream_surfaces_protocol_violation() {
    let mock_server = MockServer::start().await;

    let sse = format!(
        "{}event: error\ndata: boom\n\n{}",
        sse_body(&[chunk("partial")]),
        sse_body(&[chunk("never")])
    );

    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
        .mount(&mock_server)
        .await;

    let results: Vec<_> = client(&mock_server, "key")
        .stream_chat(&messages(), &config())
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_deref().unwrap(), "partial");
    match &results[1] {
        Err(MistralError::Protocol { record }) => {
            assert_eq!(record, "event: error\ndata: boom\n");
        }
        other => panic!("expected protocol error, got: {other:?}"),
    }
}

#[tokio::test]
async fn stream_surfaces_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("data: {\"choices\": [\n\n", "text/event-stream"),
        )
        .mount(&mock_server)
        .await;

    let results: Vec<_> = client(&mock_server, "key")
        .stream_chat(&messages(), &config())
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(results.len(), 1);
    assert!(matches!(
        &results[0],
        Err(MistralError::Parse { record, .. }) if record.starts_with("data: {")
    ));
}

#[tokio::test]
async fn stream_without_done_ends_at_body_end() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse_body(&[chunk("a"), chunk("b")]), "text/event-stream"),
        )
        .mount(&mock_server)
        .await;

    let text = client(&mock_server, "key")
        .stream_chat(&messages(), &config())
        .await
        .unwrap()
        .collect_text()
        .await
        .unwrap();

    assert_eq!(text, "ab");
}

#[tokio::test]
async fn cancel_before_response_arrives() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse_body(&[chunk("late")]), "text/event-stream")
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&mock_server)
        .await;

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let err = tokio::time::timeout(
        Duration::from_secs(5),
        client(&mock_server, "key").stream_chat_with_cancel(&messages(), &config(), cancel),
    )
    .await
    .expect("cancellation should end the request promptly")
    .unwrap_err();

    assert!(err.is_cancelled());
}

#[tokio::test]
async fn cancel_after_first_token() {
    let mock_server = MockServer::start().await;

    let sse = sse_body(&[chunk("first"), chunk("second"), "[DONE]".into()]);

    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
        .mount(&mock_server)
        .await;

    let cancel = CancellationToken::new();
    let mut tokens = client(&mock_server, "key")
        .stream_chat_with_cancel(&messages(), &config(), cancel.clone())
        .await
        .unwrap();

    assert_eq!(tokens.next().await.unwrap().unwrap(), "first");
    cancel.cancel();
    assert!(matches!(
        tokens.next().await,
        Some(Err(MistralError::Cancelled))
    ));
    assert!(tokens.next().await.is_none());
}

#[tokio::test]
async fn complete_parses_full_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(header("authorization", "Bearer key"))
        .and(body_json(serde_json::json!({
            "model": "mistral-small",
            "messages": [{"role": "user", "content": "Hello"}],
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "cmpl-full",
            "object": "chat.completion",
            "created": 1702256327,
            "model": "mistral-small",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello! How can I help?"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 9, "completion_tokens": 7, "total_tokens": 16}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let resp = client(&mock_server, "key")
        .complete(&messages(), &ChatConfig::new(Model::MistralSmall))
        .await
        .unwrap();

    assert_eq!(resp.id, "cmpl-full");
    assert_eq!(resp.text(), "Hello! How can I help?");
    assert_eq!(resp.choices[0].finish_reason, Some(FinishReason::Stop));
    assert_eq!(resp.usage.prompt_tokens, 9);
    assert_eq!(resp.usage.completion_tokens, 7);
}

#[tokio::test]
async fn complete_returns_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_string("Requests rate limit exceeded"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server, "key")
        .complete(&messages(), &config())
        .await
        .unwrap_err();

    assert!(matches!(&err, MistralError::Api { body, .. } if body.contains("rate limit")));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn complete_rejects_malformed_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server, "key")
        .complete(&messages(), &config())
        .await
        .unwrap_err();

    assert!(matches!(err, MistralError::Parse { .. }));
}

#[tokio::test]
async fn connection_refused_is_network_error() {
    let err = Mistral::new("key")
        .api_url("http://127.0.0.1:1/v1/chat/completions")
        .stream_chat(&messages(), &config())
        .await
        .unwrap_err();

    assert!(matches!(err, MistralError::Network(_)));
    assert!(err.is_retryable());
}
