//! # Completion Client Tests
//!
//! Response parsing, HTTP status classification, and the request/response
//! cycle of the OpenAI-compatible client against a local one-shot HTTP
//! listener instead of a live API.

use reqwest::StatusCode;
use study_guide_bot::completion::{
    classify_failure, extract_completion_text, CompletionClient, OpenAiCompletionClient,
};
use study_guide_bot::completion_errors::CompletionError;
use study_guide_bot::config::CompletionSettings;

#[test]
fn test_extract_completion_text_trims() {
    let body = r#"{
        "id": "cmpl-1",
        "object": "text_completion",
        "choices": [ { "text": "\n\nEntropy is a measure of disorder. ", "index": 0, "finish_reason": "stop" } ]
    }"#;

    assert_eq!(
        extract_completion_text(body).unwrap(),
        "Entropy is a measure of disorder."
    );
}

#[test]
fn test_extract_completion_text_malformed_bodies() {
    let cases = [
        "not json",
        r#"{ "choices": [] }"#,
        r#"{ "object": "text_completion" }"#,
        r#"{ "choices": [ { "text": "   \n" } ] }"#,
        r#"{ "choices": [ { "index": 0 } ] }"#,
    ];

    for body in cases {
        let error = extract_completion_text(body).unwrap_err();
        assert!(
            matches!(error, CompletionError::MalformedResponse(_)),
            "{body} gave {error:?}"
        );
    }
}

#[test]
fn test_classify_failure_by_status() {
    let openai_error = r#"{ "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" } }"#;

    assert_eq!(
        classify_failure(StatusCode::UNAUTHORIZED, openai_error),
        CompletionError::Auth("Incorrect API key provided".to_string())
    );
    assert_eq!(classify_failure(StatusCode::FORBIDDEN, "").kind(), "auth");
    assert_eq!(classify_failure(StatusCode::TOO_MANY_REQUESTS, "").kind(), "quota");
    assert_eq!(classify_failure(StatusCode::BAD_GATEWAY, "").kind(), "network");
    assert_eq!(
        classify_failure(StatusCode::NOT_FOUND, "no such model"),
        CompletionError::Rejected {
            status: 404,
            message: "404 Not Found - no such model".to_string()
        }
    );
}

#[test]
fn test_classify_failure_hides_html_pages() {
    let error = classify_failure(
        StatusCode::SERVICE_UNAVAILABLE,
        "<html><body>nginx</body></html>",
    );
    match error {
        CompletionError::Network(message) => assert!(!message.contains("nginx")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_api_key_fails_with_auth() {
    let client = OpenAiCompletionClient::new(&CompletionSettings::default(), None).unwrap();

    let error = client.complete("Answer the following query:\nhi", 100).await.unwrap_err();

    assert_eq!(error.kind(), "auth");
}

#[tokio::test]
async fn test_unreachable_api_fails_with_network() {
    // Bind then drop a listener to get a local port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let settings = CompletionSettings {
        api_base: format!("http://127.0.0.1:{port}/v1"),
        timeout_secs: 5,
        ..Default::default()
    };
    let client = OpenAiCompletionClient::new(&settings, Some("sk-test".to_string())).unwrap();

    let error = client.complete("Answer the following query:\nhi", 100).await.unwrap_err();

    assert_eq!(error.kind(), "network");
}

/// Serve one canned HTTP response on a local port and hand back the raw request
async fn serve_once(
    status_line: &'static str,
    body: &'static str,
) -> (u16, tokio::sync::oneshot::Receiver<String>) {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (sender, receiver) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];

        let header_end = loop {
            let read = socket.read(&mut chunk).await.unwrap();
            assert!(read > 0, "connection closed before the request headers ended");
            request.extend_from_slice(&chunk[..read]);
            if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .map(|value| value.trim().parse::<usize>().unwrap())
            .unwrap_or(0);
        while request.len() < header_end + content_length {
            let read = socket.read(&mut chunk).await.unwrap();
            assert!(read > 0, "connection closed before the request body ended");
            request.extend_from_slice(&chunk[..read]);
        }

        let response = format!(
            "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();

        let _ = sender.send(String::from_utf8(request).unwrap());
    });

    (port, receiver)
}

#[tokio::test]
async fn test_successful_completion_round_trip() {
    let (port, request) = serve_once(
        "HTTP/1.1 200 OK",
        r#"{"id":"cmpl-2","object":"text_completion","choices":[{"text":"\n Entropy measures disorder. ","index":0}]}"#,
    )
    .await;

    let settings = CompletionSettings {
        api_base: format!("http://127.0.0.1:{port}/v1/"),
        timeout_secs: 5,
        ..Default::default()
    };
    let client = OpenAiCompletionClient::new(&settings, Some("sk-test".to_string())).unwrap();

    let answer = client
        .complete("Answer the following query:\nExplain entropy", 100)
        .await
        .unwrap();
    assert_eq!(answer, "Entropy measures disorder.");

    let request = request.await.unwrap();
    let (head, body) = request.split_once("\r\n\r\n").unwrap();
    let head = head.to_lowercase();
    assert!(head.starts_with("post /v1/completions http/1.1"), "{head}");
    assert!(head.contains("authorization: bearer sk-test"), "{head}");
    assert!(head.contains("content-type: application/json"), "{head}");

    let payload: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(payload["model"], "gpt-3.5-turbo-instruct");
    assert_eq!(payload["prompt"], "Answer the following query:\nExplain entropy");
    assert_eq!(payload["max_tokens"], 100);
}

#[tokio::test]
async fn test_error_status_from_server_is_classified() {
    let (port, _request) = serve_once(
        "HTTP/1.1 429 Too Many Requests",
        r#"{"error":{"message":"You exceeded your current quota","type":"insufficient_quota"}}"#,
    )
    .await;

    let settings = CompletionSettings {
        api_base: format!("http://127.0.0.1:{port}/v1"),
        timeout_secs: 5,
        ..Default::default()
    };
    let client = OpenAiCompletionClient::new(&settings, Some("sk-test".to_string())).unwrap();

    let error = client.complete("Answer the following query:\nhi", 100).await.unwrap_err();

    assert_eq!(
        error,
        CompletionError::Quota("You exceeded your current quota".to_string())
    );
}
