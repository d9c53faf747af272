//! Integration tests for `TelegramNotifier` against a wiremock Bot API.

use rpwatch_notifier::{deliver, NotificationEvent, Notifier, NotifierError, TelegramNotifier};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "123:abc";

fn notifier(server: &MockServer) -> TelegramNotifier {
    TelegramNotifier::with_base_url(TOKEN, "-100200", 5, &server.uri())
        .expect("client should build")
        .with_retry(2, 0)
}

fn ok_body() -> serde_json::Value {
    json!({ "ok": true, "result": { "message_id": 1 } })
}

#[tokio::test]
async fn send_text_posts_to_send_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .and(body_partial_json(json!({
            "chat_id": "-100200",
            "text": "New repost detected\nhttps://www.tiktok.com/@a/video/7"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    let event = NotificationEvent::NewItem {
        reference: "https://www.tiktok.com/@a/video/7".to_owned(),
    };
    assert!(deliver(&notifier(&server), &event).await);
}

#[tokio::test]
async fn long_messages_are_truncated_to_telegram_limit() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    notifier(&server)
        .send_text(&"a".repeat(5_000))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["text"].as_str().unwrap().chars().count(), 4096);
}

#[tokio::test]
async fn send_image_uploads_multipart_photo() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendPhoto"))
        .and(body_string_contains("name=\"photo\""))
        .and(body_string_contains("name=\"caption\""))
        .and(body_string_contains("no items found"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    notifier(&server)
        .send_image(&[0x89, b'P', b'N', b'G'], "no items found")
        .await
        .unwrap();
}

#[tokio::test]
async fn api_rejection_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = notifier(&server).send_text("hi").await.unwrap_err();
    assert!(
        matches!(err, NotifierError::Api { ref description, .. } if description.contains("chat not found")),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn rate_limit_is_retried_after_server_hint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "ok": false,
            "error_code": 429,
            "description": "Too Many Requests: retry after 1",
            "parameters": { "retry_after": 1 }
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    notifier(&server).send_text("hi").await.unwrap();
}

#[tokio::test]
async fn server_errors_exhaust_retry_budget() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let err = notifier(&server).send_text("hi").await.unwrap_err();
    assert!(
        matches!(err, NotifierError::UnexpectedStatus { status: 502, .. }),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn errors_never_leak_the_bot_token() {
    let notifier = TelegramNotifier::with_base_url(TOKEN, "1", 1, "http://127.0.0.1:1")
        .unwrap()
        .with_retry(0, 0);
    let err = notifier.send_text("hi").await.unwrap_err();
    assert!(!err.to_string().contains("123:abc"), "got: {err}");
}

#[tokio::test]
async fn post_event_is_noop_without_webhook() {
    let server = MockServer::start().await;
    let notifier = notifier(&server);
    assert!(!notifier.has_webhook());
    notifier.post_event(&json!({ "event": "x" })).await.unwrap();
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn post_event_sends_json_to_webhook() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({ "event": "new_repost_detected", "item_id": "7" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = notifier(&server)
        .with_webhook(&format!("{}/hook", server.uri()))
        .unwrap();
    notifier
        .post_event(&json!({ "event": "new_repost_detected", "item_id": "7" }))
        .await
        .unwrap();
}

#[tokio::test]
async fn webhook_client_error_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = notifier(&server)
        .with_webhook(&format!("{}/hook", server.uri()))
        .unwrap();
    let err = notifier.post_event(&json!({})).await.unwrap_err();
    assert!(matches!(err, NotifierError::UnexpectedStatus { status: 404, .. }));
}
