// tests/integration/trigger_test.rs

//! Integration tests for the HTTP triggers
//! Tests: /send-one, /send-many

use super::test_helpers::{TestServer, test_config};
use reqwest::StatusCode;

async fn get_ok(url: &str, query: &[(&str, &str)]) -> String {
    let response = reqwest::Client::new()
        .get(url)
        .query(query)
        .send()
        .await
        .expect("Trigger request failed");
    assert_eq!(response.status(), StatusCode::OK);
    response
        .json::<String>()
        .await
        .expect("Trigger response should be a JSON string")
}

// ===== /send-one =====

#[tokio::test]
async fn test_send_one_reaches_only_the_target() {
    let server = TestServer::start().await;
    let mut a = server.join(1).await;
    let mut b = server.join(2).await;

    let body = get_ok(
        &server.http_url("/send-one"),
        &[("client_id", a.client_id.as_str())],
    )
    .await;

    assert_eq!(body, "ok");
    assert_eq!(a.recv_text().await, "this is a unicast message");
    b.expect_silence().await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_send_one_with_unknown_id_still_answers_ok() {
    let server = TestServer::start().await;
    let mut a = server.join(1).await;

    let body = get_ok(
        &server.http_url("/send-one"),
        &[("client_id", "0000000000000000000000000000000000000000")],
    )
    .await;

    assert_eq!(body, "ok");
    a.expect_silence().await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_send_one_without_client_id_matches_nobody() {
    let server = TestServer::start().await;
    let mut a = server.join(1).await;

    let body = get_ok(&server.http_url("/send-one"), &[]).await;

    assert_eq!(body, "ok");
    a.expect_silence().await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_send_one_with_custom_message() {
    let server = TestServer::start().await;
    let mut a = server.join(1).await;

    get_ok(
        &server.http_url("/send-one"),
        &[("client_id", a.client_id.as_str()), ("message", "just for you")],
    )
    .await;

    assert_eq!(a.recv_text().await, "just for you");

    server.shutdown().await;
}

#[tokio::test]
async fn test_send_one_uses_configured_payload() {
    let mut config = test_config();
    config.triggers.unicast_message = "ping from ops".to_string();
    let server = TestServer::with_config(config).await;
    let mut a = server.join(1).await;

    get_ok(
        &server.http_url("/send-one"),
        &[("client_id", a.client_id.as_str())],
    )
    .await;

    assert_eq!(a.recv_text().await, "ping from ops");

    server.shutdown().await;
}

// ===== /send-many =====

#[tokio::test]
async fn test_send_many_reaches_every_client() {
    let server = TestServer::start().await;
    let mut a = server.join(1).await;
    let mut b = server.join(2).await;
    let mut c = server.join(3).await;

    let body = get_ok(&server.http_url("/send-many"), &[]).await;

    assert_eq!(body, "ok");
    for client in [&mut a, &mut b, &mut c] {
        assert_eq!(client.recv_text().await, "this is a broadcast message");
    }
    assert_eq!(server.state.stats.get_total_triggers(), 1);

    server.shutdown().await;
}

#[tokio::test]
async fn test_send_many_with_no_clients_answers_ok() {
    let server = TestServer::start().await;

    let body = get_ok(&server.http_url("/send-many"), &[]).await;
    assert_eq!(body, "ok");

    server.shutdown().await;
}

#[tokio::test]
async fn test_send_many_with_custom_message() {
    let server = TestServer::start().await;
    let mut a = server.join(1).await;

    get_ok(&server.http_url("/send-many"), &[("message", "maintenance at noon")]).await;
    assert_eq!(a.recv_text().await, "maintenance at noon");

    server.shutdown().await;
}

// ===== Disabled triggers =====

#[tokio::test]
async fn test_triggers_are_not_mounted_when_disabled() {
    let mut config = test_config();
    config.triggers.enabled = false;
    let server = TestServer::with_config(config).await;

    for path in ["/send-one", "/send-many"] {
        let response = reqwest::get(server.http_url(path))
            .await
            .expect("Request failed");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    server.shutdown().await;
}
