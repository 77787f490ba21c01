//! Tests for the transport module

use super::*;
use crate::error::Error;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn transport_for(server: &MockServer) -> ReqwestTransport {
    let config = TransportConfig::builder()
        .base_url(format!("{}/api/v1/", server.uri()))
        .build();
    ReqwestTransport::new(config).unwrap()
}

#[test]
fn test_transport_config_default() {
    let config = TransportConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert!(config.base_url.is_none());
    assert!(config.user_agent.starts_with("session-client/"));
}

#[test]
fn test_transport_config_builder() {
    let config = TransportConfig::builder()
        .base_url("http://127.0.0.1:8000/api/v1/")
        .timeout(Duration::from_secs(5))
        .header("Accept-Language", "es")
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(
        config.base_url.as_deref(),
        Some("http://127.0.0.1:8000/api/v1/")
    );
    assert_eq!(config.timeout, Duration::from_secs(5));
    assert_eq!(
        config.default_headers.get("Accept-Language"),
        Some(&"es".to_string())
    );
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[test]
fn test_build_url() {
    let config = TransportConfig::builder()
        .base_url("http://127.0.0.1:8000/api/v1/")
        .build();

    assert_eq!(
        config.build_url("users/me/"),
        "http://127.0.0.1:8000/api/v1/users/me/"
    );
    assert_eq!(
        config.build_url("/token/refresh/"),
        "http://127.0.0.1:8000/api/v1/token/refresh/"
    );
    assert_eq!(
        config.build_url("https://other.example.com/x"),
        "https://other.example.com/x"
    );

    let bare = TransportConfig::default();
    assert_eq!(bare.build_url("relative/"), "relative/");
}

#[test]
fn test_api_request_builder() {
    let request = ApiRequest::post("cotizaciones/", serde_json::json!({"cliente": 3}))
        .query("page", "2")
        .header("X-Request-Id", "abc123")
        .timeout(Duration::from_secs(10));

    assert_eq!(request.method(), &reqwest::Method::POST);
    assert_eq!(request.path(), "cotizaciones/");
    assert_eq!(
        request.query_params(),
        &[("page".to_string(), "2".to_string())]
    );
    assert_eq!(request.header_value("x-request-id"), Some("abc123"));
    assert_eq!(request.body(), Some(&serde_json::json!({"cliente": 3})));
    assert_eq!(request.timeout_override(), Some(Duration::from_secs(10)));
}

#[test]
fn test_with_bearer_replaces_existing_authorization() {
    let request = ApiRequest::get("users/me/").header("authorization", "Bearer stale");
    let authed = request.with_bearer("fresh");

    assert_eq!(authed.header_value("Authorization"), Some("Bearer fresh"));
    assert_eq!(authed.headers().len(), 1);
    // The original descriptor is untouched
    assert_eq!(request.header_value("Authorization"), Some("Bearer stale"));
}

#[test]
fn test_pending_request_retry_with() {
    let pending = PendingRequest::new(ApiRequest::get("proveedores/"));
    assert!(!pending.is_retried());
    assert!(pending.bearer().is_none());

    let replay = pending.retry_with("tok2");
    assert!(replay.is_retried());
    assert_eq!(replay.bearer(), Some("tok2"));
    assert_eq!(replay.request().path(), "proveedores/");
}

#[test]
fn test_api_response_json() {
    let response = ApiResponse::json_body(200, &serde_json::json!({"count": 3}));
    let value: serde_json::Value = response.json().unwrap();
    assert_eq!(value["count"], 3);

    let bad = ApiResponse::new(200, "not json");
    assert!(matches!(
        bad.json::<serde_json::Value>(),
        Err(Error::Decode { .. })
    ));
    assert_eq!(bad.text(), "not json");
}

#[tokio::test]
async fn test_send_get_with_query_and_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/productos/"))
        .and(query_param("page", "3"))
        .and(header("Authorization", "Bearer tok1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [{"id": 1}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    let request = ApiRequest::get("productos/")
        .query("page", "3")
        .with_bearer("tok1");

    let response = transport.send(&request).await.unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["results"][0]["id"], 1);
}

#[tokio::test]
async fn test_send_post_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/clientes/"))
        .and(body_json(serde_json::json!({"nombre": "ACME"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 9})))
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    let response = transport
        .send(&ApiRequest::post(
            "clientes/",
            serde_json::json!({"nombre": "ACME"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn test_send_non_success_is_status_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users/me/"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token_not_valid"))
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    let err = transport
        .send(&ApiRequest::get("users/me/"))
        .await
        .unwrap_err();

    match err {
        Error::HttpStatus { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "token_not_valid");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_send_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/slow/"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    let err = transport
        .send(&ApiRequest::get("slow/").timeout(Duration::from_millis(50)))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout { timeout_ms: 50 }));
    assert!(err.status().is_none());
}

#[tokio::test]
async fn test_send_connection_refused_has_no_status() {
    let transport = ReqwestTransport::new(
        TransportConfig::builder()
            .base_url("http://127.0.0.1:1")
            .build(),
    )
    .unwrap();

    let err = transport
        .send(&ApiRequest::get("anything/"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Http(_)));
    assert!(err.status().is_none());
}

#[test]
fn test_transport_debug() {
    let transport = ReqwestTransport::new(TransportConfig::default()).unwrap();
    let debug = format!("{transport:?}");
    assert!(debug.contains("ReqwestTransport"));
}
