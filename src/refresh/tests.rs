//! Tests for the refresh module

use super::*;
use crate::error::RefreshError;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use crate::transport::TransportConfig;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn leader(coordinator: &RefreshCoordinator) -> RefreshGuard<'_> {
    match coordinator.begin() {
        Ticket::Leader(guard) => guard,
        Ticket::Waiter(_) => panic!("expected to lead the refresh"),
    }
}

fn waiter(coordinator: &RefreshCoordinator) -> RefreshWaiter {
    match coordinator.begin() {
        Ticket::Waiter(waiter) => waiter,
        Ticket::Leader(_) => panic!("expected to wait on the refresh"),
    }
}

// ============================================================================
// Coordinator Tests
// ============================================================================

#[test]
fn test_first_caller_leads() {
    let coordinator = RefreshCoordinator::new();
    assert!(!coordinator.is_refreshing());

    let guard = leader(&coordinator);
    assert!(coordinator.is_refreshing());

    let _w1 = waiter(&coordinator);
    let _w2 = waiter(&coordinator);
    assert_eq!(coordinator.waiting(), 2);

    assert_eq!(guard.resolve("tok2"), 2);
    assert!(!coordinator.is_refreshing());
    assert_eq!(coordinator.waiting(), 0);
    assert_eq!(coordinator.completed_cycles(), 1);
}

#[tokio::test]
async fn test_resolve_hands_token_to_waiters() {
    let coordinator = RefreshCoordinator::new();
    let guard = leader(&coordinator);
    let w1 = waiter(&coordinator);
    let w2 = waiter(&coordinator);

    guard.resolve("tok2");

    assert_eq!(w1.wait().await, Ok("tok2".to_string()));
    assert_eq!(w2.wait().await, Ok("tok2".to_string()));
}

#[tokio::test]
async fn test_reject_hands_error_to_waiters() {
    let coordinator = RefreshCoordinator::new();
    let guard = leader(&coordinator);
    let w1 = waiter(&coordinator);

    let error = RefreshError::rejected(Some(401), "token_not_valid");
    guard.reject(error.clone());

    assert_eq!(w1.wait().await, Err(error));
    assert!(!coordinator.is_refreshing());
}

#[tokio::test]
async fn test_waiters_settle_in_fifo_order() {
    let coordinator = RefreshCoordinator::new();
    let guard = leader(&coordinator);
    let order = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..5)
        .map(|i| {
            let w = waiter(&coordinator);
            let order = Arc::clone(&order);
            tokio::spawn(async move {
                let outcome = w.wait().await;
                order.lock().unwrap().push(i);
                outcome
            })
        })
        .collect();

    // Let every waiter park on its channel before the refresh settles
    tokio::task::yield_now().await;
    guard.resolve("tok2");

    for handle in handles {
        assert_eq!(handle.await.unwrap(), Ok("tok2".to_string()));
    }
    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn test_dropped_guard_abandons_cycle() {
    let coordinator = RefreshCoordinator::new();
    let w1 = {
        let _guard = leader(&coordinator);
        waiter(&coordinator)
    };

    assert!(!coordinator.is_refreshing());
    assert_eq!(w1.wait().await, Err(RefreshError::Abandoned));
}

#[test]
fn test_guard_released_on_panic() {
    let coordinator = RefreshCoordinator::new();

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _guard = leader(&coordinator);
        panic!("refresh blew up");
    }));

    assert!(result.is_err());
    assert!(!coordinator.is_refreshing());
    // A new cycle can start
    let _guard = leader(&coordinator);
}

#[test]
fn test_second_cycle_after_first_settles() {
    let coordinator = RefreshCoordinator::new();

    leader(&coordinator).reject(RefreshError::NoRefreshToken);
    leader(&coordinator).resolve("tok3");

    assert_eq!(coordinator.completed_cycles(), 2);
    assert!(!coordinator.is_refreshing());
}

#[tokio::test]
async fn test_waiter_timeout_leaves_others_untouched() {
    let coordinator = RefreshCoordinator::new();
    let guard = leader(&coordinator);
    let impatient = waiter(&coordinator);
    let patient = waiter(&coordinator);

    let outcome = impatient.wait_for(Some(Duration::from_millis(20))).await;
    assert_eq!(outcome, Err(RefreshError::WaitTimedOut { timeout_ms: 20 }));

    assert_eq!(guard.resolve("tok2"), 2);
    assert_eq!(patient.wait_for(None).await, Ok("tok2".to_string()));
}

// ============================================================================
// HTTP Refresher Tests
// ============================================================================

fn refresher_for(server: &MockServer) -> HttpTokenRefresher {
    let transport = TransportConfig::builder()
        .timeout(Duration::from_secs(5))
        .user_agent("test-agent/1.0")
        .build();
    HttpTokenRefresher::new(format!("{}/api/v1/token/refresh/", server.uri()), &transport).unwrap()
}

#[tokio::test]
async fn test_refresh_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/token/refresh/"))
        .and(body_json(serde_json::json!({"refresh": "r1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access": "tok2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = refresher_for(&server).refresh("r1").await.unwrap();
    assert_eq!(tokens.access, "tok2");
    assert!(tokens.refresh.is_none());
}

#[tokio::test]
async fn test_refresh_with_rotation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access": "tok2",
            "refresh": "r2"
        })))
        .mount(&server)
        .await;

    let tokens = refresher_for(&server).refresh("r1").await.unwrap();
    assert_eq!(tokens.refresh.as_deref(), Some("r2"));
}

#[tokio::test]
async fn test_refresh_unauthorized_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/token/refresh/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "detail": "Token is invalid or expired",
            "code": "token_not_valid"
        })))
        .mount(&server)
        .await;

    let err = refresher_for(&server).refresh("stale").await.unwrap_err();
    match err {
        RefreshError::Rejected { status, message } => {
            assert_eq!(status, Some(401));
            assert!(message.contains("token_not_valid"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_refresh_malformed_body_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token": "wrong-field"
        })))
        .mount(&server)
        .await;

    let err = refresher_for(&server).refresh("r1").await.unwrap_err();
    assert!(matches!(err, RefreshError::Rejected { status: Some(200), .. }));
}

#[tokio::test]
async fn test_refresh_unreachable_is_rejected() {
    let transport = TransportConfig::builder()
        .timeout(Duration::from_secs(2))
        .build();
    let refresher =
        HttpTokenRefresher::new("http://127.0.0.1:1/api/v1/token/refresh/", &transport).unwrap();

    let err = refresher.refresh("r1").await.unwrap_err();
    assert!(matches!(err, RefreshError::Rejected { status: None, .. }));
}

#[tokio::test]
async fn test_refresh_sends_default_headers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/token/refresh/"))
        .and(header("Accept-Language", "es"))
        .and(header("User-Agent", "test-agent/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access": "tok2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = TransportConfig::builder()
        .user_agent("test-agent/1.0")
        .header("Accept-Language", "es")
        .build();
    let refresher =
        HttpTokenRefresher::new(format!("{}/api/v1/token/refresh/", server.uri()), &transport)
            .unwrap();

    let tokens = refresher.refresh("r1").await.unwrap();
    assert_eq!(tokens.access, "tok2");
}

#[test]
fn test_refresher_rejects_invalid_default_header() {
    let transport = TransportConfig::builder()
        .header("Bad Header", "x")
        .build();
    let err = HttpTokenRefresher::new("http://localhost/refresh/", &transport).unwrap_err();
    assert!(err.to_string().contains("Bad Header"));
}
