//! Retry behavior across real and scripted transports.

use super::mock_server::MockServerFixture;
use super::scripted::{self, ScriptedTransport, Step};
use rest_pipeline::{
    CallOptions, Failure, FailureKind, Method, RetryConfig, RetryInterceptor, TransportError,
};
use std::sync::Arc;
use std::time::Duration;

fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig::default()
        .with_max_retries(max_retries)
        .with_retry_delay(Duration::from_millis(1))
        .with_retryable_status_codes(vec![503])
}

#[tokio::test]
async fn test_exhausted_retries_dispatch_max_plus_one_times() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_expecting("GET", "/flaky", 503, r#"{"message":"try later"}"#, 3)
        .await;
    let client = fixture.builder().retry(fast_retry(2)).build().unwrap();

    let err = client
        .execute(Method::Get, "/flaky", CallOptions::new())
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert_eq!(
        err,
        Failure::Server {
            status: 503,
            message: "try later".into(),
            code: None,
        }
    );
}

#[tokio::test]
async fn test_non_retryable_status_is_not_retried() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_expecting("GET", "/missing", 404, r#"{"message":"nope"}"#, 1)
        .await;
    let client = fixture.builder().retry(fast_retry(5)).build().unwrap();

    let err = client
        .execute(Method::Get, "/missing", CallOptions::new())
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert_eq!(err.kind(), FailureKind::NotFound);
}

#[tokio::test]
async fn test_retry_then_success() {
    let transport = ScriptedTransport::new(vec![
        Step::Respond(503, ""),
        Step::Respond(503, ""),
        Step::Respond(200, r#"{"ok":true}"#),
    ]);
    let client = scripted::builder(&transport).retry(fast_retry(3)).build().unwrap();

    let response = client
        .execute(Method::Post, "jobs", CallOptions::new().body(serde_json::json!({"n": 1})))
        .await
        .unwrap();

    assert_eq!(response.data["ok"], true);
    assert_eq!(transport.calls(), 3);
    let requests = transport.requests();
    assert!(requests.iter().all(|r| r.body == requests[0].body));
}

#[tokio::test]
async fn test_each_call_gets_its_own_budget() {
    let transport = ScriptedTransport::new(vec![
        Step::Respond(503, ""),
        Step::Respond(503, ""),
        Step::Respond(503, ""),
        Step::Respond(503, ""),
    ]);
    let client = scripted::builder(&transport).retry(fast_retry(1)).build().unwrap();

    for _ in 0..2 {
        let err = client
            .execute(Method::Get, "status", CallOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
    }
    assert_eq!(transport.calls(), 4);
}

#[tokio::test]
async fn test_counters_are_released_after_settling() {
    let transport = ScriptedTransport::new(vec![
        Step::Respond(503, ""),
        Step::Fail(TransportError::Connect("connection refused".into())),
    ]);
    let retry = Arc::new(RetryInterceptor::new(fast_retry(3)));
    let client = scripted::builder(&transport)
        .interceptor_arc(retry.clone())
        .build()
        .unwrap();

    let err = client
        .execute(
            Method::Get,
            "status",
            CallOptions::new().retry_key("status-poll"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Network);
    assert_eq!(transport.calls(), 2);
    assert_eq!(retry.tracked_keys(), 0);
}

#[tokio::test]
async fn test_exponential_backoff_is_honored() {
    let transport = ScriptedTransport::new(vec![
        Step::Respond(503, ""),
        Step::Respond(503, ""),
        Step::Respond(200, "{}"),
    ]);
    let config = fast_retry(2)
        .with_retry_delay(Duration::from_millis(40))
        .with_exponential_backoff(true);
    let client = scripted::builder(&transport).retry(config).build().unwrap();

    let start = std::time::Instant::now();
    client
        .execute(Method::Get, "status", CallOptions::new())
        .await
        .unwrap();
    // 40 ms then 80 ms
    assert!(start.elapsed() >= Duration::from_millis(120));
}

#[tokio::test]
async fn test_abandoned_calls_release_their_counters() {
    let transport = ScriptedTransport::new((0..5).map(|_| Step::Respond(503, "")).collect());
    let retry = Arc::new(RetryInterceptor::new(
        fast_retry(3).with_retry_delay(Duration::from_secs(10)),
    ));
    let client = scripted::builder(&transport)
        .interceptor_arc(retry.clone())
        .build()
        .unwrap();

    for _ in 0..5 {
        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            client.execute(Method::Get, "status", CallOptions::new()),
        )
        .await;
        assert!(abandoned.is_err(), "call should still be backing off");
    }

    assert_eq!(transport.calls(), 5);
    assert_eq!(retry.tracked_keys(), 0);
}
