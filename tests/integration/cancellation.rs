//! Timeouts, cancellation and no-response failures.

use super::scripted::{self, ScriptedTransport, Step};
use async_trait::async_trait;
use rest_pipeline::{
    CallOptions, CancellationToken, Failure, FailureKind, Interceptor, Method, RequestContext,
    RestClientBuilder, RetryConfig, TransportError,
};
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_unresponsive_server_times_out() {
    let transport = ScriptedTransport::new(vec![Step::Hang]);
    let client = scripted::builder(&transport).build().unwrap();

    let start = Instant::now();
    let err = client
        .execute(
            Method::Get,
            "slow",
            CallOptions::new().timeout(Duration::from_millis(50)),
        )
        .await
        .unwrap_err();

    let elapsed = start.elapsed();
    assert_eq!(err.kind(), FailureKind::Timeout);
    assert!(elapsed >= Duration::from_millis(50), "fired early: {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(300), "fired late: {:?}", elapsed);
}

#[tokio::test]
async fn test_client_default_timeout_applies() {
    let transport = ScriptedTransport::new(vec![Step::Slow(Duration::from_secs(5), 200, "{}")]);
    let client = scripted::builder(&transport)
        .timeout(Duration::from_millis(30))
        .build()
        .unwrap();

    let err = client
        .execute(Method::Get, "slow", CallOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Timeout);
}

#[tokio::test]
async fn test_transport_timeout_is_timeout() {
    let transport = ScriptedTransport::new(vec![Step::Fail(TransportError::Timeout(
        "operation timed out".into(),
    ))]);
    let client = scripted::builder(&transport).build().unwrap();

    let err = client
        .execute(Method::Get, "x", CallOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err, Failure::timeout("operation timed out"));
}

#[tokio::test]
async fn test_cancel_in_flight_carries_reason() {
    let transport = ScriptedTransport::new(vec![Step::Hang]);
    let client = scripted::builder(&transport).build().unwrap();
    let (token, handle) = CancellationToken::source();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel_with("user navigated away");
        handle.cancel_with("ignored");
    });

    let start = Instant::now();
    let err = client
        .execute(Method::Get, "feed", CallOptions::new().cancel_token(token.clone()))
        .await
        .unwrap_err();

    assert_eq!(err, Failure::cancelled(Some("user navigated away")));
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(token.reason(), Some("user navigated away"));
}

#[tokio::test]
async fn test_one_token_cancels_every_call_sharing_it() {
    let transport = ScriptedTransport::new(vec![Step::Hang, Step::Hang, Step::Hang]);
    let client = scripted::builder(&transport).build().unwrap();
    let (token, handle) = CancellationToken::source();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel_with("bye");
    });

    let start = Instant::now();
    let (a, b, c) = tokio::join!(
        client.execute(Method::Get, "a", CallOptions::new().cancel_token(token.clone())),
        client.execute(Method::Post, "b", CallOptions::new().cancel_token(token.clone())),
        client.execute(Method::Delete, "c", CallOptions::new().cancel_token(token.clone())),
    );

    for result in [a, b, c] {
        assert_eq!(result.unwrap_err(), Failure::cancelled(Some("bye")));
    }
    assert_eq!(transport.calls(), 3);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_pre_cancelled_token_never_succeeds() {
    let transport = ScriptedTransport::new(vec![Step::Respond(200, r#"{"ok":true}"#)]);
    let client = scripted::builder(&transport).build().unwrap();
    let token = CancellationToken::new();
    token.cancel();

    let err = client
        .execute(Method::Get, "x", CallOptions::new().cancel_token(token))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Cancelled);
    assert_eq!(err.message(), "request cancelled");
}

#[tokio::test]
async fn test_cancel_during_backoff() {
    let transport = ScriptedTransport::new(vec![Step::Respond(503, "")]);
    let client = scripted::builder(&transport)
        .retry(RetryConfig::default().with_retry_delay(Duration::from_secs(10)))
        .build()
        .unwrap();
    let token = CancellationToken::new();
    let canceller = token.clone();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        canceller.cancel_with("shutdown");
    });

    let start = Instant::now();
    let err = client
        .execute(Method::Get, "jobs", CallOptions::new().cancel_token(token))
        .await
        .unwrap_err();

    assert_eq!(err, Failure::cancelled(Some("shutdown")));
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(transport.calls(), 1);
}

struct Swallow;

#[async_trait]
impl Interceptor for Swallow {
    async fn on_error(&self, _ctx: &RequestContext, _failure: &Failure) -> Option<Failure> {
        Some(Failure::network("replaced"))
    }
}

#[tokio::test]
async fn test_cancellation_wins_over_error_hooks() {
    let transport = ScriptedTransport::new(vec![Step::Hang]);
    let client = scripted::builder(&transport)
        .interceptor(Swallow)
        .build()
        .unwrap();
    let token = CancellationToken::new();
    let canceller = token.clone();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        canceller.cancel();
    });

    let err = client
        .execute(Method::Get, "x", CallOptions::new().cancel_token(token))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Cancelled);
}

#[tokio::test]
async fn test_cancelling_one_call_leaves_others_alone() {
    let transport = ScriptedTransport::new(vec![
        Step::Slow(Duration::from_millis(50), 200, r#"{"n":1}"#),
        Step::Slow(Duration::from_millis(50), 200, r#"{"n":2}"#),
    ]);
    let client = scripted::builder(&transport).build().unwrap();
    let token = CancellationToken::new();
    token.cancel();

    let (cancelled, ok) = tokio::join!(
        client.execute(Method::Get, "a", CallOptions::new().cancel_token(token)),
        client.execute(Method::Get, "b", CallOptions::new()),
    );
    assert_eq!(cancelled.unwrap_err().kind(), FailureKind::Cancelled);
    assert!(ok.unwrap().data.is_object());
}

#[tokio::test]
async fn test_network_failures_are_classified() {
    let transport = ScriptedTransport::new(vec![
        Step::Fail(TransportError::Connect("tcp connect error".into())),
        Step::Fail(TransportError::Other(
            "error trying to connect: Network is unreachable (os error 101)".into(),
        )),
        Step::Fail(TransportError::Other("invalid chunk".into())),
    ]);
    let client = scripted::builder(&transport).build().unwrap();

    let mut kinds = Vec::new();
    for _ in 0..3 {
        let err = client
            .execute(Method::Get, "x", CallOptions::new())
            .await
            .unwrap_err();
        kinds.push(err.kind());
    }
    assert_eq!(
        kinds,
        vec![FailureKind::Network, FailureKind::Network, FailureKind::Api]
    );
}

#[tokio::test]
async fn test_relative_url_without_base_is_validation() {
    let transport = ScriptedTransport::new(vec![]);
    let client = RestClientBuilder::new()
        .transport_arc(transport.clone())
        .build()
        .unwrap();

    let err = client
        .execute(Method::Get, "/widgets", CallOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Validation);
    assert_eq!(transport.calls(), 0);

    let ok = client
        .execute(Method::Get, "https://other.test/widgets", CallOptions::new())
        .await
        .unwrap();
    assert!(ok.data.is_object());
}

#[tokio::test]
async fn test_invalid_call_header_is_validation() {
    let transport = ScriptedTransport::new(vec![]);
    let client = scripted::builder(&transport).build().unwrap();

    let err = client
        .execute(Method::Get, "x", CallOptions::new().header("bad header", "v"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Validation);
    assert_eq!(transport.calls(), 0);
}
