//! HTTP status and body handling against a real HTTP server.

use super::mock_server::MockServerFixture;
use mockito::Matcher;
use rest_pipeline::{CallOptions, Failure, FailureKind, Method};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Widget {
    id: u64,
    name: String,
    tags: Vec<String>,
}

#[tokio::test]
async fn test_not_found_carries_server_message() {
    let fixture = MockServerFixture::new().await;
    let _m = fixture
        .mock_json_response("GET", "/widgets/9", 404, r#"{"message":"x not found"}"#)
        .await;

    let err = fixture
        .client()
        .execute(Method::Get, "/widgets/9", CallOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::NotFound);
    assert_eq!(err.message(), "x not found");
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_auth_statuses_map_to_their_kinds() {
    let fixture = MockServerFixture::new().await;
    let _a = fixture
        .mock_json_response("GET", "/private", 401, r#"{"error":{"message":"bad key","code":"invalid_key"}}"#)
        .await;
    let _b = fixture
        .mock_json_response("GET", "/admin", 403, r#"{"error":"admins only"}"#)
        .await;
    let client = fixture.client();

    let err = client
        .execute(Method::Get, "/private", CallOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Unauthorized);
    assert_eq!(err.message(), "bad key");
    assert_eq!(err.code(), Some("invalid_key"));

    let err = client
        .execute(Method::Get, "/admin", CallOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Forbidden);
    assert_eq!(err.message(), "admins only");
}

#[tokio::test]
async fn test_server_and_other_statuses() {
    let fixture = MockServerFixture::new().await;
    let _a = fixture
        .mock_json_response("POST", "/jobs", 502, r#"{"message":"upstream down","code":503}"#)
        .await;
    let _b = {
        let mut server = fixture.server.lock().await;
        server
            .mock("DELETE", "/jobs/1")
            .with_status(409)
            .with_body("already running")
            .create_async()
            .await
    };
    let client = fixture.client();

    let err = client
        .execute(Method::Post, "/jobs", CallOptions::new())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        Failure::Server {
            status: 502,
            message: "upstream down".into(),
            code: Some("503".into()),
        }
    );
    assert!(err.is_retryable());

    let err = client
        .execute(Method::Delete, "/jobs/1", CallOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Api);
    assert_eq!(err.status(), Some(409));
    assert_eq!(err.message(), "already running");
}

#[tokio::test]
async fn test_empty_error_body_uses_reason_phrase() {
    let fixture = MockServerFixture::new().await;
    let _m = {
        let mut server = fixture.server.lock().await;
        server.mock("GET", "/gone").with_status(500).create_async().await
    };

    let err = fixture
        .client()
        .execute(Method::Get, "/gone", CallOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Server);
    assert_eq!(err.message(), "Internal Server Error");
}

#[tokio::test]
async fn test_success_round_trip() {
    let fixture = MockServerFixture::new().await;
    let _m = fixture
        .mock_json_response(
            "GET",
            "/widgets/7",
            200,
            r#"{"id":7,"name":"sprocket","tags":["steel","small"]}"#,
        )
        .await;

    let widget: Widget = fixture
        .client()
        .get("/widgets/7", CallOptions::new())
        .await
        .unwrap();
    assert_eq!(
        widget,
        Widget {
            id: 7,
            name: "sprocket".into(),
            tags: vec!["steel".into(), "small".into()],
        }
    );
}

#[tokio::test]
async fn test_json_body_and_headers_reach_server() {
    let fixture = MockServerFixture::new().await;
    let _m = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", "/widgets")
            .match_header("content-type", "application/json")
            .match_header("x-tenant", "acme")
            .match_header("accept", "application/json")
            .match_body(Matcher::Json(json!({"id": 1, "name": "bolt", "tags": []})))
            .with_status(201)
            .with_body(r#"{"id":1,"name":"bolt","tags":[]}"#)
            .create_async()
            .await
    };
    let client = fixture
        .builder()
        .header("accept", "application/json")
        .build()
        .unwrap();

    let body = Widget {
        id: 1,
        name: "bolt".into(),
        tags: vec![],
    };
    let options = CallOptions::new()
        .header("x-tenant", "acme")
        .json(&body)
        .unwrap();
    let created: Widget = client.post("/widgets", options).await.unwrap();
    assert_eq!(created, body);
}

#[tokio::test]
async fn test_empty_success_body_is_null() {
    let fixture = MockServerFixture::new().await;
    let _m = {
        let mut server = fixture.server.lock().await;
        server.mock("PUT", "/widgets/3").with_status(204).create_async().await
    };

    let response = fixture
        .client()
        .execute(Method::Put, "/widgets/3", CallOptions::new())
        .await
        .unwrap();
    assert_eq!(response.status, 204);
    assert!(response.data.is_null());
}

#[tokio::test]
async fn test_malformed_success_body_is_parse_failure() {
    let fixture = MockServerFixture::new().await;
    let _m = fixture
        .mock_json_response("GET", "/widgets/5", 200, "<html>oops</html>")
        .await;

    let err = fixture
        .client()
        .execute(Method::Get, "/widgets/5", CallOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Parse);
}

#[tokio::test]
async fn test_wrong_shape_is_parse_failure() {
    let fixture = MockServerFixture::new().await;
    let _m = fixture
        .mock_json_response("GET", "/widgets/6", 200, r#"{"id":"six"}"#)
        .await;

    let err = fixture
        .client()
        .get::<Widget>("/widgets/6", CallOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Parse);
}
