//! Integration tests for the reqwest transport using mockito

#![cfg(feature = "reqwest")]

use std::time::Duration;

use restpipe::backends::{ReqwestArtifact, ReqwestTransport};
use restpipe::{Error, HeaderCollection, JsonAdapter, RestClient, TransportErrorKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct TestPayload {
    name: String,
    value: i32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct TestResponse {
    success: bool,
    data: String,
}

fn client_for(server: &mockito::Server) -> RestClient<JsonAdapter> {
    RestClient::builder()
        .name("mockito")
        .base_url(&server.url())
        .transport(ReqwestTransport::new())
        .build()
        .expect("Client should build")
}

// === GET ===

#[tokio::test]
async fn test_get_success() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/api/data")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "data": "hello"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let response = client
        .get("api/data", None)
        .await
        .expect("GET should succeed");

    assert_eq!(response.status(), 200);
    assert!(response.headers().contains("Content-Type"));
    let body: TestResponse = response.to_model().expect("Body should decode");
    assert!(body.success);
    assert_eq!(body.data, "hello");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_with_query() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/api/search")
        .match_query(mockito::Matcher::AllOf(vec![
            mockito::Matcher::UrlEncoded("q".into(), "blue widget".into()),
            mockito::Matcher::UrlEncoded("page".into(), "2".into()),
        ]))
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let client = client_for(&server);
    let relative = restpipe::RelativeUrl::parse("api/search")
        .expect("Valid relative URL")
        .with_query_pairs([("q", "blue widget"), ("page", "2")]);
    let response = client
        .get(relative, None)
        .await
        .expect("GET should succeed");
    let items: Vec<TestPayload> = response.to_model().expect("Body should decode");
    assert!(items.is_empty());

    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_error_status() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/api/error")
        .with_status(404)
        .with_body("Not Found")
        .create_async()
        .await;

    let client = client_for(&server);
    let result = client.get("api/error", None).await;

    if let Err(Error::Status(failure)) = result {
        assert_eq!(failure.status(), 404);
        assert_eq!(failure.body_text(), "Not Found");
        let text: String = client
            .to_model_from(failure.body(), failure.headers())
            .expect("Text body should pass through");
        assert_eq!(text, "Not Found");
    } else {
        panic!("Expected Error::Status");
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_server_error() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/api/server-error")
        .with_status(500)
        .with_body("Internal Server Error")
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client
        .get("api/server-error", None)
        .await
        .expect_err("500 should fail");

    assert_eq!(err.status(), Some(500));
    assert!(!err.is_retryable());

    mock.assert_async().await;
}

// === Bodies ===

#[tokio::test]
async fn test_post_json_body() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/api/submit")
        .match_header("content-type", "application/json")
        .match_body(mockito::Matcher::Json(serde_json::json!({
            "name": "test",
            "value": 42
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "data": "received"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let payload = TestPayload {
        name: "test".to_string(),
        value: 42,
    };
    let response = client
        .post(&payload, "api/submit", None)
        .await
        .expect("POST should succeed");

    let body: TestResponse = response.to_model().expect("Body should decode");
    assert!(body.success);
    assert_eq!(body.data, "received");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_put_and_patch() {
    let mut server = mockito::Server::new_async().await;

    let put = server
        .mock("PUT", "/api/items/1")
        .match_body(mockito::Matcher::Json(serde_json::json!({
            "name": "updated",
            "value": 1
        })))
        .with_status(204)
        .create_async()
        .await;
    let patch = server
        .mock("PATCH", "/api/items/1")
        .match_body(mockito::Matcher::Json(serde_json::json!({"value": 2})))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let client = client_for(&server);
    let response = client
        .put(
            &TestPayload {
                name: "updated".to_string(),
                value: 1,
            },
            "api/items/1",
            None,
        )
        .await
        .expect("PUT should succeed");
    assert_eq!(response.status(), 204);
    assert!(response.body().is_empty());

    client
        .patch(&serde_json::json!({"value": 2}), "api/items/1", None)
        .await
        .expect("PATCH should succeed");

    put.assert_async().await;
    patch.assert_async().await;
}

#[tokio::test]
async fn test_delete() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("DELETE", "/api/items/7")
        .with_status(204)
        .create_async()
        .await;

    let client = client_for(&server);
    let response = client
        .delete("api/items/7", None)
        .await
        .expect("DELETE should succeed");
    assert_eq!(response.status(), 204);

    mock.assert_async().await;
}

// === Headers ===

#[tokio::test]
async fn test_default_and_call_headers_sent() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/api/headers")
        .match_header("x-api-key", "secret")
        .match_header("x-request-id", "req-1")
        .match_header("accept", "application/json")
        .with_status(200)
        .with_header("x-served-by", "mock")
        .with_body("{}")
        .create_async()
        .await;

    let client = RestClient::builder()
        .base_url(&server.url())
        .default_header("X-Api-Key", "secret")
        .default_header("Accept", "application/json")
        .transport(ReqwestTransport::new())
        .build()
        .expect("Client should build");

    let response = client
        .get(
            "api/headers",
            Some(HeaderCollection::new().append("X-Request-Id", "req-1")),
        )
        .await
        .expect("GET should succeed");
    assert_eq!(response.headers().first("X-Served-By"), Some("mock"));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_response_artifact() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/api/artifact")
        .with_status(200)
        .create_async()
        .await;

    let client = client_for(&server);
    let response = client
        .get("api/artifact", None)
        .await
        .expect("GET should succeed");

    let artifact = response
        .artifact::<ReqwestArtifact>()
        .expect("reqwest leaves an artifact");
    assert_eq!(artifact.final_url.path(), "/api/artifact");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_invalid_header_is_a_usage_error() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/api/data")
        .with_status(200)
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server);
    for headers in [
        HeaderCollection::new().append("Bad Name", "x"),
        HeaderCollection::new().append("X-Note", "a\r\nInjected: 1"),
    ] {
        let err = client
            .get("api/data", Some(headers))
            .await
            .expect_err("Invalid header should fail");
        assert!(matches!(err, Error::InvalidHeader(_)));
        assert!(!err.is_retryable());
    }

    mock.assert_async().await;
}

// === Transport failures ===

#[tokio::test]
async fn test_connection_refused() {
    // Port 9 (discard) is not expected to accept connections
    let client = RestClient::builder()
        .base_url("http://127.0.0.1:9")
        .transport(ReqwestTransport::new())
        .build()
        .expect("Client should build");

    let err = client
        .get("api/data", None)
        .await
        .expect_err("Connection should fail");
    match err {
        Error::Transport(inner) => assert_eq!(inner.kind(), TransportErrorKind::Connection),
        other => panic!("Expected Error::Transport, got {other:?}"),
    }
}

#[tokio::test]
async fn test_builder_timeout() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/api/data")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let transport = ReqwestTransport::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("Transport should build");
    let client = RestClient::builder()
        .base_url(&server.url())
        .transport(transport)
        .build()
        .expect("Client should build");

    let response = client
        .get("api/data", None)
        .await
        .expect("GET should succeed");
    assert!(response.is_success());

    mock.assert_async().await;
}
