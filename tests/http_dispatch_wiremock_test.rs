//! HTTP dispatcher tests using wiremock for isolated mocking

use std::sync::Arc;
use std::time::Duration;

use jsonbatch::{
    BatchEngine, BatchTemplate, DispatchOptions, HttpDispatcher, Request, RequestDispatcher,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// HELPERS
// =============================================================================

fn options() -> DispatchOptions {
    DispatchOptions::default()
}

fn options_with_read_timeout(ms: u64) -> DispatchOptions {
    DispatchOptions {
        read_timeout_ms: ms,
        ..DispatchOptions::default()
    }
}

// =============================================================================
// DISPATCHER
// =============================================================================

#[tokio::test]
async fn test_get_json_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Request-Id", "abc")
                .set_body_json(json!({"status": "ok", "count": 42})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = HttpDispatcher::default();
    let request = Request::new("GET", format!("{}/api/data", server.uri()));
    let response = dispatcher.dispatch(&request, &options()).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, json!({"status": "ok", "count": 42}));
    assert_eq!(response.headers["x-request-id"], vec!["abc"]);
}

#[tokio::test]
async fn test_post_sends_json_body_and_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/items"))
        .and(header("X-Token", "t1"))
        .and(body_json(json!({"name": "Ada", "tags": [1, 2]})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 5})))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = HttpDispatcher::default();
    let request = Request::new("post", format!("{}/api/items", server.uri()))
        .with_header("X-Token", "t1")
        .with_body(json!({"name": "Ada", "tags": [1, 2]}));
    let response = dispatcher.dispatch(&request, &options()).await.unwrap();

    assert_eq!(response.status, 201);
    assert_eq!(response.body, json!({"id": 5}));
}

#[tokio::test]
async fn test_error_status_is_a_response_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "missing"})))
        .mount(&server)
        .await;

    let response = HttpDispatcher::default()
        .dispatch(&Request::new("GET", format!("{}/gone", server.uri())), &options())
        .await
        .unwrap();

    assert_eq!(response.status, 404);
    assert_eq!(response.body["error"], json!("missing"));
}

#[tokio::test]
async fn test_empty_body_is_null() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let response = HttpDispatcher::default()
        .dispatch(&Request::new("DELETE", format!("{}/x", server.uri())), &options())
        .await
        .unwrap();

    assert_eq!(response.status, 204);
    assert!(response.body.is_null());
}

#[tokio::test]
async fn test_text_body_falls_back_to_string() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("plain words"))
        .mount(&server)
        .await;
    let dispatcher = HttpDispatcher::default();
    let request = Request::new("GET", format!("{}/text", server.uri()));

    let response = dispatcher.dispatch(&request, &options()).await.unwrap();
    assert_eq!(response.body, json!("plain words"));

    let strict = DispatchOptions {
        fail_back_as_string: false,
        ..DispatchOptions::default()
    };
    let err = dispatcher.dispatch(&request, &strict).await.unwrap_err();
    assert_eq!(err.code(), "JB-054");
}

#[tokio::test]
async fn test_read_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let err = HttpDispatcher::default()
        .dispatch(
            &Request::new("GET", format!("{}/slow", server.uri())),
            &options_with_read_timeout(50),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), "JB-051");
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_connection_refused_is_dispatch_error() {
    // Nothing listens on port 1
    let err = HttpDispatcher::default()
        .dispatch(&Request::new("GET", "http://127.0.0.1:1/x"), &options())
        .await
        .unwrap_err();

    assert!(err.is_transport());
    assert!(err.to_string().contains("127.0.0.1:1"));
}

// =============================================================================
// ENGINE OVER HTTP
// =============================================================================

#[tokio::test]
async fn test_engine_chains_real_http_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 3}, {"id": 4}])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts/3/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"c": "x"}, {"c": "y"}])))
        .expect(1)
        .mount(&server)
        .await;

    let batch = BatchTemplate::from_json(
        r#"{
            "requests": [{
                "http_method": "GET",
                "url": "@{$.original.body.base}@/posts",
                "requests": [{
                    "http_method": "GET",
                    "url": "@{$.original.body.base}@/posts/@{$.responses[0].body[0].id}@/comments"
                }]
            }],
            "responses": [{
                "body": {"comments": "str[] $.responses[1].body[*].c", "total": "len($.responses[1].body)"}
            }]
        }"#,
    )
    .unwrap();
    let original = Request::new("POST", "http://gateway").with_body(json!({"base": server.uri()}));

    let engine = BatchEngine::new(Arc::new(HttpDispatcher::default()) as Arc<dyn RequestDispatcher>);
    let response = engine.execute(&original, &batch).await.unwrap();

    assert_eq!(response.body, json!({"comments": ["x", "y"], "total": 2}));
}

#[tokio::test]
async fn test_template_dispatch_options_override_engine_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ok": true}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let engine = BatchEngine::new(Arc::new(HttpDispatcher::default()) as Arc<dyn RequestDispatcher>)
        .with_default_options(options_with_read_timeout(50));
    let original = Request::new("POST", "http://gateway").with_body(json!({"base": server.uri()}));
    let step = r#"{"http_method": "GET", "url": "@{$.original.body.base}@/slow"}"#;

    let without = BatchTemplate::from_json(&format!(r#"{{"requests": [{step}]}}"#)).unwrap();
    let err = engine.execute(&original, &without).await.unwrap_err();
    assert_eq!(err.code(), "JB-051");

    let with = BatchTemplate::from_json(&format!(
        r#"{{"dispatch_options": {{"readTimeoutMs": 5000}}, "requests": [{step}]}}"#
    ))
    .unwrap();
    let response = engine.execute(&original, &with).await.unwrap();
    assert_eq!(response.body["responses"][0]["body"], json!({"ok": true}));
}
