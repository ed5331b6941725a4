//! End-to-end behavior of the validation router.

use apivet_core::{router, AppState, Config, StagingStrategy, Validator};
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

const VALID_DOC: &str = "openapi: 3.0.0\ninfo:\n  title: Test\n  version: 1.0.0\npaths: {}";
const INVALID_YAML: &str = "not: valid: yaml: : :";
const SCHEMA_VIOLATION: &str = "openapi: 3.0.0\ninfo:\n  version: 1.0.0\npaths: {}";

fn app(config: &Config) -> axum::Router {
    let state = AppState::new(Validator::new(config)).expect("editor page template");
    router(state, config.max_body_bytes)
}

fn validate_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/validate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .expect("request")
}

async fn post_content(app: axum::Router, content: &str) -> (StatusCode, Value) {
    let body = json!({ "content": content }).to_string();
    send(app, validate_request(body)).await
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = serde_json::from_slice(&bytes).expect("json body");
    (status, value)
}

fn assert_failure_shape(body: &Value) {
    assert_eq!(body["message"], "API validation failed");
    assert!(body.get("api").is_none(), "{}", body);
    let error = body["error"].as_str().expect("error string");
    assert!(!error.is_empty());
}

#[tokio::test]
async fn valid_document_returns_summary() {
    let (status, body) = post_content(app(&Config::default()), VALID_DOC).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "API is valid");
    assert!(body.get("error").is_none());
    assert_eq!(body["api"]["openapi"], "3.0.0");
    assert_eq!(body["api"]["info"]["title"], "Test");
    assert_eq!(body["api"]["info"]["version"], "1.0.0");
    assert_eq!(body["api"]["paths"], json!({}));
}

#[tokio::test]
async fn json_document_is_accepted() {
    let doc = json!({
        "openapi": "3.0.3",
        "info": {"title": "Pets", "version": "2.1.0"},
        "paths": {"/pets": {"get": {"responses": {"200": {"description": "ok"}}}}}
    })
    .to_string();
    let (status, body) = post_content(app(&Config::default()), &doc).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["api"]["info"]["title"], "Pets");
    assert!(body["api"]["paths"]["/pets"]["get"].is_object());
}

#[tokio::test]
async fn unparseable_yaml_is_a_client_error() {
    let (status, body) = post_content(app(&Config::default()), INVALID_YAML).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_failure_shape(&body);
}

#[tokio::test]
async fn schema_violation_is_a_client_error() {
    let (status, body) = post_content(app(&Config::default()), SCHEMA_VIOLATION).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_failure_shape(&body);
}

#[tokio::test]
async fn missing_content_field_is_a_payload_error() {
    let (status, body) = send(app(&Config::default()), validate_request("{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_failure_shape(&body);
    let error = body["error"].as_str().unwrap_or_default();
    assert!(error.starts_with("Invalid request payload"), "{}", error);
}

#[tokio::test]
async fn malformed_envelope_is_a_payload_error() {
    let (status, body) = send(app(&Config::default()), validate_request("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_failure_shape(&body);
}

#[tokio::test]
async fn missing_content_type_is_a_payload_error() {
    let request = Request::builder()
        .method("POST")
        .uri("/validate")
        .body(Body::from(json!({ "content": VALID_DOC }).to_string()))
        .expect("request");
    let (status, body) = send(app(&Config::default()), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_failure_shape(&body);
}

#[tokio::test]
async fn oversized_body_is_a_payload_error() {
    let config = Config {
        max_body_bytes: 64,
        ..Config::default()
    };
    let (status, body) = post_content(app(&config), &"x".repeat(1024)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_failure_shape(&body);
}

#[tokio::test]
async fn repeated_submissions_agree() {
    let config = Config::default();
    for content in [VALID_DOC, INVALID_YAML, SCHEMA_VIOLATION] {
        let (first, _) = post_content(app(&config), content).await;
        let (second, _) = post_content(app(&config), content).await;
        assert_eq!(first, second, "{}", content);
    }
}

#[tokio::test]
async fn concurrent_staged_submissions_leave_no_artifacts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Config {
        staging: StagingStrategy::TempFile,
        temp_dir: Some(dir.path().to_path_buf()),
        ..Config::default()
    };
    let app = app(&config);

    let docs = [VALID_DOC, INVALID_YAML, SCHEMA_VIOLATION];
    let requests = (0..24).map(|i| {
        let app = app.clone();
        let content = docs[i % docs.len()];
        async move { (content, post_content(app, content).await.0) }
    });
    let results = futures::future::join_all(requests).await;

    for (content, status) in results {
        let expected = if content == VALID_DOC {
            StatusCode::OK
        } else {
            StatusCode::BAD_REQUEST
        };
        assert_eq!(status, expected, "{}", content);
    }
    let leftover = std::fs::read_dir(dir.path()).expect("read_dir").count();
    assert_eq!(leftover, 0);
}

#[tokio::test]
async fn editor_page_renders_form_results() {
    let body = format!(
        "content={}",
        "openapi%3A+3.0.0%0Ainfo%3A%0A++version%3A+1.0.0%0Apaths%3A+%7B%7D"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .expect("request");
    let response = app(&Config::default())
        .oneshot(request)
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let html = String::from_utf8(bytes.to_vec()).expect("utf-8");
    assert!(html.contains("Validation error"));
    assert!(html.contains("version: 1.0.0"));
}

#[tokio::test]
async fn health_check() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("request");
    let response = app(&Config::default())
        .oneshot(request)
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}
