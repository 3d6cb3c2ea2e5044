use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use bytes::Bytes;
use serde::Deserialize;
use sonic_rs::from_slice;
use tempfile::{TempDir, tempdir};
use tower::ServiceExt;

use model_store::model::{ErrorReply, MessageReply, ModelRecord, ValidationErrors};
use model_store::store::ModelStore;
use model_store::{api, form};

fn test_router() -> (Router, TempDir) {
    let dir = tempdir().expect("tempdir");
    let store = ModelStore::open(dir.path()).expect("open store");
    (api::router(store), dir)
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", form::JSON_CONTENT_TYPE)
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

fn bare_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Bytes) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("request should route");
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    (status, body)
}

#[tokio::test]
async fn valid_draft_answers_ok_with_message() {
    let (app, _dir) = test_router();

    let (status, body) = send(
        &app,
        json_request("POST", "/model1", r#"{"name":"mymodel","value":7}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let reply: MessageReply = from_slice(&body).expect("message envelope");
    assert_eq!(reply.message, "Model created");
}

#[tokio::test]
async fn duplicate_name_answers_bad_request_with_detail() {
    let (app, _dir) = test_router();

    let first = json_request("POST", "/model1", r#"{"name":"mymodel","value":7}"#);
    let (status, _) = send(&app, first).await;
    assert_eq!(status, StatusCode::OK);

    let second = json_request("POST", "/model1", r#"{"name":"mymodel","value":9}"#);
    let (status, body) = send(&app, second).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let reply: ErrorReply = from_slice(&body).expect("error envelope");
    assert_eq!(reply.detail, "This model already exists");
}

#[tokio::test]
async fn non_integer_value_answers_unprocessable_with_errors_array() {
    let (app, _dir) = test_router();

    let (status, body) = send(
        &app,
        json_request("POST", "/model1", r#"{"name":"mymodel","value":"abc"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let reply: ValidationErrors = from_slice(&body).expect("validation envelope");
    assert_eq!(reply.errors.len(), 1);
    assert!(!reply.errors[0].is_empty());
}

#[tokio::test]
async fn malformed_json_answers_bad_request_with_detail() {
    let (app, _dir) = test_router();

    let (status, body) = send(&app, json_request("POST", "/model1", r#"{"name":"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let reply: ErrorReply = from_slice(&body).expect("error envelope");
    assert!(!reply.detail.is_empty());
}

#[tokio::test]
async fn missing_content_type_is_unsupported_media_type() {
    let (app, _dir) = test_router();

    let request = Request::builder()
        .method("POST")
        .uri("/model1")
        .body(Body::from(r#"{"name":"mymodel","value":7}"#))
        .expect("request should build");
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let reply: ErrorReply = from_slice(&body).expect("error envelope");
    assert!(!reply.detail.is_empty());
}

#[tokio::test]
async fn invalid_name_answers_bad_request() {
    let (app, _dir) = test_router();

    let (status, body) = send(
        &app,
        json_request("POST", "/model1", r#"{"name":"a/b","value":1}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let reply: ErrorReply = from_slice(&body).expect("error envelope");
    assert_eq!(
        reply.detail,
        "Model names must be non-empty and free of path separators"
    );
}

#[tokio::test]
async fn stored_models_lists_sorted_records() {
    let (app, _dir) = test_router();

    for body in [
        r#"{"name":"beta","value":2}"#,
        r#"{"name":"alpha","value":1}"#,
    ] {
        let (status, _) = send(&app, json_request("POST", "/model1", body)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&app, bare_request("GET", "/model1/stored")).await;

    assert_eq!(status, StatusCode::OK);
    let records: Vec<ModelRecord> = from_slice(&body).expect("record list");
    let names: Vec<&str> = records.iter().map(|record| record.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta"]);
    assert_eq!(records[0].value, 1);
    assert_eq!(records[1].value, 2);
}

#[tokio::test]
async fn patch_adds_value_and_persists() {
    let (app, _dir) = test_router();

    let (status, _) = send(
        &app,
        json_request("POST", "/model1", r#"{"name":"mymodel","value":3}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, bare_request("PATCH", "/model1/mymodel?value=4")).await;
    assert_eq!(status, StatusCode::OK);
    let reply: MessageReply = from_slice(&body).expect("message envelope");
    assert_eq!(reply.message, "Model updated");

    let (_, body) = send(&app, bare_request("GET", "/model1/stored")).await;
    let records: Vec<ModelRecord> = from_slice(&body).expect("record list");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].value, 7);
}

#[tokio::test]
async fn patch_unknown_model_answers_bad_request() {
    let (app, _dir) = test_router();

    let (status, body) = send(&app, bare_request("PATCH", "/model1/ghost?value=1")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let reply: ErrorReply = from_slice(&body).expect("error envelope");
    assert_eq!(
        reply.detail,
        "The model name given does not correspond to any model stored"
    );
}

#[tokio::test]
async fn hello_health_and_info_report_the_service() {
    #[derive(Deserialize)]
    struct Hello {
        message: String,
        status: String,
        timestamp: String,
    }

    #[derive(Deserialize)]
    struct Health {
        status: String,
        timestamp: String,
    }

    #[derive(Deserialize)]
    struct Info {
        app: String,
        version: String,
    }

    let (app, _dir) = test_router();

    let (status, body) = send(&app, bare_request("GET", "/")).await;
    assert_eq!(status, StatusCode::OK);
    let hello: Hello = from_slice(&body).expect("hello envelope");
    assert_eq!(hello.message, "Hello from model-store");
    assert_eq!(hello.status, "healthy");
    assert!(!hello.timestamp.is_empty());

    let (status, body) = send(&app, bare_request("GET", "/health")).await;
    assert_eq!(status, StatusCode::OK);
    let health: Health = from_slice(&body).expect("health envelope");
    assert_eq!(health.status, "healthy");
    assert!(!health.timestamp.is_empty());

    let (status, body) = send(&app, bare_request("GET", "/info")).await;
    assert_eq!(status, StatusCode::OK);
    let info: Info = from_slice(&body).expect("info envelope");
    assert_eq!(info.app, "model-store");
    assert!(!info.version.is_empty());
}
