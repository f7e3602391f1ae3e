//! Router tests driven in-process with `tower::ServiceExt::oneshot`.
//!
//! No listener is bound and no datastore is contacted.
//!
//! Run with: cargo test --test http
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower::ServiceExt;

use trailhead::config::{AppConfig, Environment};
use trailhead::routes::with_middleware;
use trailhead::{create_router, AppState};

fn app_for(environment: Environment) -> Router {
    let config = AppConfig {
        environment,
        ..AppConfig::default()
    };
    create_router(AppState::new(config))
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn root_reports_success_with_no_users() {
    let response = app_for(Environment::Development)
        .oneshot(get_request("/"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    assert_eq!(json_body(response).await, json!({ "success": true, "users": [] }));
}

#[tokio::test]
async fn unknown_path_is_json_not_found() {
    let response = app_for(Environment::Development)
        .oneshot(get_request("/api/nothing-here"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await, json!({ "message": "Not Found" }));
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let response = app_for(Environment::Development)
        .oneshot(get_request("/"))
        .await
        .unwrap();
    let headers = response.headers();

    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    assert_eq!(headers["referrer-policy"], "no-referrer");
    assert_eq!(
        headers["strict-transport-security"],
        "max-age=31536000; includeSubDomains"
    );
    assert_eq!(headers["x-xss-protection"], "0");
    assert!(headers
        .get(header::CONTENT_SECURITY_POLICY)
        .is_some_and(|csp| csp.to_str().unwrap().starts_with("default-src 'self'")));
}

#[tokio::test]
async fn production_omits_content_security_policy() {
    let response = app_for(Environment::Production)
        .oneshot(get_request("/"))
        .await
        .unwrap();

    assert!(response.headers().get(header::CONTENT_SECURITY_POLICY).is_none());
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn security_headers_apply_to_not_found() {
    let response = app_for(Environment::Development)
        .oneshot(get_request("/missing"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()["x-dns-prefetch-control"], "off");
}

#[tokio::test]
async fn every_response_has_a_request_id() {
    let response = app_for(Environment::Development)
        .oneshot(get_request("/"))
        .await
        .unwrap();

    let request_id = response.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(request_id).is_ok());
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let request = Request::builder()
        .uri("/")
        .header(header::ORIGIN, "https://example.com")
        .body(Body::empty())
        .unwrap();

    let response = app_for(Environment::Development)
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn cors_answers_preflight() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/")
        .header(header::ORIGIN, "https://example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app_for(Environment::Development)
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let methods = response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .unwrap();
    assert!(methods.contains("POST"));
    assert!(methods.contains("DELETE"));
}

async fn boom() -> &'static str {
    panic!("kaboom")
}

async fn echo(Json(payload): Json<Value>) -> Json<Value> {
    Json(payload)
}

/// Extra routes wrapped in the same middleware stack `create_router` uses.
fn app_with_test_routes(environment: Environment) -> Router {
    let config = AppConfig {
        environment,
        ..AppConfig::default()
    };
    let routes = Router::new()
        .route("/boom", get(boom))
        .route("/echo", post(echo));
    with_middleware(routes, &config)
}

fn json_post(uri: &str, payload: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(payload).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn panic_details_exposed_in_development() {
    let response = app_with_test_routes(Environment::Development)
        .oneshot(get_request("/boom"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(
        json_body(response).await,
        json!({ "message": "Internal Server Error", "error": "kaboom" })
    );
}

#[tokio::test]
async fn panic_details_hidden_in_production() {
    let response = app_with_test_routes(Environment::Production)
        .oneshot(get_request("/boom"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({ "message": "Internal Server Error" })
    );
}

#[tokio::test]
async fn body_under_limit_is_accepted() {
    let payload = json!({ "note": "x".repeat(1024) });

    let response = app_with_test_routes(Environment::Development)
        .oneshot(json_post("/echo", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, payload);
}

#[tokio::test]
async fn body_over_limit_is_rejected() {
    let limit = AppConfig::default().http.body_limit_bytes;
    assert_eq!(limit, 100 * 1024);
    let payload = json!({ "note": "x".repeat(limit + 1) });

    let response = app_with_test_routes(Environment::Development)
        .oneshot(json_post("/echo", &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.headers()["x-frame-options"], "SAMEORIGIN");
}
