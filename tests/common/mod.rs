//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use apm_agent::config::AgentConfig;
use apm_agent::context::CaptureBodyMode;
use apm_agent::http::ConnectionInfo;
use apm_agent::transport::RecorderTransport;
use apm_agent::{apm_middleware, traced, HandlerError, Tracer};
use axum::body::{Body, Bytes};
use axum::extract::Path;
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceExt;

/// Tracer whose events land in the returned recorder.
pub fn recording_tracer(capture_body: CaptureBodyMode) -> (Tracer, Arc<RecorderTransport>) {
    let recorder = Arc::new(RecorderTransport::new());
    let config = AgentConfig {
        capture_body,
        ..Default::default()
    };
    (Tracer::new(&config, recorder.clone()), recorder)
}

/// Application under test, instrumented with the agent.
pub fn test_app(tracer: Tracer) -> Router {
    Router::new()
        .route("/hello/{name}", get(traced(handle_hello)))
        .route("/panic", get(traced(handle_panic)))
        .route("/error", get(traced(handle_error)))
        .route("/echo", post(traced(handle_echo)))
        .route("/reject", post(traced(handle_reject)))
        .layer(axum::middleware::from_fn_with_state(tracer, apm_middleware))
}

async fn handle_hello(Path(name): Path<String>) -> impl IntoResponse {
    (
        StatusCode::IM_A_TEAPOT,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format!("Hello, {name}!"),
    )
}

async fn handle_panic() -> &'static str {
    panic!("boom")
}

async fn handle_error() -> Result<&'static str, HandlerError> {
    Err(HandlerError::new("wot"))
}

async fn handle_echo(body: Bytes) -> Bytes {
    body
}

async fn handle_reject(_body: Bytes) -> Result<&'static str, HandlerError> {
    Err(HandlerError::new("rejected"))
}

/// Request builder with the defaults every test request carries.
pub fn test_request(method: &str, path: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(format!("http://server.testing{path}"))
        .header(header::USER_AGENT, "apm_test")
        .extension(ConnectionInfo {
            peer_addr: Some("client.testing:1234".to_string()),
            tls: false,
        })
}

/// Drive one request through the app without a network listener.
pub async fn do_request(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}
