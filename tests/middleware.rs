//! End-to-end tests of the axum instrumentation.

mod common;

use apm_agent::context::CaptureBodyMode;
use apm_agent::model::RequestBody;
use axum::body::Body;
use axum::http::{header, StatusCode};

use common::{do_request, recording_tracer, test_app, test_request};

#[tokio::test]
async fn test_transaction_context() {
    let (tracer, recorder) = recording_tracer(CaptureBodyMode::Off);
    let app = test_app(tracer);

    let request = test_request("GET", "/hello/foo").body(Body::empty()).unwrap();
    let response = do_request(app, request).await;
    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);

    let transactions = recorder.transactions();
    assert_eq!(transactions.len(), 1);
    let tx = &transactions[0];
    assert_eq!(tx.name, "GET /hello/{name}");
    assert_eq!(tx.kind, "request");
    assert_eq!(tx.result, "HTTP 4xx");

    let context = tx.context.as_ref().unwrap();
    let request = context.request.as_ref().unwrap();
    assert_eq!(request.method, "GET");
    assert_eq!(request.http_version, "1.1");
    assert_eq!(request.url.full, "http://server.testing/hello/foo");
    assert_eq!(request.url.protocol, "http");
    assert_eq!(request.url.hostname, "server.testing");
    assert_eq!(request.url.path, "/hello/foo");
    assert_eq!(request.headers.as_ref().unwrap().user_agent, "apm_test");
    let socket = request.socket.as_ref().unwrap();
    assert_eq!(socket.remote_address, "client.testing");
    assert!(!socket.encrypted);
    assert!(request.body.is_none());

    let response = context.response.as_ref().unwrap();
    assert_eq!(response.status_code, 418);
    assert_eq!(
        response.headers.as_ref().unwrap().content_type,
        "text/plain; charset=utf-8"
    );

    let framework = context
        .service
        .as_ref()
        .and_then(|s| s.framework.as_ref())
        .unwrap();
    assert_eq!(framework.name, "axum");
    assert!(!framework.version.is_empty());
    assert_eq!(context.service.as_ref().unwrap().name, "unknown-service");

    assert!(context.user.is_none());
    assert!(recorder.errors().is_empty());
}

#[tokio::test]
async fn test_unknown_route() {
    let (tracer, recorder) = recording_tracer(CaptureBodyMode::Off);
    let app = test_app(tracer);

    let request = test_request("GET", "/missing").body(Body::empty()).unwrap();
    let response = do_request(app, request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let transactions = recorder.transactions();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].name, "GET unknown route");
    assert_eq!(transactions[0].result, "HTTP 4xx");
}

#[tokio::test]
async fn test_panic_is_reported() {
    let (tracer, recorder) = recording_tracer(CaptureBodyMode::Off);
    let app = test_app(tracer);

    let request = test_request("GET", "/panic").body(Body::empty()).unwrap();
    let response = do_request(app, request).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let transactions = recorder.transactions();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].result, "HTTP 5xx");

    let errors = recorder.errors();
    assert_eq!(errors.len(), 1);
    let error = &errors[0];
    assert_eq!(error.exception.message, "boom");
    assert!(!error.exception.handled);
    assert_eq!(error.transaction_id, Some(transactions[0].id));
    assert_eq!(error.culprit, "handle_panic");

    let context = error.context.as_ref().unwrap();
    assert_eq!(context.request.as_ref().unwrap().url.path, "/panic");
    assert_eq!(context.response.as_ref().unwrap().status_code, 500);
}

#[tokio::test]
async fn test_handler_error_is_reported() {
    let (tracer, recorder) = recording_tracer(CaptureBodyMode::Off);
    let app = test_app(tracer);

    let request = test_request("GET", "/error").body(Body::empty()).unwrap();
    let response = do_request(app, request).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let errors = recorder.errors();
    assert_eq!(errors.len(), 1);
    let error = &errors[0];
    assert_eq!(error.exception.message, "wot");
    assert!(error.exception.handled);
    assert_eq!(error.culprit, "handle_error");

    let context = error.context.as_ref().unwrap();
    assert_eq!(context.response.as_ref().unwrap().status_code, 500);
    let tx = &recorder.transactions()[0];
    assert_eq!(error.transaction_id, Some(tx.id));
    assert_eq!(tx.context.as_ref().unwrap().response.as_ref().unwrap().status_code, 500);
}

#[tokio::test]
async fn test_form_body_captured_for_transactions() {
    let (tracer, recorder) = recording_tracer(CaptureBodyMode::All);
    let app = test_app(tracer);

    let payload = "foo=bar&foo=baz&x=1";
    let request = test_request("POST", "/echo")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::CONTENT_LENGTH, payload.len())
        .body(Body::from(payload))
        .unwrap();
    let response = do_request(app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    // The handler still sees the full body.
    let echoed = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&echoed[..], payload.as_bytes());

    let tx = &recorder.transactions()[0];
    let body = tx
        .context
        .as_ref()
        .and_then(|c| c.request.as_ref())
        .and_then(|r| r.body.as_ref())
        .unwrap();
    match body {
        RequestBody::Form(form) => {
            assert_eq!(form["foo"], vec!["bar".to_string(), "baz".to_string()]);
            assert_eq!(form["x"], vec!["1".to_string()]);
        }
        other => panic!("expected form body, got {other:?}"),
    }
}

#[tokio::test]
async fn test_body_not_captured_when_off() {
    let (tracer, recorder) = recording_tracer(CaptureBodyMode::Errors);
    let app = test_app(tracer);

    let request = test_request("POST", "/echo")
        .header(header::CONTENT_TYPE, "text/plain")
        .header(header::CONTENT_LENGTH, 5)
        .body(Body::from("hello"))
        .unwrap();
    do_request(app, request).await;

    let tx = &recorder.transactions()[0];
    let request = tx.context.as_ref().unwrap().request.as_ref().unwrap();
    assert!(request.body.is_none());
}

#[tokio::test]
async fn test_body_captured_for_errors_only() {
    let (tracer, recorder) = recording_tracer(CaptureBodyMode::Errors);
    let app = test_app(tracer);

    let request = test_request("POST", "/reject")
        .header(header::CONTENT_TYPE, "text/plain")
        .header(header::CONTENT_LENGTH, 7)
        .body(Body::from("payload"))
        .unwrap();
    let response = do_request(app, request).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let errors = recorder.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].culprit, "handle_reject");
    let error_request = errors[0]
        .context
        .as_ref()
        .and_then(|c| c.request.as_ref())
        .unwrap();
    assert_eq!(
        error_request.body,
        Some(RequestBody::Raw("payload".to_string()))
    );

    let tx = &recorder.transactions()[0];
    let tx_request = tx.context.as_ref().unwrap().request.as_ref().unwrap();
    assert!(tx_request.body.is_none());
}

#[tokio::test]
async fn test_forwarded_headers() {
    let (tracer, recorder) = recording_tracer(CaptureBodyMode::Off);
    let app = test_app(tracer);

    let request = axum::http::Request::builder()
        .uri("/hello/bar?x=1")
        .header(header::HOST, "internal:8080")
        .header("forwarded", "for=\"[2001:db8::1]:4711\";host=public.example;proto=https")
        .body(Body::empty())
        .unwrap();
    do_request(app, request).await;

    let tx = &recorder.transactions()[0];
    let request = tx.context.as_ref().unwrap().request.as_ref().unwrap();
    assert_eq!(request.url.full, "https://public.example/hello/bar?x=1");
    assert_eq!(request.url.search, "x=1");
    assert_eq!(request.socket.as_ref().unwrap().remote_address, "2001:db8::1");
}

#[tokio::test]
async fn test_basic_auth_username() {
    let (tracer, recorder) = recording_tracer(CaptureBodyMode::Off);
    let app = test_app(tracer);

    // "alice:secret"
    let request = test_request("GET", "/hello/foo")
        .header(header::AUTHORIZATION, "Basic YWxpY2U6c2VjcmV0")
        .body(Body::empty())
        .unwrap();
    do_request(app, request).await;

    let tx = &recorder.transactions()[0];
    let user = tx.context.as_ref().unwrap().user.as_ref().unwrap();
    assert_eq!(user.username, "alice");
}

#[tokio::test]
async fn test_pooled_contexts_do_not_leak_between_requests() {
    let (tracer, recorder) = recording_tracer(CaptureBodyMode::Off);
    let app = test_app(tracer);

    let request = test_request("GET", "/hello/foo")
        .header(header::AUTHORIZATION, "Basic YWxpY2U6c2VjcmV0")
        .body(Body::empty())
        .unwrap();
    do_request(app.clone(), request).await;

    let request = test_request("GET", "/hello/bar").body(Body::empty()).unwrap();
    do_request(app, request).await;

    let transactions = recorder.transactions();
    assert_eq!(transactions.len(), 2);
    let second = transactions[1].context.as_ref().unwrap();
    assert!(second.user.is_none());
    assert_eq!(second.request.as_ref().unwrap().url.path, "/hello/bar");
}
