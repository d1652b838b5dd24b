//! axum instrumentation.
//!
//! # Responsibilities
//! - Start a transaction per request, named "<METHOD> <route pattern>"
//! - Capture request, response, and framework details into its context
//! - Report handler errors (handled) and panics (unhandled)
//! - End the transaction once the response is produced
//!
//! # Design Decisions
//! - Install with `Router::layer` so `MatchedPath` is visible
//! - The handler future runs under `catch_unwind` in the same task; a panic is
//!   reported and answered with 500, never resumed
//! - Error contexts are populated from a copy of the request head taken
//!   before the handler consumes the request
//!
//! ```ignore
//! let app = Router::new()
//!     .route("/hello/{name}", get(traced(handle_hello)))
//!     .layer(axum::middleware::from_fn_with_state(tracer, apm_middleware));
//! ```

pub mod error;
pub mod handler;

use std::any::Any;
use std::panic::AssertUnwindSafe;

use axum::extract::{MatchedPath, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use futures_util::FutureExt;

use crate::context::{BodyCapturer, Context};
use crate::http::ConnectionInfo;
use crate::model::Exception;
use crate::tracer::{status_code_result, Tracer, Transaction};

pub use error::{CapturedError, HandlerError};
pub use handler::{traced, CulpritSlot, Traced};

pub const FRAMEWORK_NAME: &str = "axum";
pub const FRAMEWORK_VERSION: &str = "0.8";

const TRANSACTION_TYPE: &str = "request";

/// Trace every request passing through the router.
pub async fn apm_middleware(
    State(tracer): State<Tracer>,
    request: Request,
    next: Next,
) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string());
    let name = match &route {
        Some(route) => format!("{} {}", request.method(), route),
        None => format!("{} unknown route", request.method()),
    };

    let mut tx = tracer.start_transaction(name, TRANSACTION_TYPE);
    let (mut request, body) = tracer.capture_http_request_body(request).await;
    tx.context.set_framework(FRAMEWORK_NAME, FRAMEWORK_VERSION);
    tx.context.set_http_request(&request);
    tx.context.set_http_request_body(body.as_ref());

    let head = request_head(&request);
    let culprit = CulpritSlot::default();
    request.extensions_mut().insert(culprit.clone());

    let (response, failure) = match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => {
            let failure = response
                .extensions()
                .get::<CapturedError>()
                .map(|captured| Exception {
                    message: captured.message.clone(),
                    kind: captured.kind.clone(),
                    handled: true,
                });
            (response, failure)
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(
                transaction_id = %tx.id(),
                panic = %message,
                "Handler panicked"
            );
            let exception = Exception {
                message,
                kind: None,
                handled: false,
            };
            (StatusCode::INTERNAL_SERVER_ERROR.into_response(), Some(exception))
        }
    };

    if let Some(exception) = failure {
        let culprit = culprit
            .get()
            .map(str::to_string)
            .or(route)
            .unwrap_or_default();
        report_error(&tracer, &tx, exception, culprit, &head, &response, body.as_ref());
    }

    let status = response.status().as_u16();
    tx.context.set_http_status_code(status);
    tx.context.set_http_response_headers(response.headers());
    tx.set_result(status_code_result(status));
    tx.end();

    response
}

fn report_error(
    tracer: &Tracer,
    tx: &Transaction,
    exception: Exception,
    culprit: String,
    head: &Request<()>,
    response: &Response,
    body: Option<&BodyCapturer>,
) {
    let mut report = tracer.new_error(exception);
    report.set_transaction(tx);
    report.culprit = culprit;
    fill_error_context(&mut report.context, head, response, body);
    report.send();
}

fn fill_error_context(
    ctx: &mut Context,
    head: &Request<()>,
    response: &Response,
    body: Option<&BodyCapturer>,
) {
    ctx.set_framework(FRAMEWORK_NAME, FRAMEWORK_VERSION);
    ctx.set_http_request(head);
    ctx.set_http_request_body(body);
    ctx.set_http_status_code(response.status().as_u16());
    ctx.set_http_response_headers(response.headers());
}

/// Copy of everything context capture reads from a request, minus the body.
fn request_head(request: &Request) -> Request<()> {
    let mut head = axum::http::Request::new(());
    *head.method_mut() = request.method().clone();
    *head.uri_mut() = request.uri().clone();
    *head.version_mut() = request.version();
    *head.headers_mut() = request.headers().clone();
    head.extensions_mut()
        .insert(ConnectionInfo::from_extensions(request.extensions()));
    head
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic".to_string()
    }
}
