//! Minimal in-process tracer.
//!
//! # Responsibilities
//! - Start and end transactions
//! - Create error reports, optionally tied to a transaction
//! - Own the context pools and the body capture policy
//! - Hand finished events to the configured [`Transport`]
//!
//! # Design Decisions
//! - Transaction and error contexts come from separate pools, each with its
//!   own body capture mask
//! - Sampling, queueing, and flushing belong to the transport

pub mod error;
pub mod pool;
pub mod transaction;

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{header, Request};

use crate::config::AgentConfig;
use crate::context::{BodyCapturer, CaptureBodyMode, Context, Limits};
use crate::http::request::content_type;
use crate::model::Exception;
use crate::transport::Transport;

pub use error::ErrorReport;
pub use pool::ContextPool;
pub use transaction::Transaction;

/// Handle to the tracer. Cheap to clone.
#[derive(Clone)]
pub struct Tracer {
    inner: Arc<TracerInner>,
}

struct TracerInner {
    service_name: String,
    environment: String,
    capture_body: CaptureBodyMode,
    max_body_bytes: usize,
    transaction_contexts: ContextPool,
    error_contexts: ContextPool,
    transport: Arc<dyn Transport>,
}

impl Tracer {
    /// Create a tracer from validated configuration.
    pub fn new(config: &AgentConfig, transport: Arc<dyn Transport>) -> Self {
        let limits = Limits::new(config.limits.text_max_len);
        let max_idle = config.pool.max_idle;
        Self {
            inner: Arc::new(TracerInner {
                service_name: config.service.name.clone(),
                environment: config.service.environment.clone().unwrap_or_default(),
                capture_body: config.capture_body,
                max_body_bytes: config.limits.max_body_bytes,
                transaction_contexts: ContextPool::new(
                    "transaction",
                    CaptureBodyMode::Transactions,
                    limits,
                    max_idle,
                ),
                error_contexts: ContextPool::new("error", CaptureBodyMode::Errors, limits, max_idle),
                transport,
            }),
        }
    }

    /// Create a tracer with default configuration.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self::new(&AgentConfig::default(), transport)
    }

    pub fn service_name(&self) -> &str {
        &self.inner.service_name
    }

    pub fn environment(&self) -> &str {
        &self.inner.environment
    }

    pub fn capture_body(&self) -> CaptureBodyMode {
        self.inner.capture_body
    }

    /// Start a transaction with the given name and type.
    pub fn start_transaction(&self, name: impl Into<String>, kind: impl Into<String>) -> Transaction {
        let context = self.acquire_context(&self.inner.transaction_contexts);
        Transaction::new(self.clone(), name.into(), kind.into(), context)
    }

    /// Create an error report. It is delivered when [`ErrorReport::send`] is called.
    pub fn new_error(&self, exception: Exception) -> ErrorReport {
        let context = self.acquire_context(&self.inner.error_contexts);
        ErrorReport::new(self.clone(), exception, context)
    }

    fn acquire_context(&self, pool: &ContextPool) -> Context {
        let mut context = pool.acquire();
        context.set_service(&self.inner.service_name, &self.inner.environment);
        context
    }

    /// Buffer the request body for capture when the policy allows it.
    ///
    /// Only bodies with a declared `Content-Length` within the configured limit
    /// are buffered; others pass through untouched. The returned request
    /// carries the same body bytes.
    pub async fn capture_http_request_body(
        &self,
        request: Request<Body>,
    ) -> (Request<Body>, Option<BodyCapturer>) {
        if self.inner.capture_body == CaptureBodyMode::Off {
            return (request, None);
        }
        let declared_len = request
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        match declared_len {
            Some(len) if len <= self.inner.max_body_bytes => {}
            _ => return (request, None),
        }

        let (parts, body) = request.into_parts();
        let content_type = content_type(&parts.headers).to_string();
        match axum::body::to_bytes(body, self.inner.max_body_bytes).await {
            Ok(bytes) => {
                let capturer =
                    BodyCapturer::new(self.inner.capture_body, content_type, bytes.to_vec());
                (Request::from_parts(parts, Body::from(bytes)), Some(capturer))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to buffer request body for capture");
                // The handler sees the same failure it would have read itself.
                let failed = futures_util::stream::once(async move { Err::<Bytes, _>(e) });
                (Request::from_parts(parts, Body::from_stream(failed)), None)
            }
        }
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.inner.transport.as_ref()
    }

    pub(crate) fn transaction_contexts(&self) -> &ContextPool {
        &self.inner.transaction_contexts
    }

    pub(crate) fn error_contexts(&self) -> &ContextPool {
        &self.inner.error_contexts
    }
}

impl std::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracer")
            .field("service_name", &self.inner.service_name)
            .field("environment", &self.inner.environment)
            .field("capture_body", &self.inner.capture_body)
            .finish_non_exhaustive()
    }
}

/// Result label for an HTTP status code, e.g. "HTTP 4xx".
pub fn status_code_result(status_code: u16) -> String {
    match status_code / 100 {
        class @ 1..=5 => format!("HTTP {class}xx"),
        _ => format!("HTTP {status_code}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RecorderTransport;

    fn tracer_with(capture_body: CaptureBodyMode) -> (Tracer, Arc<RecorderTransport>) {
        let transport = Arc::new(RecorderTransport::new());
        let config = AgentConfig {
            capture_body,
            ..Default::default()
        };
        (Tracer::new(&config, transport.clone()), transport)
    }

    #[test]
    fn test_status_code_result() {
        assert_eq!(status_code_result(200), "HTTP 2xx");
        assert_eq!(status_code_result(418), "HTTP 4xx");
        assert_eq!(status_code_result(503), "HTTP 5xx");
        assert_eq!(status_code_result(0), "HTTP 0");
    }

    #[tokio::test]
    async fn test_body_capture_off_passes_through() {
        let (tracer, _) = tracer_with(CaptureBodyMode::Off);
        let req = Request::builder()
            .header(header::CONTENT_LENGTH, "2")
            .body(Body::from("hi"))
            .unwrap();
        let (_req, capturer) = tracer.capture_http_request_body(req).await;
        assert!(capturer.is_none());
    }

    #[tokio::test]
    async fn test_body_capture_keeps_body() {
        let (tracer, _) = tracer_with(CaptureBodyMode::All);
        let req = Request::builder()
            .header(header::CONTENT_LENGTH, "5")
            .body(Body::from("hello"))
            .unwrap();
        let (req, capturer) = tracer.capture_http_request_body(req).await;
        assert_eq!(capturer.unwrap().mode(), CaptureBodyMode::All);

        let bytes = axum::body::to_bytes(req.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"hello");
    }

    #[tokio::test]
    async fn test_body_read_failure_reaches_handler() {
        let (tracer, _) = tracer_with(CaptureBodyMode::All);
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"hel")),
            Err(std::io::ErrorKind::ConnectionReset.into()),
        ];
        let req = Request::builder()
            .header(header::CONTENT_LENGTH, "5")
            .body(Body::from_stream(futures_util::stream::iter(chunks)))
            .unwrap();
        let (req, capturer) = tracer.capture_http_request_body(req).await;
        assert!(capturer.is_none());

        let downstream = axum::body::to_bytes(req.into_body(), usize::MAX).await;
        assert!(downstream.is_err());
    }

    #[test]
    fn test_contexts_carry_service() {
        let transport = Arc::new(RecorderTransport::new());
        let mut config = AgentConfig::default();
        config.service.name = "checkout".into();
        config.service.environment = Some("staging".into());
        let tracer = Tracer::new(&config, transport.clone());
        assert_eq!(tracer.service_name(), "checkout");
        assert_eq!(tracer.environment(), "staging");

        tracer.start_transaction("GET /", "request").end();
        tracer
            .new_error(Exception {
                message: "wot".into(),
                kind: None,
                handled: true,
            })
            .send();

        let tx_context = transport.transactions()[0].context.clone().unwrap();
        let service = tx_context.service.unwrap();
        assert_eq!(service.name, "checkout");
        assert_eq!(service.environment, "staging");
        assert!(service.framework.is_none());
        let error_context = transport.errors()[0].context.clone().unwrap();
        assert_eq!(error_context.service.unwrap().name, "checkout");
    }

    #[tokio::test]
    async fn test_body_capture_skips_undeclared_length() {
        let (tracer, _) = tracer_with(CaptureBodyMode::All);
        let req = Request::builder().body(Body::from("hello")).unwrap();
        let (req, capturer) = tracer.capture_http_request_body(req).await;
        assert!(capturer.is_none());

        let bytes = axum::body::to_bytes(req.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"hello");
    }
}
