//! Errors returned by handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Marker left in response extensions for the middleware to report as a
/// handled error.
///
/// [`HandlerError`] inserts it; applications with their own error types may
/// insert it in their `IntoResponse` implementations as well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedError {
    pub message: String,
    pub kind: Option<String>,
}

/// Error type for instrumented handlers.
///
/// Converts from any `std::error::Error`, renders as a plain-text response
/// (500 unless another status is given), and is reported as a handled error.
#[derive(Debug)]
pub struct HandlerError {
    status: StatusCode,
    message: String,
    kind: Option<String>,
}

impl HandlerError {
    /// An internal server error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            kind: None,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl<E> From<E> for HandlerError
where
    E: std::error::Error,
{
    fn from(err: E) -> Self {
        let kind = std::any::type_name::<E>();
        Self {
            kind: Some(kind.rsplit("::").next().unwrap_or(kind).to_string()),
            ..Self::new(err.to_string())
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.message.clone()).into_response();
        response.extensions_mut().insert(CapturedError {
            message: self.message,
            kind: self.kind,
        });
        response
    }
}
