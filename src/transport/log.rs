//! Transport that writes events to the log as JSON.

use crate::model::{ErrorEvent, TransactionEvent};
use crate::transport::Transport;

/// Emits each event as a JSON `info` log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

impl Transport for LogTransport {
    fn send_transaction(&self, event: &TransactionEvent<'_>) {
        match serde_json::to_string(event) {
            Ok(json) => tracing::info!(
                transaction_id = %event.id,
                name = event.name,
                result = event.result,
                payload = %json,
                "Transaction"
            ),
            Err(e) => tracing::warn!(transaction_id = %event.id, error = %e, "Failed to encode transaction"),
        }
    }

    fn send_error(&self, event: &ErrorEvent<'_>) {
        match serde_json::to_string(event) {
            Ok(json) => tracing::info!(
                error_id = %event.id,
                culprit = event.culprit,
                handled = event.exception.handled,
                payload = %json,
                "Error"
            ),
            Err(e) => tracing::warn!(error_id = %event.id, error = %e, "Failed to encode error"),
        }
    }
}
