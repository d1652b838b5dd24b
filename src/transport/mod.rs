//! Delivery of finished events.
//!
//! # Responsibilities
//! - Define the seam between the tracer and whatever ships events
//! - Provide a recording transport for tests and a logging transport for
//!   local runs
//!
//! # Design Decisions
//! - Events borrow pooled contexts; a transport that keeps them must copy
//! - Sending is infallible from the tracer's point of view; delivery
//!   failures are the transport's own concern

pub mod log;
pub mod recorder;

use crate::model::{ErrorEvent, TransactionEvent};

pub use log::LogTransport;
pub use recorder::{RecordedError, RecordedTransaction, RecorderTransport};

/// Receives finished transactions and errors.
pub trait Transport: Send + Sync {
    fn send_transaction(&self, event: &TransactionEvent<'_>);

    fn send_error(&self, event: &ErrorEvent<'_>);
}
