//! In-memory transport that records everything it is sent.

use parking_lot::Mutex;
use uuid::Uuid;

use crate::model::{Context, ErrorEvent, Exception, TransactionEvent};
use crate::transport::Transport;

/// Owned copy of a sent transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedTransaction {
    pub id: Uuid,
    pub name: String,
    pub kind: String,
    pub result: String,
    pub context: Option<Context>,
}

/// Owned copy of a sent error.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedError {
    pub id: Uuid,
    pub transaction_id: Option<Uuid>,
    pub culprit: String,
    pub exception: Exception,
    pub context: Option<Context>,
}

/// Keeps every event in memory, in the order received.
#[derive(Debug, Default)]
pub struct RecorderTransport {
    transactions: Mutex<Vec<RecordedTransaction>>,
    errors: Mutex<Vec<RecordedError>>,
}

impl RecorderTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transactions(&self) -> Vec<RecordedTransaction> {
        self.transactions.lock().clone()
    }

    pub fn errors(&self) -> Vec<RecordedError> {
        self.errors.lock().clone()
    }
}

impl Transport for RecorderTransport {
    fn send_transaction(&self, event: &TransactionEvent<'_>) {
        let recorded = RecordedTransaction {
            id: event.id,
            name: event.name.to_string(),
            kind: event.kind.to_string(),
            result: event.result.to_string(),
            context: event.context.map(|c| c.to_owned_context()),
        };
        self.transactions.lock().push(recorded);
    }

    fn send_error(&self, event: &ErrorEvent<'_>) {
        let recorded = RecordedError {
            id: event.id,
            transaction_id: event.transaction_id,
            culprit: event.culprit.to_string(),
            exception: event.exception.clone(),
            context: event.context.map(|c| c.to_owned_context()),
        };
        self.errors.lock().push(recorded);
    }
}
