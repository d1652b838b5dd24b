//! Transactions.

use std::time::Instant;

use uuid::Uuid;

use crate::context::Context;
use crate::model::TransactionEvent;
use crate::observability::metrics;
use crate::tracer::Tracer;

/// A unit of work being traced, typically one inbound request.
///
/// The transaction owns a pooled [`Context`] until [`end`](Self::end) hands
/// the finished event to the transport and returns the context to the pool.
pub struct Transaction {
    tracer: Tracer,
    id: Uuid,
    name: String,
    kind: String,
    result: String,
    started: Instant,
    /// Request, response, and user details for this transaction.
    pub context: Context,
}

impl Transaction {
    pub(crate) fn new(tracer: Tracer, name: String, kind: String, context: Context) -> Self {
        Self {
            tracer,
            id: Uuid::new_v4(),
            name,
            kind,
            result: String::new(),
            started: Instant::now(),
            context,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_result(&mut self, result: impl Into<String>) {
        self.result = result.into();
    }

    /// Finish the transaction and send it.
    pub fn end(self) {
        let Transaction {
            tracer,
            id,
            name,
            kind,
            result,
            started,
            context,
        } = self;

        let event = TransactionEvent {
            id,
            name: &name,
            kind: &kind,
            result: &result,
            duration_ms: started.elapsed().as_secs_f64() * 1000.0,
            context: context.build(),
        };
        tracing::debug!(
            transaction_id = %id,
            name = %name,
            result = %result,
            duration_ms = event.duration_ms,
            "Transaction ended"
        );
        tracer.transport().send_transaction(&event);
        metrics::record_transaction(&kind, &result);

        tracer.transaction_contexts().release(context);
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
