//! Error reports.

use uuid::Uuid;

use crate::context::Context;
use crate::model::{ErrorEvent, Exception};
use crate::observability::metrics;
use crate::tracer::{Tracer, Transaction};

/// An application error or panic about to be reported.
pub struct ErrorReport {
    tracer: Tracer,
    id: Uuid,
    transaction_id: Option<Uuid>,
    exception: Exception,
    /// Function or route the error is attributed to.
    pub culprit: String,
    /// Request details at the time of the error.
    pub context: Context,
}

impl ErrorReport {
    pub(crate) fn new(tracer: Tracer, exception: Exception, context: Context) -> Self {
        Self {
            tracer,
            id: Uuid::new_v4(),
            transaction_id: None,
            exception,
            culprit: String::new(),
            context,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Attribute the error to the given in-flight transaction.
    pub fn set_transaction(&mut self, transaction: &Transaction) {
        self.transaction_id = Some(transaction.id());
    }

    pub fn exception(&self) -> &Exception {
        &self.exception
    }

    /// Send the error and return its context to the pool.
    pub fn send(self) {
        let ErrorReport {
            tracer,
            id,
            transaction_id,
            exception,
            culprit,
            context,
        } = self;

        let event = ErrorEvent {
            id,
            transaction_id,
            culprit: &culprit,
            exception: &exception,
            context: context.build(),
        };
        tracing::debug!(
            error_id = %id,
            transaction_id = ?transaction_id,
            culprit = %culprit,
            handled = exception.handled,
            "Error reported"
        );
        tracer.transport().send_error(&event);
        metrics::record_error(exception.handled);

        tracer.error_contexts().release(context);
    }
}

impl std::fmt::Debug for ErrorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorReport")
            .field("id", &self.id)
            .field("transaction_id", &self.transaction_id)
            .field("exception", &self.exception)
            .field("culprit", &self.culprit)
            .finish_non_exhaustive()
    }
}
