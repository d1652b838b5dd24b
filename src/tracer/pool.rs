//! Context pool management.
//!
//! # Responsibilities
//! - Hand out reset contexts to in-flight transactions and errors
//! - Take contexts back, reset them, and keep a bounded number idle
//!
//! # Design Decisions
//! - The pool lock is held only for the push/pop hand-off
//! - Reset happens on both acquire and release, so a context is clean no
//!   matter how it was left
//! - Contexts beyond `max_idle` are dropped on release

use parking_lot::Mutex;

use crate::context::{CaptureBodyMode, Context, Limits};
use crate::observability::metrics;

/// A pool of reusable [`Context`] records sharing one body capture mask.
#[derive(Debug)]
pub struct ContextPool {
    name: &'static str,
    idle: Mutex<Vec<Context>>,
    capture_body_mask: CaptureBodyMode,
    limits: Limits,
    max_idle: usize,
}

impl ContextPool {
    /// Create an empty pool.
    pub fn new(
        name: &'static str,
        capture_body_mask: CaptureBodyMode,
        limits: Limits,
        max_idle: usize,
    ) -> Self {
        Self {
            name,
            idle: Mutex::new(Vec::with_capacity(max_idle)),
            capture_body_mask,
            limits,
            max_idle,
        }
    }

    /// Take an idle context, or create one if the pool is empty.
    pub fn acquire(&self) -> Context {
        let (recycled, idle) = {
            let mut idle = self.idle.lock();
            (idle.pop(), idle.len())
        };
        metrics::record_pool_idle(self.name, idle);

        match recycled {
            Some(mut ctx) => {
                ctx.reset();
                ctx
            }
            None => {
                tracing::trace!(pool = self.name, "Allocating new context");
                Context::new(self.capture_body_mask, self.limits)
            }
        }
    }

    /// Return a context to the pool.
    pub fn release(&self, mut ctx: Context) {
        ctx.reset();
        let idle = {
            let mut idle = self.idle.lock();
            if idle.len() < self.max_idle {
                idle.push(ctx);
            }
            idle.len()
        };
        metrics::record_pool_idle(self.name, idle);
    }

    /// Number of contexts currently idle.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    pub fn capture_body_mask(&self) -> CaptureBodyMode {
        self.capture_body_mask
    }
}
