//! Handler wrapper that names the culprit of errors and panics.
//!
//! Rust has no runtime function names, so handlers that should be named in
//! error reports are wrapped with [`traced`]. The wrapper writes its handler's
//! name into a [`CulpritSlot`] the middleware placed in request extensions,
//! before the handler runs, so the name is available even if it panics.

use std::any::type_name;
use std::sync::Arc;

use axum::extract::Request;
use axum::handler::Handler;
use parking_lot::Mutex;

/// Shared slot receiving the name of the handler serving a request.
#[derive(Debug, Clone, Default)]
pub struct CulpritSlot(Arc<Mutex<Option<&'static str>>>);

impl CulpritSlot {
    pub fn set(&self, name: &'static str) {
        *self.0.lock() = Some(name);
    }

    pub fn get(&self) -> Option<&'static str> {
        *self.0.lock()
    }
}

/// A handler that records its own name as culprit.
#[derive(Debug, Clone)]
pub struct Traced<H> {
    handler: H,
    name: &'static str,
}

impl<H> Traced<H> {
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Wrap `handler` so that errors and panics it produces are attributed to it.
///
/// ```ignore
/// Router::new().route("/hello/{name}", get(traced(handle_hello)))
/// ```
pub fn traced<H>(handler: H) -> Traced<H> {
    Traced {
        handler,
        name: short_name(type_name::<H>()),
    }
}

impl<H, T, S> Handler<T, S> for Traced<H>
where
    H: Handler<T, S>,
{
    type Future = H::Future;

    fn call(self, req: Request, state: S) -> Self::Future {
        if let Some(slot) = req.extensions().get::<CulpritSlot>() {
            slot.set(self.name);
        }
        self.handler.call(req, state)
    }
}

/// Last path segment of a type name, ignoring generic arguments.
fn short_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
