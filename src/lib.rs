//! APM agent: request context capture and axum instrumentation.

pub mod config;
pub mod context;
pub mod http;
pub mod middleware;
pub mod model;
pub mod observability;
pub mod tracer;
pub mod transport;

pub use config::AgentConfig;
pub use context::Context;
pub use middleware::{apm_middleware, traced, HandlerError};
pub use tracer::{Tracer, Transaction};
pub use transport::Transport;
