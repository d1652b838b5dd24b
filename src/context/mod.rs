//! Transaction and error context capture.
//!
//! # Data Flow
//! ```text
//! ContextPool::acquire
//!     → Context mutators (set_http_request, set_tag, set_user_id, ...)
//!     → Context::build (snapshot of present sub-records, or None)
//!     → Transport
//!     → ContextPool::release (reset, allocations kept)
//! ```
//!
//! # Design Decisions
//! - Capture never fails: oversized values are truncated, invalid keys dropped
//! - Sub-records become visible on their first non-empty write and stay visible
//! - A context belongs to one request at a time; it holds no locks

pub mod body;
pub mod custom;
pub mod record;
pub mod truncate;

pub use body::{BodyCapturer, CaptureBodyMode};
pub use custom::{AppendJson, CustomContext, CustomValue};
pub use record::{Context, UNSPECIFIED_VERSION};
pub use truncate::{truncate_keyword, valid_tag_key, Limits, KEYWORD_MAX_LEN};
