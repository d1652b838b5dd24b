//! HTTP request decoding for context capture.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → forwarded.rs (Forwarded header, client address)
//!     → url.rs (canonical URL, credentials stripped)
//!     → request.rs (version, basic auth, cookies, connection info)
//!     → Context::set_http_request
//! ```

pub mod forwarded;
pub mod request;
pub mod url;

pub use forwarded::{parse_forwarded, remote_addr, ForwardedHeader};
pub use request::ConnectionInfo;
pub use url::{request_url, RequestTarget};
