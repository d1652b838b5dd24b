//! Data handed to the transport layer.
//!
//! Absent fields are omitted from the serialized form, never written as
//! default values.

pub mod context;
pub mod event;

pub use context::{
    Context, ContextSnapshot, Cookie, Cookies, Framework, Request, RequestBody, RequestHeaders,
    RequestSocket, Response, ResponseHeaders, Service, Tags, Url, User,
};
pub use event::{ErrorEvent, Exception, TransactionEvent};
