//! Context record types as they appear on the wire.
//!
//! Optional sub-records are `Option`s and are omitted from the serialized form
//! when absent. String fields that are empty are omitted as well.

use std::collections::{BTreeMap, HashMap};

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::context::custom::CustomContext;

/// Free-form string tags attached to a context.
pub type Tags = HashMap<String, String>;

/// Owned copy of a built context, for consumers that outlive the pooled record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Context {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<Request>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Response>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<Service>,
    #[serde(skip_serializing_if = "CustomContext::is_empty")]
    pub custom: CustomContext,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub tags: Tags,
}

/// Borrowed view of a pooled context record, produced by `Context::build`.
///
/// Only the sub-records that are present are populated.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ContextSnapshot<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<&'a Request>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<&'a Response>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<&'a User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<&'a Service>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<&'a CustomContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<&'a Tags>,
}

impl ContextSnapshot<'_> {
    /// Copy the snapshot out of the pooled record.
    pub fn to_owned_context(&self) -> Context {
        Context {
            request: self.request.cloned(),
            response: self.response.cloned(),
            user: self.user.cloned(),
            service: self.service.cloned(),
            custom: self.custom.cloned().unwrap_or_default(),
            tags: self.tags.cloned().unwrap_or_default(),
        }
    }
}

/// Details of the inbound HTTP request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Request {
    pub url: Url,
    pub method: String,
    pub http_version: String,
    #[serde(skip_serializing_if = "Cookies::is_empty")]
    pub cookies: Cookies,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<RequestHeaders>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socket: Option<RequestSocket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<RequestBody>,
}

/// Reconstructed request URL. `full` never carries user info.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Url {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub full: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub protocol: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub hostname: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub port: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub search: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestHeaders {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cookie: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user_agent: String,
}

impl RequestHeaders {
    pub fn is_empty(&self) -> bool {
        self.content_type.is_empty() && self.cookie.is_empty() && self.user_agent.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestSocket {
    pub encrypted: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub remote_address: String,
}

impl RequestSocket {
    pub fn is_empty(&self) -> bool {
        !self.encrypted && self.remote_address.is_empty()
    }
}

/// A single request cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

/// Request cookies, serialized as a `name -> value` object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookies(pub Vec<Cookie>);

impl Cookies {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }
}

impl Serialize for Cookies {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for cookie in &self.0 {
            map.serialize_entry(&cookie.name, &cookie.value)?;
        }
        map.end()
    }
}

/// Captured request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RequestBody {
    /// Body as (possibly truncated) text.
    Raw(String),
    /// URL-encoded form fields.
    Form(BTreeMap<String, Vec<String>>),
}

/// Details of the outbound HTTP response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Response {
    #[serde(skip_serializing_if = "is_zero")]
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<ResponseHeaders>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResponseHeaders {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content_type: String,
}

/// The authenticated user, as far as the agent can tell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct User {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
}

/// The instrumented service and the framework serving the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Service {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub environment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<Framework>,
}

/// The web framework the context was captured in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Framework {
    pub name: String,
    pub version: String,
}

fn is_zero(v: &u16) -> bool {
    *v == 0
}
