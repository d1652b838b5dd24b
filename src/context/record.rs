//! The pooled per-request context record.

use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap, Method, Request, Uri, Version};

use crate::context::body::{BodyCapturer, CaptureBodyMode};
use crate::context::custom::{CustomContext, CustomValue};
use crate::context::truncate::{truncate_keyword, valid_tag_key, Limits};
use crate::http::forwarded::{remote_addr, ForwardedHeader};
use crate::http::request::{
    basic_auth_username, content_type, http_version, joined_cookie_header, parse_cookies,
    user_agent, ConnectionInfo,
};
use crate::http::url::{request_url, url_username, RequestTarget};
use crate::model::{
    ContextSnapshot, Framework, RequestHeaders, RequestSocket, Response, ResponseHeaders, Service,
    Tags, User,
};

/// Placeholder recorded when a framework is named without a version.
pub const UNSPECIFIED_VERSION: &str = "unspecified";

/// A sub-record together with whether it has been exposed.
///
/// Once marked present a sub-record stays present until the next reset,
/// even if later writes store empty values into it.
#[derive(Debug, Default)]
struct Tracked<T> {
    value: T,
    present: bool,
}

impl<T> Tracked<T> {
    fn get(&self) -> Option<&T> {
        self.present.then_some(&self.value)
    }

    fn mark_present(&mut self) {
        self.present = true;
    }
}

/// Transaction or error context, populated incrementally while a request is
/// in flight.
///
/// A `Context` is owned by exactly one request at a time. It is meant to be
/// recycled through a [`ContextPool`](crate::tracer::ContextPool): `reset`
/// restores every field except the body capture policy and limits.
#[derive(Debug, Default)]
pub struct Context {
    request: Tracked<crate::model::Request>,
    response: Tracked<Response>,
    user: Tracked<User>,
    service: Tracked<Service>,
    custom: CustomContext,
    tags: Tags,
    capture_body_mask: CaptureBodyMode,
    limits: Limits,
}

impl Context {
    /// Create an empty context with the given body capture mask and limits.
    pub fn new(capture_body_mask: CaptureBodyMode, limits: Limits) -> Self {
        Self {
            capture_body_mask,
            limits,
            ..Default::default()
        }
    }

    pub fn capture_body_mask(&self) -> CaptureBodyMode {
        self.capture_body_mask
    }

    /// The externally visible snapshot, or `None` if nothing was recorded.
    pub fn build(&self) -> Option<ContextSnapshot<'_>> {
        let any_present = self.request.present
            || self.response.present
            || self.user.present
            || self.service.present
            || !self.custom.is_empty()
            || !self.tags.is_empty();
        if !any_present {
            return None;
        }
        Some(ContextSnapshot {
            request: self.request.get(),
            response: self.response.get(),
            user: self.user.get(),
            service: self.service.get(),
            custom: (!self.custom.is_empty()).then_some(&self.custom),
            tags: (!self.tags.is_empty()).then_some(&self.tags),
        })
    }

    /// Clear all recorded data, keeping policy and reusable allocations.
    pub fn reset(&mut self) {
        let mut custom = std::mem::take(&mut self.custom);
        custom.clear();
        let mut tags = std::mem::take(&mut self.tags);
        tags.clear();
        *self = Context {
            custom,
            tags,
            capture_body_mask: self.capture_body_mask,
            limits: self.limits,
            ..Default::default()
        };
    }

    /// Set a custom key/value pair. Keys containing `.`, `*`, or `"` are
    /// silently ignored.
    pub fn set_custom(&mut self, key: &str, value: impl Into<CustomValue>) {
        if !valid_tag_key(key) {
            tracing::trace!(key, "ignoring invalid custom context key");
            return;
        }
        self.custom.set(key, value.into());
    }

    /// Set a tag. Keys containing `.`, `*`, or `"` are silently ignored.
    pub fn set_tag(&mut self, key: &str, value: &str) {
        if !valid_tag_key(key) {
            tracing::trace!(key, "ignoring invalid tag key");
            return;
        }
        self.tags
            .insert(key.to_string(), truncate_keyword(value).to_string());
    }

    /// Record the instrumented service. Nothing is recorded when both values
    /// are empty.
    pub fn set_service(&mut self, name: &str, environment: &str) {
        let service = &mut self.service.value;
        service.name = truncate_keyword(name).to_string();
        service.environment = truncate_keyword(environment).to_string();
        if !service.name.is_empty() || !service.environment.is_empty() {
            self.service.mark_present();
        }
    }

    /// Record the web framework. An empty name is a no-op; an empty version
    /// is recorded as [`UNSPECIFIED_VERSION`].
    pub fn set_framework(&mut self, name: &str, version: &str) {
        if name.is_empty() {
            return;
        }
        let version = if version.is_empty() {
            UNSPECIFIED_VERSION
        } else {
            version
        };
        self.service.value.framework = Some(Framework {
            name: truncate_keyword(name).to_string(),
            version: truncate_keyword(version).to_string(),
        });
        self.service.mark_present();
    }

    /// Record the details of a server-side HTTP request.
    ///
    /// Proxy headers are taken into account when reconstructing the URL and
    /// the client address. User info in the request URL is never part of the
    /// recorded full URL. The username comes from HTTP Basic credentials if
    /// present, otherwise from the URL's user info.
    pub fn set_http_request<B>(&mut self, req: &Request<B>) {
        self.capture_request(
            req.method(),
            req.uri(),
            req.version(),
            req.headers(),
            req.extensions(),
        );
    }

    /// Like [`set_http_request`](Self::set_http_request), for a request already split into parts.
    pub fn set_http_request_parts(&mut self, parts: &Parts) {
        self.capture_request(
            &parts.method,
            &parts.uri,
            parts.version,
            &parts.headers,
            &parts.extensions,
        );
    }

    fn capture_request(
        &mut self,
        method: &Method,
        uri: &Uri,
        version: Version,
        headers: &HeaderMap,
        extensions: &Extensions,
    ) {
        let connection = ConnectionInfo::from_extensions(extensions);
        let forwarded = ForwardedHeader::from_headers(headers);
        let target = RequestTarget {
            uri,
            version,
            headers,
            tls: connection.tls,
        };

        let body = self.request.value.body.take();
        let request = &mut self.request.value;
        *request = crate::model::Request {
            url: request_url(target, forwarded.as_ref()),
            method: truncate_keyword(method.as_str()).to_string(),
            http_version: http_version(version).to_string(),
            cookies: parse_cookies(headers),
            headers: None,
            socket: None,
            body,
        };

        let request_headers = RequestHeaders {
            content_type: content_type(headers).to_string(),
            cookie: self
                .limits
                .truncate_text(&joined_cookie_header(headers))
                .to_string(),
            user_agent: user_agent(headers).to_string(),
        };
        if !request_headers.is_empty() {
            request.headers = Some(request_headers);
        }

        let socket = RequestSocket {
            encrypted: connection.tls,
            remote_address: remote_addr(
                headers,
                forwarded.as_ref(),
                connection.peer_addr.as_deref(),
            ),
        };
        if !socket.is_empty() {
            request.socket = Some(socket);
        }
        self.request.mark_present();

        let username = basic_auth_username(headers)
            .or_else(|| url_username(uri))
            .unwrap_or_default();
        self.set_username(&username);
    }

    /// Attach a captured request body, if the capturer's mode matches this
    /// context's capture mask.
    pub fn set_http_request_body(&mut self, capturer: Option<&BodyCapturer>) {
        let Some(capturer) = capturer else {
            return;
        };
        if !capturer.mode().intersects(self.capture_body_mask) {
            return;
        }
        if let Some(body) = capturer.to_request_body(&self.limits) {
            self.request.value.body = Some(body);
        }
    }

    /// Record the response headers of interest (currently Content-Type).
    pub fn set_http_response_headers(&mut self, headers: &HeaderMap) {
        let content_type = content_type(headers);
        let response = &mut self.response;
        match response.value.headers.as_mut() {
            Some(existing) => existing.content_type = content_type.to_string(),
            None if !content_type.is_empty() => {
                response.value.headers = Some(ResponseHeaders {
                    content_type: content_type.to_string(),
                });
                response.mark_present();
            }
            None => {}
        }
    }

    /// Record the response status code.
    pub fn set_http_status_code(&mut self, status_code: u16) {
        self.response.value.status_code = status_code;
        self.response.mark_present();
    }

    /// Set the ID of the authenticated user.
    pub fn set_user_id(&mut self, id: &str) {
        self.user.value.id = truncate_keyword(id).to_string();
        if !self.user.value.id.is_empty() {
            self.user.mark_present();
        }
    }

    /// Set the email of the authenticated user.
    pub fn set_user_email(&mut self, email: &str) {
        self.user.value.email = truncate_keyword(email).to_string();
        if !self.user.value.email.is_empty() {
            self.user.mark_present();
        }
    }

    /// Set the username of the authenticated user.
    pub fn set_username(&mut self, username: &str) {
        self.user.value.username = truncate_keyword(username).to_string();
        if !self.user.value.username.is_empty() {
            self.user.mark_present();
        }
    }
}
