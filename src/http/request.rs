//! Request field extraction.
//!
//! # Responsibilities
//! - Format the HTTP version
//! - Decode HTTP Basic credentials (username only)
//! - Parse and join `Cookie` headers
//! - Carry connection details (peer address, TLS) through request extensions
//!
//! # Design Decisions
//! - Malformed credentials and cookies are ignored rather than reported
//! - Connection details come from [`ConnectionInfo`] when the server inserts
//!   one, otherwise from axum's `ConnectInfo<SocketAddr>`

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{header, Extensions, HeaderMap, Version};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::model::{Cookie, Cookies};

/// Connection-level details of an inbound request.
///
/// Servers that terminate TLS themselves insert this into request extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Peer address as seen on the socket, e.g. "10.0.0.1:5555".
    pub peer_addr: Option<String>,
    pub tls: bool,
}

impl ConnectionInfo {
    /// Connection details recorded in `extensions`, if any.
    pub fn from_extensions(extensions: &Extensions) -> Self {
        if let Some(info) = extensions.get::<ConnectionInfo>() {
            return info.clone();
        }
        let peer_addr = extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string());
        Self {
            peer_addr,
            tls: false,
        }
    }
}

/// Version string for the request line; the common versions avoid formatting.
pub fn http_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_11 => "1.1",
        Version::HTTP_2 => "2.0",
        Version::HTTP_10 => "1.0",
        Version::HTTP_09 => "0.9",
        Version::HTTP_3 => "3.0",
        _ => "",
    }
}

/// Username from an `Authorization: Basic` header, if well-formed.
pub fn basic_auth_username(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (username, _password) = credentials.split_once(':')?;
    Some(username.to_string())
}

/// All `Cookie` header values joined with `;`.
pub fn joined_cookie_header(headers: &HeaderMap) -> String {
    let mut joined = String::new();
    for value in headers.get_all(header::COOKIE) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        if !joined.is_empty() {
            joined.push(';');
        }
        joined.push_str(value);
    }
    joined
}

/// Parse every `Cookie` header into name/value pairs, skipping invalid ones.
pub fn parse_cookies(headers: &HeaderMap) -> Cookies {
    let mut cookies = Vec::new();
    for value in headers.get_all(header::COOKIE) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        for part in value.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (name, value) = part.split_once('=').unwrap_or((part, ""));
            if !valid_cookie_name(name) {
                continue;
            }
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            cookies.push(Cookie {
                name: name.to_string(),
                value: value.to_string(),
            });
        }
    }
    Cookies(cookies)
}

fn valid_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_graphic()
                && !matches!(
                    b,
                    b'(' | b')' | b'<' | b'>' | b'@' | b',' | b';' | b':' | b'\\' | b'"'
                        | b'/' | b'[' | b']' | b'?' | b'=' | b'{' | b'}'
                )
        })
}

/// The `User-Agent` header, or empty.
pub fn user_agent(headers: &HeaderMap) -> &str {
    header_or_empty(headers, header::USER_AGENT)
}

/// The `Content-Type` header, or empty.
pub fn content_type(headers: &HeaderMap) -> &str {
    header_or_empty(headers, header::CONTENT_TYPE)
}

fn header_or_empty(headers: &HeaderMap, name: header::HeaderName) -> &str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
