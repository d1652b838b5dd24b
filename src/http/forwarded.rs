//! Proxy forwarding headers.
//!
//! # Responsibilities
//! - Parse the `Forwarded` header (RFC 7239)
//! - Resolve the originating client address behind proxies
//!
//! # Design Decisions
//! - Only the first hop is considered; it is the one closest to the client
//! - Malformed fields are skipped, never reported
//! - Without a `Forwarded: for=` the de-facto headers `X-Real-Ip` and
//!   `X-Forwarded-For` are consulted before the socket peer address

use axum::http::HeaderMap;

pub const FORWARDED: &str = "forwarded";
pub const X_REAL_IP: &str = "x-real-ip";
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Fields recovered from the first hop of a `Forwarded` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardedHeader {
    pub for_: String,
    pub host: String,
    /// Lowercased protocol, e.g. "https".
    pub proto: String,
}

impl ForwardedHeader {
    /// Parse the `Forwarded` header out of `headers`, if present and non-empty.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(FORWARDED)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(parse_forwarded)
    }
}

/// Parse a raw `Forwarded` header value.
pub fn parse_forwarded(value: &str) -> ForwardedHeader {
    let first_hop = value.split(',').next().unwrap_or_default();

    let mut result = ForwardedHeader::default();
    for field in first_hop.split(';') {
        let Some((key, value)) = field.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        let value = if value.starts_with('"') {
            match unquote(value) {
                Some(v) => v,
                None => continue,
            }
        } else {
            value.to_string()
        };

        if key.eq_ignore_ascii_case("for") {
            result.for_ = value;
        } else if key.eq_ignore_ascii_case("host") {
            result.host = value;
        } else if key.eq_ignore_ascii_case("proto") {
            result.proto = value.to_ascii_lowercase();
        }
    }
    result
}

/// Strip surrounding double quotes and resolve backslash escapes.
fn unquote(s: &str) -> Option<String> {
    let inner = s.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push(chars.next()?),
            '"' => return None,
            c => out.push(c),
        }
    }
    Some(out)
}

/// Resolve the client address for a request.
///
/// `peer` is the socket-level remote address, if known.
pub fn remote_addr(
    headers: &HeaderMap,
    forwarded: Option<&ForwardedHeader>,
    peer: Option<&str>,
) -> String {
    if let Some(fwd) = forwarded.filter(|f| !f.for_.is_empty()) {
        return host_without_port(&fwd.for_).to_string();
    }
    if let Some(real_ip) = header_str(headers, X_REAL_IP) {
        return real_ip.to_string();
    }
    if let Some(xff) = header_str(headers, X_FORWARDED_FOR) {
        let first = xff.split(',').next().unwrap_or_default();
        return first.trim().to_string();
    }
    peer.map(|p| host_without_port(p).to_string())
        .unwrap_or_default()
}

/// Split "host:port" or "[v6]:port". Returns `None` when there is no port.
pub fn split_host_port(s: &str) -> Option<(&str, &str)> {
    if let Some(rest) = s.strip_prefix('[') {
        let (host, after) = rest.split_once(']')?;
        let port = after.strip_prefix(':')?;
        return Some((host, port));
    }
    let (host, port) = s.rsplit_once(':')?;
    if host.contains(':') {
        // Bare IPv6 address without brackets.
        return None;
    }
    Some((host, port))
}

fn host_without_port(s: &str) -> &str {
    split_host_port(s).map(|(host, _)| host).unwrap_or(s)
}

pub(crate) fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}
