//! Best-effort client address resolution.
//!
//! The value is trivial to spoof and is only ever reported back to the
//! caller; nothing in the service makes access decisions with it.

use axum::http::HeaderMap;

/// Header set by hosting platforms that terminate the client connection.
pub const PLATFORM_CLIENT_IP: &str = "fly-client-ip";

/// Standard proxy chain header.
pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Resolve the origin of a request.
///
/// Precedence, first match wins:
/// 1. non-empty platform client-IP header
/// 2. first entry of a non-empty `X-Forwarded-For`, trimmed
/// 3. the raw remote address of the connection
pub fn client_ip(headers: &HeaderMap, remote_addr: &str) -> String {
    if let Some(ip) = header_str(headers, PLATFORM_CLIENT_IP) {
        return ip.to_string();
    }

    if let Some(forwarded) = header_str(headers, FORWARDED_FOR) {
        let first = forwarded.split(',').next().unwrap_or_default();
        return first.trim().to_string();
    }

    remote_addr.to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}
