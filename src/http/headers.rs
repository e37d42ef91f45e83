//! Header manipulation in both directions.
//!
//! # Responsibilities
//! - Outbound: point `Host` at the upstream, add X-Forwarded-Host and
//!   X-Forwarded-Proto
//! - Inbound: open CORS, allow framing, keep transformed pages out of indexes
//! - Strip hop-by-hop headers; the HTTP stacks regenerate framing
//!
//! # Design Decisions
//! - Everything else is copied verbatim, duplicates included
//! - The client's Accept-Encoding is not forwarded; the upstream client
//!   negotiates what it can decode so HTML arrives rewritable

use axum::http::header::{
    self, HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue, ACCEPT_ENCODING, CONNECTION,
    CONTENT_TYPE, HOST,
};

pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_ROBOTS_TAG: HeaderName = HeaderName::from_static("x-robots-tag");
pub const X_FRAME_OPTIONS: HeaderName = HeaderName::from_static("x-frame-options");

pub const ALLOW_METHODS: &str = "GET, HEAD, POST, PUT, DELETE, OPTIONS";
pub const ROBOTS_DIRECTIVE: &str = "noindex, follow";

const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Headers for the upstream request.
///
/// `upstream_host` is the upstream authority (`host` or `host:port`).
pub fn outbound_headers(
    inbound: &HeaderMap,
    upstream_host: &str,
    proxy_host: &str,
    inbound_scheme: &str,
) -> Result<HeaderMap, InvalidHeaderValue> {
    let mut headers = inbound.clone();
    strip_hop_by_hop(&mut headers);
    headers.remove(ACCEPT_ENCODING);

    headers.insert(HOST, HeaderValue::from_str(upstream_host)?);
    headers.insert(X_FORWARDED_HOST, HeaderValue::from_str(proxy_host)?);
    headers.insert(
        X_FORWARDED_PROTO,
        HeaderValue::from_str(inbound_scheme.trim_end_matches(':'))?,
    );
    Ok(headers)
}

/// Headers for the client response.
pub fn response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = upstream.clone();
    strip_hop_by_hop(&mut headers);

    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.remove(X_FRAME_OPTIONS);

    if is_html(upstream) {
        headers.insert(X_ROBOTS_TAG, HeaderValue::from_static(ROBOTS_DIRECTIVE));
    }
    headers
}

/// `Content-Type` present and containing `text/html` (case-sensitive).
pub fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("text/html"))
}

/// Remove connection-scoped headers, including any named by `Connection`.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect();

    for name in named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}
