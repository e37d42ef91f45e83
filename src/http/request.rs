//! Inbound request extraction.
//!
//! # Responsibilities
//! - Determine the proxy hostname the client used (URI authority, else Host)
//! - Determine the inbound scheme (URI scheme, else the configured public one)
//! - Turn the body into a lazy stream, or nothing when there is no body
//!
//! # Design Decisions
//! - A request without a usable hostname is rejected before any upstream call
//! - The port is not part of the hostname

use std::io;

use axum::body::{Body, HttpBody};
use axum::http::{header, HeaderMap, Method, Request, Uri};
use futures_util::{StreamExt, TryStreamExt};
use url::Url;

use crate::error::ProxyError;
use crate::upstream::ByteStream;

/// Everything the orchestrator needs from the client's request.
#[derive(Debug)]
pub struct InboundRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    /// Hostname the client addressed, without port.
    pub hostname: String,
    /// `http` or `https`, without trailing separator.
    pub scheme: String,
    pub body: Body,
}

impl InboundRequest {
    pub fn from_request(request: Request<Body>, default_scheme: &str) -> Result<Self, ProxyError> {
        let (parts, body) = request.into_parts();

        let hostname = hostname(&parts.uri, &parts.headers)
            .ok_or_else(|| ProxyError::InvalidRequest("missing or invalid Host header".into()))?;
        let scheme = parts
            .uri
            .scheme_str()
            .unwrap_or(default_scheme)
            .to_string();

        Ok(Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers,
            hostname,
            scheme,
            body,
        })
    }
}

/// Hostname from the URI authority (HTTP/2, absolute-form) or the Host header.
pub fn hostname(uri: &Uri, headers: &HeaderMap) -> Option<String> {
    let authority = match uri.authority() {
        Some(authority) => authority.as_str().to_string(),
        None => headers.get(header::HOST)?.to_str().ok()?.to_string(),
    };
    if authority.is_empty() {
        return None;
    }

    let parsed = Url::parse(&format!("http://{authority}")).ok()?;
    parsed.host_str().map(str::to_string)
}

/// A lazy stream over the request body, `None` if the request has none.
pub fn body_stream(body: Body) -> Option<ByteStream> {
    if body.is_end_stream() {
        return None;
    }
    Some(body.into_data_stream().map_err(io::Error::other).boxed())
}
