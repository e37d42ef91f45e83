//! Response construction.
//!
//! # Responsibilities
//! - Static robots.txt that sends crawlers to the upstream sitemap
//! - Assemble proxied responses from status, transformed headers and body
//!
//! # Design Decisions
//! - Proxied bodies are streamed, never buffered
//! - Upstream reason phrases are not carried; the status code is

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;

use crate::config::UpstreamConfig;

pub const ROBOTS_PATH: &str = "/robots.txt";

/// robots.txt allowing everything and pointing at the upstream sitemap.
pub fn robots_body(upstream: &UpstreamConfig) -> String {
    format!(
        "User-agent: *\nAllow: /\n\nSitemap: {}/sitemap.xml\n",
        upstream.origin()
    )
}

pub fn robots_txt(upstream: &UpstreamConfig) -> Response {
    let mut response = Response::new(Body::from(robots_body(upstream)));
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    response
}

/// A proxied response.
pub fn from_parts(status: StatusCode, headers: HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
