//! Upstream transport subsystem.
//!
//! # Data Flow
//! ```text
//! OutboundRequest (method, url, headers, streamed body)
//!     → Transport::send (reqwest in production, scripted fakes in tests)
//!     → UpstreamResponse (status, headers, single-pass body stream)
//!       or TransportError (full cause chain as text)
//! ```
//!
//! # Design Decisions
//! - Redirects are never followed; 3xx responses reach the client verbatim
//! - No retries: a failed call surfaces immediately
//! - Connect and response-header timeouts are explicit; body streaming is
//!   unbounded

use std::io;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use url::Url;

pub mod client;
pub mod error;

pub use client::ReqwestTransport;
pub use error::TransportError;

/// A lazy, single-pass body.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// Request sent to the upstream origin.
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    /// `None` when the inbound request carried no body.
    pub body: Option<ByteStream>,
}

impl std::fmt::Debug for OutboundRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// Response received from the upstream origin.
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ByteStream,
}

impl std::fmt::Debug for UpstreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Capability to perform one upstream exchange.
pub trait Transport: Send + Sync {
    fn send(&self, request: OutboundRequest) -> BoxFuture<'static, Result<UpstreamResponse, TransportError>>;
}
