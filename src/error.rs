//! Request-level error taxonomy.
//!
//! Every variant is terminal for the current request only and is rendered as
//! a plain-text response. Nothing here is retried.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::upstream::TransportError;

/// Cloudflare's "Invalid SSL Certificate" status, used for TLS failures.
pub const STATUS_INVALID_SSL_CERTIFICATE: u16 = 526;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// The upstream call failed for a certificate/TLS reason.
    #[error("Failed to fetch content from {host} because of an SSL problem. Error: {message}")]
    TlsFailure { host: String, message: String },

    /// Any other upstream failure: DNS, refused connection, timeout, ...
    #[error("Failed to fetch content from {host}. Error: {message}")]
    UpstreamUnreachable { host: String, message: String },

    /// The inbound request cannot be mapped onto the upstream.
    #[error("Bad request: {0}")]
    InvalidRequest(String),
}

impl ProxyError {
    /// Classify a failed upstream call.
    pub fn from_transport(host: &str, err: &TransportError) -> Self {
        let message = err.message().to_string();
        if is_tls_failure(&message) {
            ProxyError::TlsFailure {
                host: host.to_string(),
                message,
            }
        } else {
            ProxyError::UpstreamUnreachable {
                host: host.to_string(),
                message,
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::TlsFailure { .. } => {
                StatusCode::from_u16(STATUS_INVALID_SSL_CERTIFICATE).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ProxyError::UpstreamUnreachable { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Short label for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            ProxyError::TlsFailure { .. } => "tls_failure",
            ProxyError::UpstreamUnreachable { .. } => "unreachable",
            ProxyError::InvalidRequest(_) => "invalid_request",
        }
    }
}

/// Case-sensitive, matching what TLS stacks put in their messages.
fn is_tls_failure(message: &str) -> bool {
    message.contains("certificate") || message.contains("SSL")
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ssl_and_certificate_messages_are_tls_failures() {
        for message in [
            "error:0A000086:SSL routines:tls_post_process_server_certificate:certificate verify failed",
            "invalid peer certificate: UnknownIssuer",
            "SSL handshake failed",
        ] {
            let err = ProxyError::from_transport("example.org", &TransportError::new(message));
            assert_eq!(err.status_code().as_u16(), 526, "{message}");
            assert_eq!(err.outcome(), "tls_failure");
        }
    }

    #[test]
    fn classification_is_case_sensitive() {
        let err = ProxyError::from_transport("example.org", &TransportError::new("ssl alert"));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);

        let err = ProxyError::from_transport("example.org", &TransportError::new("Certificate expired"));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn other_failures_are_unreachable() {
        let err = ProxyError::from_transport(
            "example.org",
            &TransportError::new("dns error: failed to lookup address information"),
        );
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            err.to_string(),
            "Failed to fetch content from example.org. Error: dns error: failed to lookup address information"
        );
    }

    #[test]
    fn response_is_plain_text_naming_the_host() {
        let response = ProxyError::TlsFailure {
            host: "example.org".into(),
            message: "SSL".into(),
        }
        .into_response();

        assert_eq!(response.status().as_u16(), 526);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn invalid_request_is_400() {
        let err = ProxyError::InvalidRequest("missing Host header".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
