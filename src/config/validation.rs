//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Upstream host must be a bare host: no scheme, port, path or userinfo,
//!   and already lowercase and trimmed
//! - Validate value ranges (timeouts and port > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("upstream.host must not be empty")]
    EmptyUpstreamHost,

    #[error("upstream.host {0:?} is not a bare, normalized hostname")]
    InvalidUpstreamHost(String),

    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("upstream.port must not be 0")]
    ZeroPort,

    #[error("{field} {value:?} is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("listener.public_scheme must be \"http\" or \"https\", got {0:?}")]
    InvalidPublicScheme(String),
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let host = config.upstream.host.as_str();
    if host.trim().is_empty() {
        errors.push(ValidationError::EmptyUpstreamHost);
    } else if !is_bare_host(host) {
        errors.push(ValidationError::InvalidUpstreamHost(host.to_string()));
    }

    if config.upstream.port == Some(0) {
        errors.push(ValidationError::ZeroPort);
    }

    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout {
            field: "upstream.connect_timeout_secs",
        });
    }
    if config.upstream.response_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout {
            field: "upstream.response_timeout_secs",
        });
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if !matches!(config.listener.public_scheme.as_str(), "http" | "https") {
        errors.push(ValidationError::InvalidPublicScheme(
            config.listener.public_scheme.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// True when `host` parses as the host of an origin and nothing else, and is
/// already in the form the URL parser normalizes it to. Link matching compares
/// against the parsed form, so `Example.ORG` would never match.
fn is_bare_host(host: &str) -> bool {
    match Url::parse(&format!("http://{host}")) {
        Ok(url) => {
            url.host_str() == Some(host)
                && url.port().is_none()
                && url.path() == "/"
                && url.query().is_none()
                && url.username().is_empty()
        }
        Err(_) => false,
    }
}
