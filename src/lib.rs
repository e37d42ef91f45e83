//! Rewriting reverse proxy for a single upstream origin.
//!
//! Requests are forwarded to one fixed upstream; HTML responses are rewritten
//! while they stream so links point back at the proxy and a canonical link
//! points at the upstream.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod rewrite;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
