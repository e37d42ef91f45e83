//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, orchestration)
//!     → request.rs (hostname, scheme, path, body stream)
//!     → headers.rs (outbound headers)
//!     → upstream transport
//!     → headers.rs (response headers)
//!     → rewrite pipeline for text/html, pass-through otherwise
//!     → response.rs (assemble, or robots.txt short-circuit)
//!     → Send to client
//! ```

pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use request::InboundRequest;
pub use server::{AppState, HttpServer};
