//! HTTP server setup and request orchestration.
//!
//! # Responsibilities
//! - Create Axum Router with a single catch-all proxy handler
//! - Wire up middleware (request ID, tracing)
//! - Bind server to listener with graceful shutdown
//! - Drive each request through the proxy state machine
//!
//! # State Machine
//! ```text
//! BUILDING_REQUEST ──/robots.txt──▶ static response
//!        │
//!        ▼
//! AWAITING_UPSTREAM ──error──▶ FAILED (526 TLS / 502 other)
//!        │
//!        ├── text/html ──▶ SUCCESS_HTML (streamed through the rewriter)
//!        └── otherwise ──▶ SUCCESS_OPAQUE (streamed unmodified)
//! ```

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::headers;
use crate::http::request::{body_stream, InboundRequest};
use crate::http::response::{self, ROBOTS_PATH};
use crate::lifecycle::shutdown;
use crate::observability::metrics::{self, OUTCOME_HTML, OUTCOME_OPAQUE, OUTCOME_ROBOTS};
use crate::rewrite::url_mapper;
use crate::rewrite::HtmlTransform;
use crate::upstream::{OutboundRequest, ReqwestTransport, Transport, TransportError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub transport: Arc<dyn Transport>,
}

/// HTTP server for the rewriting proxy.
pub struct HttpServer {
    router: Router,
    config: Arc<ProxyConfig>,
}

impl HttpServer {
    /// Create a server talking to the upstream over HTTP(S).
    pub fn new(config: ProxyConfig) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(&config.upstream)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a server with a caller-supplied transport.
    pub fn with_transport(config: ProxyConfig, transport: Arc<dyn Transport>) -> Self {
        let config = Arc::new(config);
        let state = AppState {
            config: config.clone(),
            transport,
        };
        Self {
            router: Self::build_router(state),
            config,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// The fully layered router, for embedding or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown_rx` fires.
    pub async fn run(self, listener: TcpListener, shutdown_rx: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.origin(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait_for(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main proxy handler.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();

    let (outcome, response) = match handle(&state, request).await {
        Ok(handled) => handled,
        Err(err) => (err.outcome(), err.into_response()),
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), outcome, start_time);
    response
}

async fn handle(state: &AppState, request: Request<Body>) -> Result<(&'static str, Response), ProxyError> {
    let upstream = &state.config.upstream;

    // BUILDING_REQUEST
    if request.uri().path() == ROBOTS_PATH {
        tracing::debug!("Serving robots.txt");
        return Ok((OUTCOME_ROBOTS, response::robots_txt(upstream)));
    }

    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let inbound = InboundRequest::from_request(request, &state.config.listener.public_scheme)?;
    let origin = upstream.origin();
    let upstream_url = url_mapper::to_upstream(&origin, &inbound.path, inbound.query.as_deref())
        .map_err(|e| ProxyError::InvalidRequest(format!("cannot map path onto upstream: {e}")))?;
    let outbound_headers =
        headers::outbound_headers(&inbound.headers, &upstream.authority(), &inbound.hostname, &inbound.scheme)
            .map_err(|e| ProxyError::InvalidRequest(format!("invalid forwarding header: {e}")))?;

    tracing::debug!(
        request_id = request_id.as_deref(),
        method = %inbound.method,
        proxy_host = %inbound.hostname,
        upstream_url = %upstream_url,
        "Proxying request"
    );

    // AWAITING_UPSTREAM
    let outbound = OutboundRequest {
        method: inbound.method.clone(),
        url: upstream_url.clone(),
        headers: outbound_headers,
        body: body_stream(inbound.body),
    };
    let upstream_response = state.transport.send(outbound).await.map_err(|err| {
        let error = ProxyError::from_transport(&upstream.host, &err);
        tracing::error!(
            request_id = request_id.as_deref(),
            host = %upstream.host,
            url = %upstream_url,
            kind = error.outcome(),
            error = %err,
            "Upstream fetch failed"
        );
        error
    })?;

    let status = upstream_response.status;
    let mut response_headers = headers::response_headers(&upstream_response.headers);

    if !headers::is_html(&upstream_response.headers) {
        // SUCCESS_OPAQUE
        tracing::debug!(request_id = request_id.as_deref(), status = %status, "Passing body through");
        let body = Body::from_stream(upstream_response.body);
        return Ok((OUTCOME_OPAQUE, response::from_parts(status, response_headers, body)));
    }

    // SUCCESS_HTML
    response_headers.remove(header::CONTENT_LENGTH);
    let canonical_url = url_mapper::canonical_url(&origin, &inbound.path, inbound.query.as_deref());
    tracing::debug!(
        request_id = request_id.as_deref(),
        status = %status,
        canonical = %canonical_url,
        "Rewriting HTML"
    );

    let origin_root = url_mapper::to_upstream(&origin, "/", None)
        .map_err(|e| ProxyError::InvalidRequest(format!("cannot parse upstream origin: {e}")))?;
    let transform = HtmlTransform::new(origin_root, upstream.host.clone(), inbound.hostname, canonical_url);
    let body = Body::from_stream(transform.stream(upstream_response.body));
    Ok((OUTCOME_HTML, response::from_parts(status, response_headers, body)))
}
