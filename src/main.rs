//! rehost: a rewriting reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                        REHOST                        │
//!   Client Request   │  ┌────────┐   ┌───────────┐   ┌──────────────────┐  │
//!  ──────────────────┼─▶│  http  │──▶│  headers  │──▶│     upstream     │──┼──▶ Origin
//!                    │  │ server │   │ outbound  │   │ reqwest, no redir│  │
//!                    │  └────────┘   └───────────┘   └────────┬─────────┘  │
//!                    │                                        │            │
//!   Client Response  │  ┌──────────────────────┐   ┌──────────▼─────────┐  │
//!  ◀─────────────────┼──│ rewrite pipeline     │◀──│ headers (CORS,     │◀─┼─── Origin
//!                    │  │ (text/html only)     │   │ robots, framing)   │  │
//!                    │  └──────────────────────┘   └────────────────────┘  │
//!                    │                                                      │
//!                    │  config · observability · lifecycle                  │
//!                    └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;

use tokio::net::TcpListener;

use rehost::config::load_from_env;
use rehost::observability::{logging, metrics};
use rehost::{HttpServer, Shutdown};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_from_env()?;
    logging::init_logging(&config.observability);

    tracing::info!("rehost v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        upstream = %config.upstream.origin(),
        bind_address = %config.listener.bind_address,
        connect_timeout_secs = config.upstream.connect_timeout_secs,
        response_timeout_secs = config.upstream.response_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move { shutdown.trigger_on_ctrl_c().await });

    let server = HttpServer::new(config)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
