//! `reqwest`-backed transport.

use std::io;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::{FutureExt, StreamExt, TryStreamExt};
use reqwest::redirect::Policy;

use crate::config::UpstreamConfig;
use crate::upstream::{OutboundRequest, Transport, TransportError, UpstreamResponse};

/// Pooled HTTP(S) client for the upstream origin.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    response_timeout: Duration,
}

impl ReqwestTransport {
    /// Build a client that never follows redirects and ignores proxy
    /// environment variables.
    pub fn new(config: &UpstreamConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .no_proxy()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| TransportError::from_error(&e))?;

        Ok(Self {
            client,
            response_timeout: Duration::from_secs(config.response_timeout_secs),
        })
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: OutboundRequest) -> BoxFuture<'static, Result<UpstreamResponse, TransportError>> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(reqwest::Body::wrap_stream(body));
        }
        let response_timeout = self.response_timeout;

        async move {
            let response = match tokio::time::timeout(response_timeout, builder.send()).await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => return Err(TransportError::from_error(&e)),
                Err(_) => return Err(TransportError::timed_out(response_timeout)),
            };

            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes_stream().map_err(io::Error::other).boxed();

            Ok(UpstreamResponse { status, headers, body })
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, Method};
    use url::Url;

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        let config = UpstreamConfig {
            host: "127.0.0.1".into(),
            connect_timeout_secs: 2,
            ..UpstreamConfig::default()
        };
        let transport = ReqwestTransport::new(&config).unwrap();

        // Port 9 (discard) is closed on any sane test host.
        let result = transport
            .send(OutboundRequest {
                method: Method::GET,
                url: Url::parse("http://127.0.0.1:9/").unwrap(),
                headers: HeaderMap::new(),
                body: None,
            })
            .await;

        let err = result.unwrap_err();
        assert!(!err.message().is_empty());
    }
}
