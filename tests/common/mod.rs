//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{to_bytes, Body, Bytes};
use axum::http::{HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::Router;
use futures_util::future::BoxFuture;
use futures_util::{stream, FutureExt, StreamExt};
use rehost::config::{ProxyConfig, UpstreamScheme};
use rehost::upstream::{OutboundRequest, Transport, TransportError, UpstreamResponse};
use rehost::HttpServer;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower::ServiceExt;
use url::Url;

/// Config for an `https://example.org` upstream, public scheme `https`.
pub fn example_config() -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.upstream.host = "example.org".into();
    config.upstream.scheme = UpstreamScheme::Https;
    config.listener.public_scheme = "https".into();
    config
}

/// What the proxy handed to the transport.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

type Reply = Box<dyn Fn() -> Result<UpstreamResponse, TransportError> + Send + Sync>;

/// Transport that answers every request from a script and records it.
pub struct ScriptedTransport {
    reply: Reply,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl ScriptedTransport {
    pub fn new<F>(reply: F) -> Self
    where
        F: Fn() -> Result<UpstreamResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            reply: Box::new(reply),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always fail with `message`.
    pub fn failing(message: &'static str) -> Self {
        Self::new(move || Err(TransportError::new(message)))
    }

    pub fn seen(&self) -> Arc<Mutex<Vec<SeenRequest>>> {
        self.seen.clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: OutboundRequest) -> BoxFuture<'static, Result<UpstreamResponse, TransportError>> {
        let reply = (self.reply)();
        let seen = self.seen.clone();

        async move {
            let mut body = Vec::new();
            if let Some(mut stream) = request.body {
                while let Some(chunk) = stream.next().await {
                    body.extend_from_slice(&chunk.unwrap());
                }
            }
            seen.lock().unwrap().push(SeenRequest {
                method: request.method,
                url: request.url,
                headers: request.headers,
                body,
            });
            reply
        }
        .boxed()
    }
}

/// Upstream response with the given status, headers and body chunks.
pub fn upstream_reply(status: u16, headers: &[(&'static str, &'static str)], chunks: &[&'static str]) -> UpstreamResponse {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.append(*name, HeaderValue::from_static(*value));
    }
    let chunks: Vec<std::io::Result<Bytes>> = chunks.iter().map(|c| Ok(Bytes::from_static(c.as_bytes()))).collect();

    UpstreamResponse {
        status: StatusCode::from_u16(status).unwrap(),
        headers: map,
        body: stream::iter(chunks).boxed(),
    }
}

/// Router for `config` backed by `transport`.
pub fn proxy(config: ProxyConfig, transport: ScriptedTransport) -> Router {
    HttpServer::with_transport(config, Arc::new(transport)).router()
}

/// `GET path` with `Host: host`.
pub fn get(path: &str, host: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header("host", host)
        .body(Body::empty())
        .unwrap()
}

/// Drive one request through the router and collect the response.
pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, String::from_utf8(body.to_vec()).unwrap())
}

/// Start a mock backend that answers every connection with a fixed response
/// and reports the raw request head it received.
pub async fn start_mock_backend(
    status_line: &'static str,
    headers: &'static str,
    body: &'static str,
) -> (SocketAddr, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let head = read_head(&mut socket).await;
                        let _ = tx.send(head);

                        let response_str = format!(
                            "HTTP/1.1 {}\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_line,
                            headers,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, rx)
}

/// Read until the end of the request head.
async fn read_head(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
