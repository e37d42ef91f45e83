//! Streaming HTML transform pipeline.
//!
//! # Data Flow
//! ```text
//! upstream body chunks
//!     → rewrite task (owns a Send HtmlRewriter)
//!         → selector table: head / link[rel] / a[href] / img[src] / ...
//!         → visitors mutate elements as they are tokenized
//!     → bounded channel of output chunks
//!     → response body
//! ```
//!
//! The document is never held in memory as a whole; output leaves as soon as
//! the tokenizer emits it. When the client disconnects the output channel
//! closes, the task stops and drops the upstream stream.

use std::borrow::Cow;
use std::io;

use axum::body::Bytes;
use futures_util::StreamExt;
use lol_html::send::{ElementContentHandlers, HtmlRewriter, Settings};
use lol_html::{element, OutputSink, Selector};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use url::Url;

use crate::rewrite::attributes::AttributeRewriter;
use crate::rewrite::canonical::{CanonicalDeduplicator, CanonicalInjector};
use crate::rewrite::ElementVisitor;
use crate::upstream::ByteStream;

/// Selectors whose elements get their URL attributes rewritten.
pub const LINK_SELECTORS: [&str; 5] = ["a[href]", "img[src]", "link[href]", "script[src]", "form[action]"];

/// Output chunks buffered between the rewrite task and the response body.
const OUTPUT_CAPACITY: usize = 16;

/// A visitor bound to the selector it handles.
pub struct RewriteRule {
    pub selector: &'static str,
    pub visitor: Box<dyn ElementVisitor>,
}

impl std::fmt::Debug for RewriteRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewriteRule")
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

/// Per-response inputs of the transform.
///
/// Built fresh for every request because the visitors close over the
/// hostname the client used.
#[derive(Debug, Clone)]
pub struct HtmlTransform {
    /// Root of the upstream origin; relative attribute values resolve here.
    origin: Url,
    upstream_host: String,
    proxy_host: String,
    canonical_url: String,
}

impl HtmlTransform {
    pub fn new(
        origin: Url,
        upstream_host: impl Into<String>,
        proxy_host: impl Into<String>,
        canonical_url: impl Into<String>,
    ) -> Self {
        Self {
            origin,
            upstream_host: upstream_host.into(),
            proxy_host: proxy_host.into(),
            canonical_url: canonical_url.into(),
        }
    }

    /// The registration table, in the order handlers fire for an element.
    pub fn rules(&self) -> Vec<RewriteRule> {
        let mut rules = vec![
            RewriteRule {
                selector: "head",
                visitor: Box::new(CanonicalInjector::new(self.canonical_url.clone())),
            },
            RewriteRule {
                selector: "link[rel]",
                visitor: Box::new(CanonicalDeduplicator),
            },
        ];
        rules.extend(LINK_SELECTORS.iter().map(|&selector| RewriteRule {
            selector,
            visitor: Box::new(AttributeRewriter::new(
                self.origin.clone(),
                self.upstream_host.clone(),
                self.proxy_host.clone(),
            )),
        }));
        rules
    }

    fn handlers(&self) -> Vec<(Cow<'static, Selector>, ElementContentHandlers<'static>)> {
        self.rules()
            .into_iter()
            .map(|RewriteRule { selector, mut visitor }| {
                element!(selector, move |el| visitor.visit(el))
            })
            .collect()
    }

    /// Build a rewriter writing its output into `sink`.
    pub fn rewriter<O: OutputSink>(&self, sink: O) -> HtmlRewriter<'static, O> {
        HtmlRewriter::new(
            Settings {
                element_content_handlers: self.handlers(),
                ..Settings::new_send()
            },
            sink,
        )
    }

    /// Rewrite a document delivered as `chunks`, collecting the output.
    pub fn rewrite_chunks<'a, I>(&self, chunks: I) -> Result<Vec<u8>, lol_html::errors::RewritingError>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut output = Vec::new();
        let mut rewriter = self.rewriter(|c: &[u8]| output.extend_from_slice(c));
        for chunk in chunks {
            rewriter.write(chunk)?;
        }
        rewriter.end()?;
        Ok(output)
    }

    /// Stream `upstream` through the rewriter.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn stream(self, upstream: ByteStream) -> ReceiverStream<io::Result<Bytes>> {
        let (output_tx, output_rx) = mpsc::channel(OUTPUT_CAPACITY);
        tokio::spawn(self.run(upstream, output_tx));
        ReceiverStream::new(output_rx)
    }

    async fn run(self, mut upstream: ByteStream, output: mpsc::Sender<io::Result<Bytes>>) {
        // The sink is synchronous; it parks rewritten bytes until the task
        // forwards them. At most one input chunk's worth is ever parked.
        let (sink_tx, mut sink_rx) = mpsc::unbounded_channel::<Bytes>();
        let mut rewriter = self.rewriter(move |chunk: &[u8]| {
            if !chunk.is_empty() {
                let _ = sink_tx.send(Bytes::copy_from_slice(chunk));
            }
        });

        loop {
            let next = tokio::select! {
                next = upstream.next() => next,
                () = output.closed() => {
                    tracing::debug!(proxy_host = %self.proxy_host, "Client went away, dropping upstream body");
                    return;
                }
            };

            match next {
                None => break,
                Some(Ok(chunk)) => {
                    if let Err(message) = rewriter.write(&chunk).map_err(|e| e.to_string()) {
                        tracing::error!(error = %message, "HTML rewriting failed mid-stream");
                        let _ = output.send(Err(io::Error::other(message))).await;
                        return;
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Upstream body failed mid-stream");
                    let _ = output.send(Err(e)).await;
                    return;
                }
            }

            while let Ok(rewritten) = sink_rx.try_recv() {
                if output.send(Ok(rewritten)).await.is_err() {
                    tracing::debug!(proxy_host = %self.proxy_host, "Client went away, dropping upstream body");
                    return;
                }
            }
        }

        if let Err(message) = rewriter.end().map_err(|e| e.to_string()) {
            tracing::error!(error = %message, "HTML rewriting failed at end of document");
            let _ = output.send(Err(io::Error::other(message))).await;
            return;
        }
        while let Ok(rewritten) = sink_rx.try_recv() {
            if output.send(Ok(rewritten)).await.is_err() {
                return;
            }
        }
    }
}
