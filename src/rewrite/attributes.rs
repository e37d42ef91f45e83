//! URL attribute rewriting.

use lol_html::send::Element;
use lol_html::HandlerResult;
use url::Url;

use crate::observability::metrics;
use crate::rewrite::url_mapper::{rewrite_if_upstream, Rewrite};
use crate::rewrite::ElementVisitor;

/// Attributes that may carry a link back to the upstream.
pub const URL_ATTRIBUTES: [&str; 3] = ["href", "src", "action"];

/// Points upstream-hosted `href`/`src`/`action` values at the proxy host.
///
/// Values that do not resolve, or resolve to another host, are left exactly
/// as the upstream sent them.
#[derive(Debug, Clone)]
pub struct AttributeRewriter {
    /// Root of the upstream origin, the base for relative values.
    origin: Url,
    upstream_host: String,
    proxy_host: String,
}

impl AttributeRewriter {
    pub fn new(origin: Url, upstream_host: impl Into<String>, proxy_host: impl Into<String>) -> Self {
        Self {
            origin,
            upstream_host: upstream_host.into(),
            proxy_host: proxy_host.into(),
        }
    }

    /// Rewrite one attribute value.
    pub fn rewrite_value(&self, raw: &str) -> Rewrite {
        rewrite_if_upstream(raw, &self.origin, &self.upstream_host, &self.proxy_host)
    }
}

impl ElementVisitor for AttributeRewriter {
    fn visit(&mut self, element: &mut Element<'_, '_>) -> HandlerResult {
        for name in URL_ATTRIBUTES {
            let Some(value) = element.get_attribute(name) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }

            if let Rewrite::Rewritten(rewritten) = self.rewrite_value(&value) {
                tracing::trace!(
                    element = %element.tag_name(),
                    attribute = name,
                    from = %value,
                    to = %rewritten,
                    "Rewrote attribute"
                );
                element.set_attribute(name, &rewritten)?;
                metrics::record_rewritten_attribute();
            }
        }
        Ok(())
    }
}
