//! Canonical link handling.
//!
//! The link is appended to the first literal `<head>` start tag. Documents
//! that omit the tag get no canonical link: the rewriter works on the token
//! stream and never synthesizes implied elements.

use lol_html::html_content::ContentType;
use lol_html::send::Element;
use lol_html::HandlerResult;

use crate::rewrite::ElementVisitor;

/// Appends `<link rel="canonical">` to the first `<head>` of a document.
#[derive(Debug, Clone)]
pub struct CanonicalInjector {
    canonical_url: String,
    injected: bool,
}

impl CanonicalInjector {
    pub fn new(canonical_url: impl Into<String>) -> Self {
        Self {
            canonical_url: canonical_url.into(),
            injected: false,
        }
    }

    /// The markup appended to `<head>`.
    pub fn link_markup(&self) -> String {
        format!(r#"<link rel="canonical" href="{}">"#, self.canonical_url)
    }
}

impl ElementVisitor for CanonicalInjector {
    fn visit(&mut self, element: &mut Element<'_, '_>) -> HandlerResult {
        if self.injected {
            return Ok(());
        }
        element.append(&self.link_markup(), ContentType::Html);
        self.injected = true;
        Ok(())
    }
}

/// Drops canonical links the upstream document already carries, so the
/// injected one is the only canonical link in the output.
#[derive(Debug, Clone, Default)]
pub struct CanonicalDeduplicator;

impl ElementVisitor for CanonicalDeduplicator {
    fn visit(&mut self, element: &mut Element<'_, '_>) -> HandlerResult {
        let is_canonical = element.get_attribute("rel").is_some_and(|rel| {
            rel.split_ascii_whitespace()
                .any(|token| token.eq_ignore_ascii_case("canonical"))
        });
        if is_canonical {
            element.remove();
        }
        Ok(())
    }
}
