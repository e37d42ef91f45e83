//! HTML response rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! text/html upstream body
//!     → pipeline.rs (selector table, streaming task)
//!         → canonical.rs (inject into <head>, drop upstream canonicals)
//!         → attributes.rs (href/src/action → proxy host)
//!             → url_mapper.rs (pure URL translation)
//!     → client
//! ```
//!
//! # Design Decisions
//! - Visitors are created per response and never shared across requests
//! - URL failures inside a document are swallowed; the stream never aborts
//!   because of a bad attribute
//! - Rewriting only touches values resolving to the upstream host, which makes
//!   a second pass a no-op

use lol_html::send::Element;
use lol_html::HandlerResult;

pub mod attributes;
pub mod canonical;
pub mod pipeline;
pub mod url_mapper;

pub use attributes::AttributeRewriter;
pub use canonical::{CanonicalDeduplicator, CanonicalInjector};
pub use pipeline::{HtmlTransform, RewriteRule};
pub use url_mapper::Rewrite;

/// A handler invoked for every element matching its selector.
pub trait ElementVisitor: Send {
    fn visit(&mut self, element: &mut Element<'_, '_>) -> HandlerResult;
}
