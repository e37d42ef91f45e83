//! Translation between proxy-facing and upstream URLs.
//!
//! Everything here is a pure function. Request-side mapping may fail (the
//! request is then rejected); link-side mapping never fails and falls back to
//! leaving the value alone.

use url::Url;

/// Outcome of attempting to rewrite one embedded URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    /// The value pointed at the upstream host; this is the proxy-hosted form.
    Rewritten(String),
    /// The value is left exactly as it was.
    Unchanged,
}

/// Concatenate `path` and `query` onto the upstream origin.
///
/// `origin` is `{scheme}://{authority}`. The path is set rather than resolved, so a
/// path such as `//other.host/x` stays on the upstream origin.
pub fn to_upstream(origin: &str, path: &str, query: Option<&str>) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(origin)?;
    url.set_path(path);
    url.set_query(query.filter(|q| !q.is_empty()));
    Ok(url)
}

/// Rewrite `raw` to point at `proxy_host` if it resolves to `upstream_host`.
///
/// `raw` is resolved against `base`, the root of the upstream origin, so that
/// relative links resolve to the upstream regardless of the document path.
/// Only the host changes; scheme, port, path, query and fragment of
/// the resolved URL are kept. Anything unparseable is left unchanged.
pub fn rewrite_if_upstream(raw: &str, base: &Url, upstream_host: &str, proxy_host: &str) -> Rewrite {
    let Ok(mut resolved) = base.join(raw) else {
        return Rewrite::Unchanged;
    };

    if resolved.host_str() != Some(upstream_host) {
        return Rewrite::Unchanged;
    }

    match resolved.set_host(Some(proxy_host)) {
        Ok(()) => Rewrite::Rewritten(resolved.into()),
        Err(_) => Rewrite::Unchanged,
    }
}

/// `{origin}{path}{?query}`, safe to embed inside a double-quoted attribute.
///
/// Always built from the upstream origin, never the proxy's.
pub fn canonical_url(origin: &str, path: &str, query: Option<&str>) -> String {
    let mut url = String::with_capacity(origin.len() + path.len() + 16);
    url.push_str(origin);
    for c in path_and_query(path, query).chars() {
        match c {
            '"' => url.push_str("%22"),
            '<' => url.push_str("%3C"),
            '>' => url.push_str("%3E"),
            c => url.push(c),
        }
    }
    url
}

fn path_and_query(path: &str, query: Option<&str>) -> String {
    match query {
        Some(q) if !q.is_empty() => format!("{path}?{q}"),
        _ => path.to_string(),
    }
}
