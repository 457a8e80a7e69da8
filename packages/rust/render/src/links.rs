//! Link rewriting for offline use.
//!
//! Links into the site's own docs, images and stylesheets become paths
//! relative to the page, so the docset can be moved around. Links that are
//! already relative are left alone, and everything else is made absolute
//! against the site base URL.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::{RenderOptions, dom};

static LINK_ATTRS: LazyLock<[(Selector, &'static str); 2]> = LazyLock::new(|| {
    [
        (Selector::parse("[href]").expect("valid selector"), "href"),
        (Selector::parse("img[src]").expect("valid selector"), "src"),
    ]
});

/// Rewrite one link value found on the page at `relative_path`.
///
/// Returns `None` when the value should be left untouched.
pub fn rewrite_link(
    value: &str,
    relative_path: &str,
    local_prefixes: &[String],
    base_url: &Url,
) -> Option<String> {
    if local_prefixes.iter().any(|prefix| value.starts_with(prefix.as_str())) {
        return Some(relative_to(value, &page_dir(relative_path)));
    }
    if !value.contains('/') {
        return None;
    }
    match base_url.join(value) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            warn!(value, error = %e, "unresolvable link left as-is");
            None
        }
    }
}

/// Rewrite every `href` and image `src` in `html`. Returns how many changed.
pub fn rewrite_links(html: &mut Html, relative_path: &str, options: &RenderOptions) -> usize {
    let mut edits = Vec::new();
    for (selector, attr) in LINK_ATTRS.iter() {
        for el in html.select(selector) {
            let Some(value) = el.value().attr(attr) else {
                continue;
            };
            let rewritten =
                rewrite_link(value, relative_path, &options.local_prefixes, &options.base_url);
            if let Some(rewritten) = rewritten.filter(|r| r != value) {
                edits.push((el.id(), *attr, rewritten));
            }
        }
    }

    for (id, attr, value) in &edits {
        if let Some(mut node) = html.tree.get_mut(*id) {
            dom::set_attr(node.value(), attr, value);
        }
    }

    debug!(page = relative_path, rewritten = edits.len(), "links rewritten");
    edits.len()
}

/// Directory of a page, as an absolute site path (`cdk/a/b.html` → `/cdk/a`).
fn page_dir(relative_path: &str) -> String {
    let absolute = format!("/{}", relative_path.trim_start_matches('/'));
    match absolute.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(i) => absolute[..i].to_string(),
    }
}

/// POSIX-style relative path from directory `base` to `target`.
///
/// Both are absolute site paths. Returns `"."` when they are the same.
pub fn relative_to(target: &str, base: &str) -> String {
    let target = normalize(target);
    let base = normalize(base);

    let common = target
        .iter()
        .zip(&base)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; base.len() - common];
    parts.extend(&target[common..]);

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Path segments with `.` dropped and `..` applied.
fn normalize(path: &str) -> Vec<&str> {
    let mut out = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            s => out.push(s),
        }
    }
    out
}
