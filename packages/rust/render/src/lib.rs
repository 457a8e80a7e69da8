//! Page transformer: upstream reference page → standalone docset page.
//!
//! This crate provides:
//! - [`transform`]: the full per-page rewrite, returning a [`RenderedPage`]
//! - [`strip_chrome`], [`rewrite_links`], [`embed_toc`]: the individual passes
//! - [`page_version`] / [`check_version`]: the header version marker
//!
//! All passes edit a parsed [`Html`] tree in place. A page whose template is
//! missing a required element fails with [`DocsetError::MissingElement`].

mod chrome;
mod dom;
mod links;
mod toc;
mod version;

use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use cdkdocset_classify::{canonical_name, classify, page_stem};
use cdkdocset_shared::{DocsetError, Entry, EntryType, Result, SiteConfig};

pub use chrome::strip_chrome;
pub use links::{relative_to, rewrite_link, rewrite_links};
pub use toc::{ANCHOR_CLASS, TocAnchor, anchor_name, embed_toc};
pub use version::{check_version, page_version};

static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").expect("valid selector"));

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Site facts the transformer needs.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Absolute links are resolved against this.
    pub base_url: Url,
    /// Path prefixes mirrored into the docset; links under them become relative.
    pub local_prefixes: Vec<String>,
    /// Path of the versions page linked from every header.
    pub versions_path: String,
}

impl RenderOptions {
    pub fn from_site(site: &SiteConfig) -> Result<Self> {
        let base_url = Url::parse(&site.base_url)
            .map_err(|e| DocsetError::config(format!("invalid base_url {}: {e}", site.base_url)))?;
        Ok(Self {
            base_url,
            local_prefixes: site.local_prefixes.clone(),
            versions_path: site.versions_path.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Transform
// ---------------------------------------------------------------------------

/// A transformed page and what was learned about it.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Serialized cleaned document.
    pub html: String,
    /// Page path relative to the documents root.
    pub relative_path: String,
    /// Raw `h1` text.
    pub title: String,
    pub entry_type: EntryType,
    /// Canonical index name.
    pub name: String,
    pub toc: Vec<TocAnchor>,
}

impl RenderedPage {
    /// Index row for this page.
    pub fn entry(&self) -> Entry {
        Entry::new(&self.name, self.entry_type, &self.relative_path)
    }
}

/// Rewrite `html`, the page at `relative_path`, for offline viewing.
///
/// The version marker is not checked here; see [`check_version`].
#[instrument(skip_all, fields(page = %relative_path))]
pub fn transform(mut html: Html, relative_path: &str, options: &RenderOptions) -> Result<RenderedPage> {
    let relative_path = relative_path.trim_start_matches('/');

    strip_chrome(&mut html, relative_path)?;
    rewrite_links(&mut html, relative_path, options);
    let toc = embed_toc(&mut html, relative_path)?;

    let online = options
        .base_url
        .join(relative_path)
        .map_err(|e| DocsetError::parse(format!("cannot resolve {relative_path}: {e}")))?;
    let root = html.root_element().id();
    if let Some(mut node) = html.tree.get_mut(root) {
        node.prepend(dom::new_comment(&format!("Online page at {online}")));
    }

    let h1 = html
        .select(&H1)
        .next()
        .ok_or_else(|| DocsetError::missing("h1", relative_path))?;
    let title = dom::text_of(h1);
    let h1_parent = h1.parent().map(|p| p.id());

    let entry_type = classify(&title);
    let name = canonical_name(&title, entry_type, relative_path);

    // Show the fully qualified symbol above the heading.
    if entry_type.is_symbol() {
        let (span, text) = dom::new_element("span", page_stem(relative_path));
        if let Some(mut parent) = h1_parent.and_then(|id| html.tree.get_mut(id)) {
            parent.prepend(span).append(text);
        }
    }

    debug!(%entry_type, %name, anchors = toc.len(), "page transformed");

    Ok(RenderedPage {
        html: html.html(),
        relative_path: relative_path.to_string(),
        title,
        entry_type,
        name,
        toc,
    })
}
