//! Site chrome removal.
//!
//! The upstream pages are Docusaurus v1 pages: a fixed blue header, a left
//! navigation column, an on-page navigation column, prev/next buttons and a
//! footer wrap the actual reference content. None of it is useful offline.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::debug;

use cdkdocset_shared::{DocsetError, Result};

use crate::dom;

/// What to do with a required chrome element.
#[derive(Debug, Clone, Copy)]
enum Edit {
    Remove,
    Style(&'static str),
}

const FULL_WIDTH: &str = "max-width: 100%; margin: 0;";

/// Required edits, applied in order. A missing element aborts the page.
const CHROME_EDITS: [(&str, Edit); 9] = [
    // Blue bar at the top, and the padding that made room for it.
    (".fixedHeaderContainer", Edit::Remove),
    (".navPusher", Edit::Style("padding-top: 0;")),
    (".docMainWrapper", Edit::Style(FULL_WIDTH)),
    (".docsNavContainer", Edit::Remove),
    (".mainContainer > .wrapper", Edit::Style(FULL_WIDTH)),
    (".docs-prevnext", Edit::Remove),
    ("nav.onPageNav", Edit::Remove),
    ("footer", Edit::Remove),
    ("h1", Edit::Style("margin: 10px 0;")),
];

static CHROME_SELECTORS: LazyLock<Vec<(&'static str, Selector, Edit)>> = LazyLock::new(|| {
    CHROME_EDITS
        .iter()
        .map(|(css, edit)| (*css, Selector::parse(css).expect("valid selector"), *edit))
        .collect()
});

static SCRIPT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("valid selector"));
static POST_HEADER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("header.postHeader").expect("valid selector"));
static HASH_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.hash-link").expect("valid selector"));

/// Strip site chrome from `html` in place.
///
/// `page` is only used to name the page in errors.
pub fn strip_chrome(html: &mut Html, page: &str) -> Result<()> {
    let scripts = dom::remove_all(html, &SCRIPT);

    for (css, selector, edit) in CHROME_SELECTORS.iter() {
        let found = match edit {
            Edit::Remove => dom::remove_first(html, selector),
            Edit::Style(style) => dom::set_attr_first(html, selector, "style", style),
        };
        if !found {
            return Err(DocsetError::missing(*css, page));
        }
    }

    // Regular reference pages carry an empty post header that only adds whitespace.
    let empty_header = html
        .select(&POST_HEADER)
        .next()
        .is_some_and(|el| dom::text_of(el).trim().is_empty());
    if empty_header {
        dom::remove_first(html, &POST_HEADER);
    }

    let hash_links = dom::remove_all(html, &HASH_LINK);

    debug!(page, scripts, hash_links, empty_header, "chrome stripped");
    Ok(())
}
