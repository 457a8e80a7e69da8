//! Version marker in the site header.
//!
//! Every page links to the versions page from its header, with the published
//! library version as the link's heading: `header > a[href=<versions>] > h3`.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use cdkdocset_shared::{DocsetError, Result};

static HEADER_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("header > a[href]").expect("valid selector"));

/// Published version shown on `doc`, if the marker is present.
pub fn page_version(doc: &Html, versions_path: &str) -> Option<String> {
    doc.select(&HEADER_LINK)
        .filter(|a| a.value().attr("href") == Some(versions_path))
        .find_map(|a| {
            a.children()
                .filter_map(ElementRef::wrap)
                .find(|child| child.value().name() == "h3")
        })
        .map(|h3| h3.text().collect::<String>().trim().to_string())
}

/// Fail with [`DocsetError::VersionMismatch`] unless `doc` shows `expected`.
///
/// Returns the version found on the page.
pub fn check_version(doc: &Html, versions_path: &str, expected: &str) -> Result<String> {
    match page_version(doc, versions_path) {
        Some(actual) if actual == expected => Ok(actual),
        Some(actual) => Err(DocsetError::version_mismatch(expected, actual)),
        None => Err(DocsetError::version_mismatch(expected, "<missing>")),
    }
}
