//! In-page table of contents for the docset browser.
//!
//! Every heading in the main content block already carries an anchor. That
//! anchor is renamed to `//apple_ref/cpp/<Type>/<escaped text>` and tagged
//! `dashAnchor`, which is what the browser's indexer looks for. The type of an
//! `h3` depends on the most recent `h2` before it ("Methods", "Properties", ...).

use std::collections::HashMap;
use std::sync::LazyLock;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use cdkdocset_shared::{AnchorType, DocsetError, Result};

use crate::dom;

/// Content block whose direct children are walked.
pub const CONTENT_SELECTOR: &str = "article > div > span";

/// Class the docset browser uses to discover anchors.
pub const ANCHOR_CLASS: &str = "dashAnchor";

static CONTENT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(CONTENT_SELECTOR).expect("valid selector"));
static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("valid selector"));

/// Characters kept verbatim in anchor names: alphanumerics and `_.-~/`.
const ANCHOR_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

const HEADINGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

struct TocRule {
    tag: &'static str,
    /// Most recent heading at this level must have had exactly this text.
    after: Option<(&'static str, &'static str)>,
    anchor: AnchorType,
}

impl TocRule {
    const fn any(tag: &'static str, anchor: AnchorType) -> Self {
        Self { tag, after: None, anchor }
    }

    const fn after(tag: &'static str, parent: &'static str, text: &'static str, anchor: AnchorType) -> Self {
        Self { tag, after: Some((parent, text)), anchor }
    }

    fn matches(&self, tag: &str, memory: &HashMap<&str, String>) -> bool {
        if self.tag != tag {
            return false;
        }
        match self.after {
            None => true,
            Some((parent, text)) => memory.get(parent).is_some_and(|seen| seen == text),
        }
    }
}

/// First match wins.
static TOC_RULES: [TocRule; 9] = [
    TocRule::any("h2", AnchorType::Section),
    TocRule::after("h3", "h2", "Construct Props", AnchorType::Attribute),
    TocRule::after("h3", "h2", "Methods", AnchorType::Method),
    TocRule::after("h3", "h2", "Properties", AnchorType::Property),
    TocRule::after("h3", "h2", "Members", AnchorType::Value),
    TocRule::any("h3", AnchorType::Guide),
    TocRule::any("h4", AnchorType::Guide),
    TocRule::any("h5", AnchorType::Guide),
    TocRule::any("h6", AnchorType::Guide),
];

/// One heading anchor that was embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocAnchor {
    pub anchor_type: AnchorType,
    /// Heading text, trimmed.
    pub text: String,
    /// Value written to the anchor's `name` attribute.
    pub name: String,
}

/// Anchor type for a heading `tag`, given the last text seen per heading level.
pub fn anchor_type(tag: &str, memory: &HashMap<&str, String>) -> Option<AnchorType> {
    TOC_RULES
        .iter()
        .find(|rule| rule.matches(tag, memory))
        .map(|rule| rule.anchor)
}

/// `//apple_ref/cpp/<Type>/<escaped text>`.
pub fn anchor_name(anchor_type: AnchorType, text: &str) -> String {
    format!(
        "//apple_ref/cpp/{anchor_type}/{}",
        utf8_percent_encode(text, ANCHOR_ESCAPE)
    )
}

/// Embed TOC anchors into the content block of `html`.
pub fn embed_toc(html: &mut Html, page: &str) -> Result<Vec<TocAnchor>> {
    let content = html
        .select(&CONTENT)
        .next()
        .ok_or_else(|| DocsetError::missing(CONTENT_SELECTOR, page))?;

    let mut memory: HashMap<&str, String> = HashMap::new();
    let mut edits = Vec::new();

    for child in content.children().filter_map(ElementRef::wrap) {
        let tag = child.value().name();
        let Some(&level) = HEADINGS.iter().find(|h| **h == tag) else {
            continue;
        };
        let text = dom::text_of(child).trim().to_string();

        if let Some(kind) = anchor_type(level, &memory) {
            match child.select(&ANCHOR).next() {
                Some(a) => {
                    let anchor = TocAnchor {
                        anchor_type: kind,
                        name: anchor_name(kind, &text),
                        text: text.clone(),
                    };
                    edits.push((a.id(), anchor));
                }
                None => debug!(page, heading = %text, "heading has no anchor"),
            }
        }

        memory.insert(level, text);
    }

    let mut anchors = Vec::with_capacity(edits.len());
    for (id, anchor) in edits {
        if let Some(mut node) = html.tree.get_mut(id) {
            dom::set_attr(node.value(), "name", &anchor.name);
            dom::add_class(node.value(), ANCHOR_CLASS);
        }
        anchors.push(anchor);
    }

    debug!(page, anchors = anchors.len(), "toc embedded");
    Ok(anchors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{fixture, sel};

    fn content(body: &str) -> Html {
        Html::parse_document(&format!(
            "<html><body><article><div><span>{body}</span></div></article></body></html>"
        ))
    }

    #[test]
    fn h3_type_follows_preceding_h2() {
        let mut html = content(
            r#"<h2><a class="anchor" id="methods"></a>Methods</h2>
               <h3><a class="anchor" id="foo"></a>Foo</h3>
               <h2><a class="anchor" id="properties"></a>Properties</h2>
               <h3><a class="anchor" id="foo-1"></a>Foo</h3>"#,
        );
        let anchors = embed_toc(&mut html, "p.html").unwrap();
        let kinds: Vec<_> = anchors.iter().map(|a| (a.anchor_type, a.text.as_str())).collect();
        assert_eq!(
            kinds,
            vec![
                (AnchorType::Section, "Methods"),
                (AnchorType::Method, "Foo"),
                (AnchorType::Section, "Properties"),
                (AnchorType::Property, "Foo"),
            ]
        );
    }

    #[test]
    fn all_h2_dependent_rules() {
        for (h2, expected) in [
            ("Construct Props", AnchorType::Attribute),
            ("Methods", AnchorType::Method),
            ("Properties", AnchorType::Property),
            ("Members", AnchorType::Value),
            ("Example", AnchorType::Guide),
        ] {
            let memory = HashMap::from([("h2", h2.to_string())]);
            assert_eq!(anchor_type("h3", &memory), Some(expected), "after {h2}");
        }
    }

    #[test]
    fn unconditional_rules() {
        let memory = HashMap::new();
        assert_eq!(anchor_type("h2", &memory), Some(AnchorType::Section));
        assert_eq!(anchor_type("h3", &memory), Some(AnchorType::Guide));
        assert_eq!(anchor_type("h6", &memory), Some(AnchorType::Guide));
        assert_eq!(anchor_type("h1", &memory), None);
        assert_eq!(anchor_type("p", &memory), None);
    }

    #[test]
    fn memory_is_single_slot_per_level() {
        let mut html = content(
            r#"<h2><a></a>Methods</h2>
               <h2><a></a>Examples</h2>
               <h3><a></a>grantRead()</h3>"#,
        );
        let anchors = embed_toc(&mut html, "p.html").unwrap();
        assert_eq!(anchors[2].anchor_type, AnchorType::Guide);
    }

    #[test]
    fn nested_headings_are_not_walked() {
        let mut html = content(r#"<div><h2><a></a>Hidden</h2></div><h2><a></a>Shown</h2>"#);
        let anchors = embed_toc(&mut html, "p.html").unwrap();
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].text, "Shown");
    }

    #[test]
    fn anchor_attributes_are_written() {
        let mut html = content(r#"<h2><a class="anchor" id="x"></a>Construct Props</h2>"#);
        embed_toc(&mut html, "p.html").unwrap();

        let reparsed = Html::parse_document(&html.html());
        let a = reparsed.select(&sel("h2 > a")).next().unwrap();
        assert_eq!(
            a.value().attr("name"),
            Some("//apple_ref/cpp/Section/Construct%20Props")
        );
        assert_eq!(a.value().attr("class"), Some("anchor dashAnchor"));
        assert_eq!(a.value().attr("id"), Some("x"));
    }

    #[test]
    fn anchor_names_escape_like_urls() {
        assert_eq!(
            anchor_name(AnchorType::Method, "grantRead(identity, objectsKeyPattern?)"),
            "//apple_ref/cpp/Method/grantRead%28identity%2C%20objectsKeyPattern%3F%29"
        );
        assert_eq!(
            anchor_name(AnchorType::Guide, "a/b_c.d-e~f"),
            "//apple_ref/cpp/Guide/a/b_c.d-e~f"
        );
    }

    #[test]
    fn heading_without_anchor_is_skipped() {
        let mut html = content(r#"<h2>Plain</h2><h3><a></a>Next</h3>"#);
        let anchors = embed_toc(&mut html, "p.html").unwrap();
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].text, "Next");
    }

    #[test]
    fn missing_content_block_is_fatal() {
        let mut html = Html::parse_document("<html><body><h2>x</h2></body></html>");
        let err = embed_toc(&mut html, "p.html").unwrap_err();
        assert!(matches!(err, DocsetError::MissingElement { .. }));
    }

    #[test]
    fn fixture_page_anchors() {
        let mut html = Html::parse_document(&fixture("bucket.html"));
        crate::chrome::strip_chrome(&mut html, "bucket.html").unwrap();
        let anchors = embed_toc(&mut html, "bucket.html").unwrap();
        assert!(anchors.contains(&TocAnchor {
            anchor_type: AnchorType::Property,
            text: "bucketArn".to_string(),
            name: "//apple_ref/cpp/Property/bucketArn".to_string(),
        }));
        assert!(anchors.iter().any(|a| a.anchor_type == AnchorType::Method
            && a.text == "addToResourcePolicy(permission)"));
        assert!(anchors.iter().any(|a| a.anchor_type == AnchorType::Attribute));
    }
}
