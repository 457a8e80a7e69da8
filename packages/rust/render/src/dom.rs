//! In-place edits on a parsed [`Html`] tree.
//!
//! `scraper` parses into an arena (`Html::tree`) that can be edited through
//! node ids. Rebuilt and new nodes are made from the parser's own types, so
//! attribute namespaces and foreign-content names come through untouched.

use html5ever::tendril::StrTendril;
use html5ever::{Attribute, LocalName, QualName, namespace_url, ns};
use scraper::node::{Comment, Element, Node, Text};
use scraper::{ElementRef, Html, Selector};

/// Detach every element matching `selector`. Returns how many were removed.
pub(crate) fn remove_all(html: &mut Html, selector: &Selector) -> usize {
    let ids: Vec<_> = html.select(selector).map(|el| el.id()).collect();
    for id in &ids {
        if let Some(mut node) = html.tree.get_mut(*id) {
            node.detach();
        }
    }
    ids.len()
}

/// Detach the first element matching `selector`. Returns `false` if none matched.
pub(crate) fn remove_first(html: &mut Html, selector: &Selector) -> bool {
    let Some(id) = html.select(selector).next().map(|el| el.id()) else {
        return false;
    };
    if let Some(mut node) = html.tree.get_mut(id) {
        node.detach();
    }
    true
}

/// Set `name=value` on the first element matching `selector`.
/// Returns `false` if none matched.
pub(crate) fn set_attr_first(html: &mut Html, selector: &Selector, name: &str, value: &str) -> bool {
    let Some(id) = html.select(selector).next().map(|el| el.id()) else {
        return false;
    };
    if let Some(mut node) = html.tree.get_mut(id) {
        set_attr(node.value(), name, value);
    }
    true
}

/// Set (or replace) an attribute on an element node. Non-elements are ignored.
///
/// An existing attribute is matched on its local name and keeps its namespace.
pub(crate) fn set_attr(node: &mut Node, name: &str, value: &str) {
    let Node::Element(element) = node else {
        return;
    };

    let mut attrs: Vec<Attribute> = element
        .attrs
        .iter()
        .map(|(qual, v)| Attribute {
            name: qual.clone(),
            value: StrTendril::from(&**v),
        })
        .collect();
    match attrs.iter_mut().find(|a| &*a.name.local == name) {
        Some(slot) => slot.value = StrTendril::from(value),
        None => attrs.push(Attribute {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value: StrTendril::from(value),
        }),
    }

    // Element caches its id and classes, so edits go through a fresh one.
    *element = Element::new(element.name.clone(), attrs);
}

/// Add `class` to an element's class list if it is not already there.
pub(crate) fn add_class(node: &mut Node, class: &str) {
    let updated = {
        let Node::Element(element) = &*node else {
            return;
        };
        let current = element.attr("class").unwrap_or("").trim();
        if current.split_whitespace().any(|c| c == class) {
            return;
        }
        if current.is_empty() {
            class.to_string()
        } else {
            format!("{current} {class}")
        }
    };
    set_attr(node, "class", &updated);
}

/// All text beneath an element, concatenated.
pub(crate) fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// A detached HTML `<tag>` element and the text node to put inside it.
pub(crate) fn new_element(tag: &str, text: &str) -> (Node, Node) {
    let element = Element::new(QualName::new(None, ns!(html), LocalName::from(tag)), Vec::new());
    let text = Text { text: text.into() };
    (Node::Element(element), Node::Text(text))
}

/// A detached `<!--text-->` comment node.
pub(crate) fn new_comment(text: &str) -> Node {
    Node::Comment(Comment {
        comment: text.replace("--", "- -").as_str().into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(s: &str) -> Selector {
        Selector::parse(s).unwrap()
    }

    #[test]
    fn remove_all_detaches_matches() {
        let mut html = Html::parse_document(
            "<html><body><script>a()</script><p>keep</p><script>b()</script></body></html>",
        );
        assert_eq!(remove_all(&mut html, &sel("script")), 2);
        let out = html.html();
        assert!(!out.contains("<script"));
        assert!(out.contains("<p>keep</p>"));
    }

    #[test]
    fn remove_first_reports_absence() {
        let mut html = Html::parse_document("<html><body><p>x</p></body></html>");
        assert!(!remove_first(&mut html, &sel("footer")));
        assert!(remove_first(&mut html, &sel("p")));
        assert!(!html.html().contains("<p>"));
    }

    #[test]
    fn set_attr_replaces_and_keeps_children() {
        let mut html = Html::parse_document(
            r#"<html><body><a id="x" href="/old" class="c">link <b>text</b></a></body></html>"#,
        );
        assert!(set_attr_first(&mut html, &sel("a"), "href", "new.html"));

        let reparsed = Html::parse_document(&html.html());
        let a = reparsed.select(&sel("a")).next().unwrap();
        assert_eq!(a.value().attr("href"), Some("new.html"));
        assert_eq!(a.value().attr("id"), Some("x"));
        assert_eq!(a.value().name(), "a");
        assert_eq!(text_of(a), "link text");
    }

    #[test]
    fn set_attr_round_trips_special_characters() {
        let mut html = Html::parse_document("<html><body><div></div></body></html>");
        set_attr_first(&mut html, &sel("div"), "title", r#"a "quoted" & value"#);

        let reparsed = Html::parse_document(&html.html());
        let div = reparsed.select(&sel("div")).next().unwrap();
        assert_eq!(div.value().attr("title"), Some(r#"a "quoted" & value"#));
    }

    #[test]
    fn add_class_appends_once() {
        let mut html = Html::parse_document(r#"<html><body><a class="anchor"></a></body></html>"#);
        let id = html.select(&sel("a")).next().unwrap().id();
        for _ in 0..2 {
            let mut node = html.tree.get_mut(id).unwrap();
            add_class(node.value(), "dashAnchor");
        }
        let reparsed = Html::parse_document(&html.html());
        let a = reparsed.select(&sel("a")).next().unwrap();
        assert_eq!(a.value().attr("class"), Some("anchor dashAnchor"));
    }

    #[test]
    fn new_nodes_are_built_detached() {
        let (span, text) = new_element("span", "a < b");
        assert!(span.is_element());
        assert_eq!(span.as_element().map(|e| e.name()), Some("span"));
        assert_eq!(text.as_text().map(|t| &**t), Some("a < b"));

        let comment = new_comment("Online page at https://example.com/x.html");
        assert!(comment.is_comment());
        assert_eq!(
            new_comment("a -- b").as_comment().map(|c| &**c),
            Some("a - - b")
        );
    }

    #[test]
    fn set_attr_keeps_foreign_attributes() {
        let mut html = Html::parse_document(
            r#"<html><body><svg viewBox="0 0 10 10"><a href="/old" xlink:title="t" pathLength="4"></a></svg></body></html>"#,
        );
        let id = html.select(&sel("svg a")).next().unwrap().id();
        set_attr(html.tree.get_mut(id).unwrap().value(), "href", "new.html");

        let a = html.tree.get(id).unwrap().value().as_element().unwrap();
        assert_eq!(a.attr("href"), Some("new.html"));
        let title = a.attrs.iter().find(|(q, _)| &*q.local == "title").unwrap();
        assert_eq!(title.0.ns, ns!(xlink));
        assert!(a.attrs.iter().any(|(q, _)| &*q.local == "pathLength"));
        assert_eq!(a.name.ns, ns!(svg));
    }
}
