//! Title classifier: heading text → [`EntryType`].
//!
//! A title is reduced to a [`TitleShape`] (lowercased, punctuation and
//! decorative glyphs removed) and then run through an ordered rule table.
//! The first matching rule wins, so the table order is the precedence:
//! the module suffix beats everything, construct suffixes beat plain
//! class/interface prefixes, and `Cfn` variants come before general ones.

use std::sync::LazyLock;

use regex::Regex;

use cdkdocset_shared::EntryType;

/// Anything that is not an ASCII letter, digit or whitespace.
static DECORATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9\s]+").expect("valid regex"));

// ---------------------------------------------------------------------------
// TitleShape
// ---------------------------------------------------------------------------

/// Normalized view of a page title used by the classification rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleShape {
    /// Tokens with their original case, decorations removed.
    words: Vec<String>,
    /// Lowercased tokens joined by single spaces.
    normalized: String,
}

impl TitleShape {
    pub fn new(title: &str) -> Self {
        let stripped = DECORATION_RE.replace_all(title, "");
        let words: Vec<String> = stripped.split_whitespace().map(str::to_string).collect();
        let normalized = words.join(" ").to_lowercase();
        Self { words, normalized }
    }

    /// Full normalized title, e.g. `class jobqueue construct`.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// First normalized token, or `""` for an empty title.
    pub fn first(&self) -> &str {
        self.normalized.split(' ').next().unwrap_or("")
    }

    /// Last normalized token, or `""` for an empty title.
    pub fn last(&self) -> &str {
        self.normalized.rsplit(' ').next().unwrap_or("")
    }

    /// Symbol name following the keyword, with its original case.
    fn symbol(&self) -> Option<&str> {
        self.words.get(1).map(String::as_str)
    }

    fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// One row of the classification table.
struct Rule {
    name: &'static str,
    matches: fn(&TitleShape) -> bool,
    result: EntryType,
}

/// Classification table, evaluated top to bottom. Do not reorder.
static RULES: [Rule; 9] = [
    Rule {
        name: "module-suffix",
        matches: is_module,
        result: EntryType::Module,
    },
    Rule {
        name: "cfn-construct",
        matches: is_cfn_construct,
        result: EntryType::Resource,
    },
    Rule {
        name: "construct",
        matches: is_construct,
        result: EntryType::Constructor,
    },
    Rule {
        name: "class",
        matches: is_class,
        result: EntryType::Class,
    },
    Rule {
        name: "enum",
        matches: is_enum,
        result: EntryType::Enum,
    },
    Rule {
        name: "capability-interface",
        matches: is_capability_interface,
        result: EntryType::Interface,
    },
    Rule {
        name: "cfn-props",
        matches: is_cfn_props,
        result: EntryType::Property,
    },
    Rule {
        name: "props",
        matches: is_props,
        result: EntryType::Property,
    },
    Rule {
        name: "interface",
        matches: is_interface,
        result: EntryType::Struct,
    },
];

fn is_module(t: &TitleShape) -> bool {
    t.last() == "module"
}

fn is_cfn_construct(t: &TitleShape) -> bool {
    is_class(t) && t.normalized().starts_with("class cfn") && t.last() == "construct"
}

fn is_construct(t: &TitleShape) -> bool {
    t.last() == "construct"
}

fn is_class(t: &TitleShape) -> bool {
    t.first() == "class"
}

fn is_enum(t: &TitleShape) -> bool {
    t.first() == "enum"
}

fn is_interface(t: &TitleShape) -> bool {
    t.first() == "interface"
}

/// `interface IFoo`: the `I` prefix must be followed by an upper-case letter,
/// otherwise names such as `IntegrationProps` would be mistaken for capabilities.
fn is_capability_interface(t: &TitleShape) -> bool {
    if !is_interface(t) || !t.normalized().starts_with("interface i") {
        return false;
    }
    let mut chars = t.symbol().unwrap_or("").chars();
    chars.next() == Some('I') && chars.next().is_some_and(|c| c.is_ascii_uppercase())
}

fn is_cfn_props(t: &TitleShape) -> bool {
    is_interface(t)
        && t.normalized().starts_with("interface cfn")
        && t.normalized().ends_with("props")
}

fn is_props(t: &TitleShape) -> bool {
    is_interface(t) && t.normalized().ends_with("props")
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Classify a page title. Never fails; unrecognized titles are guides.
pub fn classify(title: &str) -> EntryType {
    classify_with_rule(title).0
}

/// Classify a page title and report which rule decided it (`"fallback"` if none).
pub fn classify_with_rule(title: &str) -> (EntryType, &'static str) {
    let shape = TitleShape::new(title);
    if shape.is_empty() {
        return (EntryType::Guide, "fallback");
    }

    RULES
        .iter()
        .find(|rule| (rule.matches)(&shape))
        .map(|rule| (rule.result, rule.name))
        .unwrap_or((EntryType::Guide, "fallback"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_titles() {
        let cases = [
            ("class CfnCertificate (construct)", EntryType::Resource),
            ("class CfnAccount (construct)", EntryType::Resource),
            ("class JobQueue (construct)", EntryType::Constructor),
            ("class JobQueue (construct) 🔹", EntryType::Constructor),
            ("interface IJobQueue", EntryType::Interface),
            ("interface IJobQueue 🔹", EntryType::Interface),
            ("enum JsonSchemaType", EntryType::Enum),
            ("aws-cdk-lib.aws_appintegrations module", EntryType::Module),
            ("@aws-cdk/aws-batch-alpha module", EntryType::Module),
            ("interface JobDefinitionProps", EntryType::Property),
            ("interface CfnAlertProps", EntryType::Property),
            ("interface GatewayResponseProps", EntryType::Property),
            ("interface BucketAttributes", EntryType::Struct),
            ("class Duration", EntryType::Class),
            ("AWS Construct Library", EntryType::Guide),
        ];

        for (title, expect) in cases {
            assert_eq!(classify(title), expect, "title: {title}");
        }
    }

    #[test]
    fn decoration_does_not_change_classification() {
        let plain = classify("class JobQueue (construct)");
        assert_eq!(classify("class JobQueue (construct) 🔹"), plain);
        assert_eq!(classify("class JobQueue (construct) Ⓔ"), plain);
        assert_eq!(classify("  class   JobQueue\n(construct)  "), plain);
    }

    #[test]
    fn module_suffix_beats_class_prefix() {
        assert_eq!(classify("class module"), EntryType::Module);
        assert_eq!(classify("class Foo (construct) module"), EntryType::Module);
    }

    #[test]
    fn construct_suffix_beats_interface_prefix() {
        assert_eq!(classify("interface IThing (construct)"), EntryType::Constructor);
    }

    #[test]
    fn cfn_prefix_only_matters_for_classes_with_construct_suffix() {
        assert_eq!(classify("class CfnParameter"), EntryType::Class);
        assert_eq!(classify("class CfnBucket (construct)"), EntryType::Resource);
    }

    #[test]
    fn i_prefix_requires_capitalized_symbol() {
        assert_eq!(classify("interface IntegrationProps"), EntryType::Property);
        assert_eq!(classify("interface Integration"), EntryType::Struct);
        assert_eq!(classify("interface IBucket"), EntryType::Interface);
    }

    #[test]
    fn empty_and_symbol_only_titles_are_guides() {
        assert_eq!(classify(""), EntryType::Guide);
        assert_eq!(classify("   "), EntryType::Guide);
        assert_eq!(classify("🔹 ()"), EntryType::Guide);
    }

    #[test]
    fn reports_deciding_rule() {
        assert_eq!(
            classify_with_rule("class CfnBucket (construct)"),
            (EntryType::Resource, "cfn-construct")
        );
        assert_eq!(classify_with_rule("Getting started"), (EntryType::Guide, "fallback"));
    }

    #[test]
    fn shape_tokens() {
        let shape = TitleShape::new("class JobQueue (construct) 🔹");
        assert_eq!(shape.normalized(), "class jobqueue construct");
        assert_eq!(shape.first(), "class");
        assert_eq!(shape.last(), "construct");

        let empty = TitleShape::new("");
        assert_eq!(empty.first(), "");
        assert_eq!(empty.last(), "");
    }
}
