//! Core domain types for docset index entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// EntryType
// ---------------------------------------------------------------------------

/// Semantic kind of a documentation page, as understood by the docset browser.
///
/// The string forms are the Dash entry type names written to `searchIndex.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    Module,
    /// Generated low-level resource wrapper (`Cfn*` construct).
    Resource,
    /// Hand-authored construct.
    Constructor,
    Class,
    Enum,
    /// `I`-prefixed capability interface.
    Interface,
    /// Construct property bag (`*Props`).
    Property,
    /// Plain data-shape interface.
    Struct,
    Guide,
}

impl EntryType {
    /// All entry types, in classification precedence order.
    pub const ALL: [EntryType; 9] = [
        EntryType::Module,
        EntryType::Resource,
        EntryType::Constructor,
        EntryType::Class,
        EntryType::Enum,
        EntryType::Interface,
        EntryType::Property,
        EntryType::Struct,
        EntryType::Guide,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Module => "Module",
            EntryType::Resource => "Resource",
            EntryType::Constructor => "Constructor",
            EntryType::Class => "Class",
            EntryType::Enum => "Enum",
            EntryType::Interface => "Interface",
            EntryType::Property => "Property",
            EntryType::Struct => "Struct",
            EntryType::Guide => "Guide",
        }
    }

    /// Whether the index name of this type is derived from the page path.
    pub fn is_symbol(self) -> bool {
        !matches!(self, EntryType::Guide | EntryType::Module)
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        EntryType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown entry type: {s}"))
    }
}

// ---------------------------------------------------------------------------
// AnchorType
// ---------------------------------------------------------------------------

/// Kind assigned to an in-page heading anchor (the page's own table of contents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnchorType {
    Section,
    Attribute,
    Method,
    Property,
    Value,
    Guide,
}

impl AnchorType {
    pub fn as_str(self) -> &'static str {
        match self {
            AnchorType::Section => "Section",
            AnchorType::Attribute => "Attribute",
            AnchorType::Method => "Method",
            AnchorType::Property => "Property",
            AnchorType::Value => "Value",
            AnchorType::Guide => "Guide",
        }
    }
}

impl std::fmt::Display for AnchorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// One row of the docset lookup index.
///
/// Created once per processed page and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    /// Canonical display name.
    pub name: String,
    /// Semantic kind.
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// Page path relative to the docset `Documents/` directory (no leading slash).
    pub relative_path: String,
}

impl Entry {
    pub fn new(
        name: impl Into<String>,
        entry_type: EntryType,
        relative_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            entry_type,
            relative_path: relative_path.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// DocsetMeta
// ---------------------------------------------------------------------------

/// The `meta.json` written next to a built docset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsetMeta {
    /// Docset name (e.g. `AWS-CDK`).
    pub name: String,
    /// Upstream documentation version the docset was built from.
    pub version: String,
    /// When the build finished.
    pub built_at: DateTime<Utc>,
    /// Number of index rows after the build.
    pub entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_type_string_roundtrip() {
        for t in EntryType::ALL {
            let parsed: EntryType = t.as_str().parse().expect("parse entry type");
            assert_eq!(parsed, t);
        }
        assert!("Widget".parse::<EntryType>().is_err());
    }

    #[test]
    fn symbol_types_exclude_guide_and_module() {
        assert!(!EntryType::Guide.is_symbol());
        assert!(!EntryType::Module.is_symbol());
        assert!(EntryType::Resource.is_symbol());
        assert!(EntryType::Struct.is_symbol());
    }

    #[test]
    fn entry_serializes_type_field() {
        let entry = Entry::new("s3 Bucket", EntryType::Constructor, "cdk/api/v2/docs/x.html");
        let json = serde_json::to_string(&entry).expect("serialize");
        assert!(json.contains(r#""type":"Constructor""#));
    }
}
