//! Page classification and canonical naming.
//!
//! This crate provides:
//! - [`classify`]: maps a page heading to an [`EntryType`]
//! - [`canonical_name`]: derives the index name for a classified page
//! - [`page_stem`]: the fully qualified symbol name encoded in a page path
//!
//! Both entry points are pure and total: unknown titles fall back to
//! [`EntryType::Guide`] and unknown prefixes are left in place.

mod naming;
mod title;

pub use naming::{canonical_name, page_stem};
pub use title::{TitleShape, classify, classify_with_rule};

pub use cdkdocset_shared::EntryType;
