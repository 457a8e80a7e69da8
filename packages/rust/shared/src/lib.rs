//! Shared types, error model, and configuration for the CDK docset builder.
//!
//! This crate is the foundation depended on by all other workspace crates.
//! It provides:
//! - [`DocsetError`]: the unified error type
//! - Domain types ([`EntryType`], [`AnchorType`], [`Entry`], [`DocsetMeta`])
//! - Configuration ([`AppConfig`], [`SiteConfig`], config loading)
//! - [`write_atomic`] for page and asset output

pub mod config;
pub mod error;
pub mod fs;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DocsetConfig, FetchConfig, SiteConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{DocsetError, Result};
pub use fs::{write_atomic, write_atomic_with};
pub use types::{AnchorType, DocsetMeta, Entry, EntryType};
