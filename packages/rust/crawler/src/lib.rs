//! Retrieval side of the docset builder.
//!
//! This crate provides:
//! - [`Fetcher`]: HTTP client bound to the documentation site
//! - [`list_toc`] / [`online_version`]: the table-of-contents page and its version marker
//! - [`download_all`]: concurrent, resumable mirror download

mod client;
mod download;
mod listing;

pub use client::Fetcher;
pub use download::{DownloadReport, download_all, mirror_path};
pub use listing::{STATIC_ASSETS, list_toc, online_version, toc_links, work_list};
