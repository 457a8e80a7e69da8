//! Error types for the docset builder.
//!
//! Library crates use [`DocsetError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all docset operations.
#[derive(Debug, thiserror::Error)]
pub enum DocsetError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while retrieving a page or asset.
    #[error("network error: {0}")]
    Network(String),

    /// HTML parsing or content extraction error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Index store error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (malformed docset, bad arguments, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The published documentation is not the version the caller asked for.
    #[error("page version is {actual}; expected {expected}")]
    VersionMismatch { expected: String, actual: String },

    /// A page is missing an element the transformer depends on.
    ///
    /// This means the upstream page template changed and the build must stop.
    #[error("page {page} has no element matching `{selector}`")]
    MissingElement { selector: String, page: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocsetError>;

impl DocsetError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// A required structural element is absent from `page`.
    pub fn missing(selector: impl Into<String>, page: impl Into<String>) -> Self {
        Self::MissingElement {
            selector: selector.into(),
            page: page.into(),
        }
    }

    /// Version marker on a page differs from the expected one.
    pub fn version_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::VersionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}
