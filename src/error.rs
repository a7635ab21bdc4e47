//! Centralized error handling for treebin.
//!
//! Every failure in a serialization or deserialization pass is reported through
//! [`TreeBinError`]. The library never panics: structural problems are detected at
//! the point where they happen and returned through `Result`, carrying the scope
//! path that was active at that moment.
//!
//! ## Error Categories
//!
//! - **Structural write errors** ([`TreeBinError::DuplicateKey`]): a field name was
//!   pushed twice into the same tree node.
//! - **Structural read errors** ([`TreeBinError::MissingField`],
//!   [`TreeBinError::TypeMismatch`], [`TreeBinError::ValueMismatch`],
//!   [`TreeBinError::InvalidRange`]): the parsed tree does not match the shape the
//!   reading type describes.
//! - **File errors** ([`TreeBinError::FileAccess`]): the backing file could not be
//!   opened, read or written.
//! - **Format errors** ([`TreeBinError::Format`]): the file bytes are not a valid
//!   text + NUL + binary document.
//!
//! ## Scope Paths
//!
//! Structural variants carry a `path` rendered innermost first, e.g.
//! `street <- home <- Person`. The path reflects the scope stack exactly at the
//! point of failure.
//!
//! ```rust
//! use treebin::{TreeBin, TreeBinError, Transfer};
//!
//! #[derive(Default, Transfer)]
//! struct Config { retries: u32 }
//!
//! let mut bytes = TreeBin::to_bytes(&Config { retries: 3 })?;
//! // Corrupt the text so that `retries` is no longer present.
//! let pos = bytes.iter().position(|b| *b == b'r').unwrap_or(0);
//! bytes[pos] = b'R';
//!
//! if let Err(TreeBinError::MissingField { key, path }) = TreeBin::from_bytes::<Config>(&bytes) {
//!     assert_eq!(key, "retries");
//!     assert_eq!(path, "Config");
//! }
//! # Ok::<(), TreeBinError>(())
//! ```

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// A specialized `Result` type for treebin operations.
pub type Result<T> = std::result::Result<T, TreeBinError>;

/// The master error enum covering every failure domain of a transfer pass.
///
/// This type is `Clone`; I/O errors are wrapped in `Arc` so the error can be stored
/// or shared without losing the original cause.
#[derive(Debug, Clone)]
pub enum TreeBinError {
    /// A write attempted to set a field name already present at the current node.
    DuplicateKey {
        /// The offending field name.
        key: String,
        /// Scope path at the point of failure, innermost first.
        path: String,
    },

    /// A read attempted to consume a field that the current node does not hold.
    ///
    /// Covers both missing primitive fields and missing composite scopes, and
    /// fields that were already consumed earlier in the same pass.
    MissingField {
        /// The missing field name.
        key: String,
        /// Scope path at the point of failure, innermost first.
        path: String,
    },

    /// A present field could not be converted to the requested type.
    TypeMismatch {
        /// The field being read.
        key: String,
        /// Name of the requested type.
        expected: &'static str,
        /// Conversion failure reported by the tree layer.
        detail: String,
        /// Scope path at the point of failure, innermost first.
        path: String,
    },

    /// A checked read found a value different from the expected one.
    ValueMismatch {
        /// The field being checked.
        key: String,
        /// Debug rendering of the expected value.
        expected: String,
        /// Debug rendering of the value actually stored.
        found: String,
        /// Scope path at the point of failure, innermost first.
        path: String,
    },

    /// A binary region is malformed or points past the end of the shared buffer.
    InvalidRange {
        /// Stored region start.
        begin: u64,
        /// Stored region end (exclusive).
        end: u64,
        /// Length of the binary buffer for this pass.
        len: u64,
        /// Scope path at the point of failure, innermost first.
        path: String,
    },

    /// The backing file could not be opened, read or written.
    FileAccess {
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O failure.
        source: Arc<io::Error>,
    },

    /// The document bytes do not follow the text + NUL + binary layout.
    Format(String),
}

impl TreeBinError {
    /// Wraps an I/O failure on `path`.
    pub fn file_access(path: impl Into<PathBuf>, err: io::Error) -> Self {
        Self::FileAccess {
            path: path.into(),
            source: Arc::new(err),
        }
    }

    /// Returns the scope path of a structural error, if the variant carries one.
    pub fn scope_path(&self) -> Option<&str> {
        match self {
            Self::DuplicateKey { path, .. }
            | Self::MissingField { path, .. }
            | Self::TypeMismatch { path, .. }
            | Self::ValueMismatch { path, .. }
            | Self::InvalidRange { path, .. } => Some(path),
            Self::FileAccess { .. } | Self::Format(_) => None,
        }
    }

    /// True when the error is a `FileAccess` caused by a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::FileAccess { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

impl fmt::Display for TreeBinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateKey { key, path } => {
                write!(f, "Duplicate Key: `{key}` already in use (at {path})")
            }
            Self::MissingField { key, path } => {
                write!(f, "Missing Field: `{key}` does not exist (at {path})")
            }
            Self::TypeMismatch {
                key,
                expected,
                detail,
                path,
            } => write!(
                f,
                "Type Mismatch: `{key}` is not a valid {expected}: {detail} (at {path})"
            ),
            Self::ValueMismatch {
                key,
                expected,
                found,
                path,
            } => write!(
                f,
                "Value Mismatch: `{key}` expected {expected}, found {found} (at {path})"
            ),
            Self::InvalidRange {
                begin,
                end,
                len,
                path,
            } => write!(
                f,
                "Invalid Range: binary region [{begin}, {end}) outside buffer of {len} bytes (at {path})"
            ),
            Self::FileAccess { path, source } => {
                write!(f, "File Access Error: {}: {source}", path.display())
            }
            Self::Format(s) => write!(f, "Format Error: {s}"),
        }
    }
}

impl std::error::Error for TreeBinError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FileAccess { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_scope_path() {
        let err = TreeBinError::MissingField {
            key: "zip".into(),
            path: "home <- Person".into(),
        };
        assert_eq!(
            err.to_string(),
            "Missing Field: `zip` does not exist (at home <- Person)"
        );
        assert_eq!(err.scope_path(), Some("home <- Person"));
    }

    #[test]
    fn file_access_exposes_source() {
        use std::error::Error;

        let err = TreeBinError::file_access(
            "missing.tb",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.is_not_found());
        assert!(err.source().is_some());
        assert!(err.scope_path().is_none());
    }
}
