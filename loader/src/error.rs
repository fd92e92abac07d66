//! Error types for document loading.
//!
//! Covers filesystem and parse failures, invalid or duplicate document
//! names, malformed base schema files, and compile errors raised when a
//! loaded set is handed to the compiler.

use std::path::PathBuf;

use content_blocks_core::CompileError;
use thiserror::Error;

/// Errors that can occur while loading content block documents.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error in {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A document name does not match `vendor/package` in lowercase.
    #[error("invalid content block name \"{name}\" in {}; expected \"vendor/package\" using a-z, 0-9 and dashes", .path.display())]
    InvalidDocumentName { name: String, path: PathBuf },

    /// Two documents share one name.
    #[error("content block \"{name}\" is defined twice: {} and {}", .first.display(), .second.display())]
    DuplicateDocument {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// A directory name does not map to a content type kind.
    #[error("\"{name}\" is not a content type directory; expected one of ContentElements, PageTypes, RecordTypes, FileTypes")]
    UnknownContentTypeDirectory { name: String },

    /// No document source was configured.
    #[error("no content block sources configured")]
    NoSourcesAvailable,

    /// A base schema file names an unknown type.
    #[error("invalid base schema: {0}")]
    InvalidBaseSchema(String),

    /// The loaded documents failed to compile.
    #[error(transparent)]
    Compile(#[from] CompileError),
}

impl LoaderError {
    pub(crate) fn yaml(path: impl Into<PathBuf>, source: serde_yaml::Error) -> Self {
        Self::Yaml {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias for results with [`LoaderError`].
pub type Result<T> = std::result::Result<T, LoaderError>;
