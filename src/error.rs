//! Error types for document loading and export.
//!
//! The parser itself is infallible: unrecognized input is omitted and
//! non-fatal findings surface as diagnostics. Errors exist only at the
//! edges - reading files and serializing or merging on export.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while reading a document from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        3 // IO
    }
}

/// Errors while exporting the model.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("schema \"{name}\" registered with conflicting shapes")]
    SchemaConflict { name: String },
}

impl ExportError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2 // Data error
    }
}
