//! Document loading for the command-line surface.
//!
//! The core parser consumes text it is handed and performs no I/O of its
//! own; reading files is the CLI's concern.

use std::path::Path;

use crate::error::LoadError;

/// Read a documentation export from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::ReadError` if it cannot be read.
pub fn load_document(path: &Path) -> Result<String, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })
}
