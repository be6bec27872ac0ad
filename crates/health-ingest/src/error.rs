//! Error types for health export ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading an export source.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Source directory not found or not a directory.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Source file not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Parsing Errors ===
    /// XML could not be read at the given byte offset.
    #[error("failed to parse XML {path} at byte {position}: {source}")]
    Xml {
        path: PathBuf,
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    /// A header field required to build a record is absent.
    #[error("required field '{field}' not found in {path}")]
    MissingField { field: String, path: PathBuf },
}

impl IngestError {
    /// Maps an I/O error from opening `path` to the matching variant.
    pub(crate) fn open(path: &std::path::Path, error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::FileRead {
                path: path.to_path_buf(),
                source: error,
            }
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
