//! Error types for archive expansion

use thiserror::Error;

/// Errors that can occur while expanding an archive
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// IO error while reading the archive or writing its contents
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid ZIP archive format
    #[error("Invalid ZIP archive: {0}")]
    InvalidZip(#[from] zip::result::ZipError),

    /// Archive nesting exceeds depth limit
    #[error("Archive nesting too deep (max depth {max})")]
    TooDeep {
        /// Maximum allowed nesting depth
        max: usize,
    },
}
