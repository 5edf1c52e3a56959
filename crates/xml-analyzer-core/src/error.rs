//! Error types for per-file tag extraction.
//!
//! Every variant describes why one file contributed no values. Callers
//! scanning many files log the error and move on; nothing here is fatal to a
//! whole run.

use thiserror::Error;

/// Reasons a single XML file could not be analyzed.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The bytes are not valid in the document's encoding.
    #[error("Decode error: content is not valid {encoding}")]
    Decode {
        /// Name of the encoding the document was decoded with
        encoding: &'static str,
    },

    /// The text is not well-formed XML.
    #[error("XML parse error: {0}")]
    Parse(#[from] roxmltree::Error),
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;
