// Store Errors
//
// *Les Erreurs* (The Errors) - Failures while loading or persisting exemplars

use thiserror::Error;

/// Errors that can occur while loading or persisting the pattern store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing storage failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored blob is not a valid exemplar document
    #[error("Corrupt pattern data: {0}")]
    Corrupt(String),

    /// The stored blob was written by an incompatible format version
    #[error("Unsupported pattern format version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the blob
        found: u32,
        /// Version this build reads and writes
        expected: u32,
    },

    /// Exemplars could not be serialized
    #[error("Encoding error: {0}")]
    Encode(String),
}

impl StoreError {
    /// Whether the failure came from the stored bytes rather than the medium
    pub fn is_data_error(&self) -> bool {
        matches!(self, StoreError::Corrupt(_) | StoreError::UnsupportedVersion { .. })
    }
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
