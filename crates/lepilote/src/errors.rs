// Error Handling
//
// *La Gestion des Erreurs* (The Error Management) - Collaborator and runtime failures

use std::path::PathBuf;
use thiserror::Error;

/// Result type for LePilote operations
pub type Result<T> = std::result::Result<T, PiloteError>;

/// LePilote error types
#[derive(Debug, Error)]
pub enum PiloteError {
    /// The system monitor could not produce a snapshot
    #[error("Monitor error: {message}")]
    Monitor {
        /// What went wrong
        message: String,
    },

    /// The external plan switch failed or its output was not understood
    #[error("Plan switch error: {message}")]
    Switch {
        /// What went wrong
        message: String,
        /// Exit status of the external command, when it ran
        status: Option<i32>,
    },

    /// The usage ledger database failed
    #[error("Usage ledger error: {0}")]
    Ledger(#[from] rusqlite::Error),

    /// Configuration is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// I/O errors with context
    #[error("I/O error: {context} (path: {path:?})")]
    Io {
        /// Operation being performed
        context: String,
        /// Path involved, if any
        path: Option<PathBuf>,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl PiloteError {
    /// Create a monitor error
    pub fn monitor(message: impl Into<String>) -> Self {
        PiloteError::Monitor {
            message: message.into(),
        }
    }

    /// Create a switch error
    pub fn switch(message: impl Into<String>, status: Option<i32>) -> Self {
        PiloteError::Switch {
            message: message.into(),
            status,
        }
    }

    /// Create an I/O error with context
    pub fn io(context: impl Into<String>, path: Option<PathBuf>, source: std::io::Error) -> Self {
        PiloteError::Io {
            context: context.into(),
            path,
            source,
        }
    }

    /// Whether the control loop can simply continue with the next tick
    pub fn is_recoverable(&self) -> bool {
        match self {
            PiloteError::Monitor { .. } => true,
            PiloteError::Switch { .. } => true,
            PiloteError::Ledger(_) => true,
            PiloteError::Io { .. } => true,
            PiloteError::Config(_) => false,
        }
    }
}
