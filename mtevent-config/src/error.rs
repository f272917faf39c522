//! Configuration error types.

use thiserror::Error;

/// Result type for configuration loading.
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration loading error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Era tag not recognized.
    #[error("unknown era '{0}'")]
    UnknownEra(String),

    /// An instance inherits from a name that is neither standard nor defined.
    #[error("instance '{name}' inherits from unknown instance '{base}'")]
    UnknownInstance {
        /// Instance being defined.
        name: String,
        /// Missing base instance.
        base: String,
    },

    /// A selected instance is not part of the process configuration.
    #[error("instance '{0}' is not configured")]
    NotConfigured(String),

    /// Instances inherit from each other in a loop.
    #[error("inheritance cycle through instance '{0}'")]
    InheritanceCycle(String),

    /// Core library error (binding resolution).
    #[error("core error: {0}")]
    Core(#[from] mtevent_core::Error),
}
