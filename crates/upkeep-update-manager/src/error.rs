//! Error types for update pipeline operations

use thiserror::Error;

/// Errors that can occur in the update pipeline.
///
/// Expected runtime failures (a strategy declining a component, a failed
/// download) are not reported through this type; they surface as status
/// transitions on the listener stream. This enum covers caller-facing
/// errors and the failure values strategy implementations hand back
/// through their `anyhow` seams.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Update retrieval failed
    #[error("Update retrieval failed: {0}")]
    RetrievalFailed(String),

    /// Update installation failed
    #[error("Update installation failed: {0}")]
    InstallationFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
