//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Input line is not a valid envelope
    #[error("Invalid envelope on line {line}: {message}")]
    InvalidEnvelope { line: usize, message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn invalid_envelope(line: usize, message: impl Into<String>) -> Self {
        Self::InvalidEnvelope {
            line,
            message: message.into(),
        }
    }
}
