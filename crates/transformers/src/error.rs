//! Transform error types

use contracts::ContractError;
use thiserror::Error;

/// Transform error
#[derive(Debug, Error)]
pub enum TransformError {
    /// Payload is not well-formed in its encoding
    #[error("malformed {encoding} payload: {message}")]
    Decode {
        /// Wire encoding (json / cbor)
        encoding: &'static str,
        /// Decoder message
        message: String,
    },

    /// SenML pack violates the resolution rules
    #[error("invalid senml pack at entry {index}: {message}")]
    InvalidPack {
        /// Entry position inside the pack
        index: usize,
        /// Violation
        message: String,
    },

    /// Time field present but unusable
    #[error("invalid time field '{field}': {message}")]
    InvalidTimeField {
        /// Field name
        field: String,
        /// Violation
        message: String,
    },

    /// Top-level payload shape not supported
    #[error("unsupported payload: {message}")]
    UnsupportedPayload {
        /// Violation
        message: String,
    },
}

impl TransformError {
    pub(crate) fn decode(encoding: &'static str, message: impl ToString) -> Self {
        Self::Decode {
            encoding,
            message: message.to_string(),
        }
    }

    pub(crate) fn invalid_pack(index: usize, message: impl Into<String>) -> Self {
        Self::InvalidPack {
            index,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_time_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTimeField {
            field: field.into(),
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedPayload {
            message: message.into(),
        }
    }

    /// Convert into the contract error reported to the transport
    pub fn into_contract(self, content_type: &str) -> ContractError {
        ContractError::transform(content_type, self.to_string())
    }
}

/// Transform result alias
pub type Result<T> = std::result::Result<T, TransformError>;
