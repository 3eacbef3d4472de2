//! Layered error definitions
//!
//! Categorized by source: config / transform / subscription / consumer / identity

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// No transformer exists for the declared content type
    #[error("unknown content type '{content_type}'")]
    UnknownContentType { content_type: String },

    // ===== Transform Errors =====
    /// Payload could not be normalized
    #[error("transform error ({content_type}): {message}")]
    Transform {
        content_type: String,
        message: String,
    },

    // ===== Transport Errors =====
    /// Subscription registration or removal failed
    #[error("subscription error on '{subject}': {message}")]
    Subscription { subject: String, message: String },

    // ===== Consumer Errors =====
    /// Consumer write error
    #[error("consumer '{consumer}' error: {message}")]
    Consume { consumer: String, message: String },

    // ===== Identity Errors =====
    /// Identity lookup failed
    #[error("identity error for key '{key}': {message}")]
    Identity { key: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unknown_content_type(content_type: impl Into<String>) -> Self {
        Self::UnknownContentType {
            content_type: content_type.into(),
        }
    }

    pub fn transform(content_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transform {
            content_type: content_type.into(),
            message: message.into(),
        }
    }

    pub fn subscription(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Subscription {
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Create consumer error
    pub fn consume(consumer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Consume {
            consumer: consumer.into(),
            message: message.into(),
        }
    }

    pub fn identity(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Identity {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Whether this error was produced while normalizing a payload
    pub fn is_transform(&self) -> bool {
        matches!(self, Self::Transform { .. })
    }
}
