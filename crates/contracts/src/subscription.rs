//! SubscriptionBinding - subject to content type table

use serde::{Deserialize, Serialize};

use crate::ContentType;

/// Subject pattern covering every message
pub const SUBJECT_ALL_MESSAGES: &str = "messages.>";

/// Subject pattern covering every JSON message
pub const SUBJECT_ALL_JSON: &str = "json.>";

/// Static binding of a subject pattern to a content type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionBinding {
    /// Transport subject pattern
    pub subject: String,

    /// Declared content type whose transformer handles the subject
    ///
    /// Resolved against the known set at startup, not here.
    pub content_type: String,
}

impl SubscriptionBinding {
    pub fn new(subject: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            content_type: content_type.into(),
        }
    }
}

/// Process-defined binding table
pub fn default_bindings() -> Vec<SubscriptionBinding> {
    vec![
        SubscriptionBinding::new(SUBJECT_ALL_MESSAGES, ContentType::SENML_JSON),
        SubscriptionBinding::new(SUBJECT_ALL_JSON, ContentType::JSON),
    ]
}
