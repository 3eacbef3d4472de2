//! Transformer - closed set of transformer kinds

use contracts::{ContentType, Message, Record};

use crate::error::Result;
use crate::json::JsonTransformer;
use crate::senml::SenmlTransformer;

/// Transformer variant selected by content type
///
/// Adding a content type means adding a variant here.
#[derive(Debug, Clone, PartialEq)]
pub enum Transformer {
    Senml(SenmlTransformer),
    Json(JsonTransformer),
}

impl Transformer {
    /// Normalize a message into zero or more records
    pub fn transform(&self, msg: &Message) -> Result<Vec<Record>> {
        match self {
            Self::Senml(t) => t.transform(msg),
            Self::Json(t) => t.transform(msg),
        }
    }

    /// Content type this instance was built for
    pub fn content_type(&self) -> ContentType {
        match self {
            Self::Senml(t) => t.encoding(),
            Self::Json(_) => ContentType::Json,
        }
    }

    /// Short kind name (used for logging/metrics)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Senml(_) => "senml",
            Self::Json(_) => "json",
        }
    }
}

impl From<SenmlTransformer> for Transformer {
    fn from(t: SenmlTransformer) -> Self {
        Self::Senml(t)
    }
}

impl From<JsonTransformer> for Transformer {
    fn from(t: JsonTransformer) -> Self {
        Self::Json(t)
    }
}
