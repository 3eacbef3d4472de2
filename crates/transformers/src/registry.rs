//! TransformerRegistry - content type to transformer resolution

use contracts::{default_time_fields, ContentType, ContractError, TimeField};
use tracing::{debug, error, instrument};

use crate::json::JsonTransformer;
use crate::senml::SenmlTransformer;
use crate::transformer::Transformer;

/// Immutable content-type lookup
///
/// Built once at startup and passed by reference. Every resolution
/// constructs a fresh transformer instance.
#[derive(Debug, Clone)]
pub struct TransformerRegistry {
    time_fields: Vec<TimeField>,
}

impl Default for TransformerRegistry {
    fn default() -> Self {
        Self::new(default_time_fields())
    }
}

impl TransformerRegistry {
    /// Create a registry whose JSON transformers use `time_fields`
    pub fn new(time_fields: Vec<TimeField>) -> Self {
        Self { time_fields }
    }

    /// Time fields handed to JSON transformers
    pub fn time_fields(&self) -> &[TimeField] {
        &self.time_fields
    }

    /// Resolve a declared content type (case-insensitive)
    ///
    /// # Errors
    /// `ContractError::UnknownContentType` for anything outside the known set.
    #[instrument(name = "registry_resolve", skip(self))]
    pub fn resolve(&self, content_type: &str) -> Result<Transformer, ContractError> {
        let ct: ContentType = content_type.parse().inspect_err(|e| {
            error!(content_type = %content_type, error = %e, "can't create transformer");
        })?;
        Ok(self.build(ct))
    }

    /// Build the transformer for a known content type
    pub fn build(&self, content_type: ContentType) -> Transformer {
        match content_type {
            ContentType::SenmlJson | ContentType::SenmlCbor => {
                debug!(content_type = %content_type, "using senml transformer");
                Transformer::Senml(SenmlTransformer::new(content_type))
            }
            ContentType::Json => {
                debug!(
                    time_fields = self.time_fields.len(),
                    "using json transformer"
                );
                Transformer::Json(JsonTransformer::new(self.time_fields.clone()))
            }
        }
    }
}
