//! SenML transformer
//!
//! Decodes SenML packs (JSON or CBOR) and expands them into one record per
//! resolved entry.

mod cbor;
mod pack;

use contracts::{ContentType, Message, Record};
use tracing::trace;

use crate::error::{Result, TransformError};
use pack::SenmlEntry;

/// SenML transformer
///
/// Bound to a default encoding; a message declaring the other SenML content
/// type is decoded with its own encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenmlTransformer {
    encoding: ContentType,
}

impl SenmlTransformer {
    /// Create a SenML transformer for `content_type`
    ///
    /// Non-SenML content types fall back to SenML-JSON.
    pub fn new(content_type: ContentType) -> Self {
        let encoding = if content_type.is_senml() {
            content_type
        } else {
            ContentType::SenmlJson
        };
        Self { encoding }
    }

    /// Default encoding
    pub fn encoding(&self) -> ContentType {
        self.encoding
    }

    /// Transform a message into records
    pub fn transform(&self, msg: &Message) -> Result<Vec<Record>> {
        let encoding = match ContentType::parse(&msg.content_type) {
            Some(ct) if ct.is_senml() => ct,
            _ => self.encoding,
        };

        let entries = match encoding {
            ContentType::SenmlCbor => cbor::decode(&msg.payload)?,
            _ => decode_json(&msg.payload)?,
        };

        let records = pack::resolve(entries, msg)?;
        trace!(
            subject = %msg.subject,
            encoding = %encoding,
            records = records.len(),
            "senml pack resolved"
        );
        Ok(records)
    }
}

fn decode_json(payload: &[u8]) -> Result<Vec<SenmlEntry>> {
    serde_json::from_slice(payload).map_err(|e| TransformError::decode("json", e))
}
