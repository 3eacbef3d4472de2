//! Input envelopes - one JSON object per line.

use chrono::{DateTime, Utc};
use contracts::Message;
use serde::Deserialize;
use serde_json::Value;

use crate::error::CliError;

/// Message as it appears on an input line
///
/// A string `payload` is used verbatim; any other JSON value is
/// serialized back to bytes.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub subject: String,
    pub content_type: String,
    pub channel: String,
    pub publisher: String,
    #[serde(default)]
    pub subtopic: String,
    #[serde(default)]
    pub protocol: String,
    pub payload: Value,
    /// Ingestion time; stamped on read when absent
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

impl Envelope {
    /// Parse one input line (`line_no` is 1-based, for error reporting)
    pub fn parse(line: &str, line_no: usize) -> Result<Self, CliError> {
        serde_json::from_str(line).map_err(|e| CliError::invalid_envelope(line_no, e.to_string()))
    }

    pub fn into_message(self) -> Message {
        let payload = match self.payload {
            Value::String(text) => text.into_bytes(),
            other => other.to_string().into_bytes(),
        };

        let msg = Message::new(self.subject, self.content_type, payload)
            .with_channel(self.channel)
            .with_publisher(self.publisher)
            .with_subtopic(self.subtopic)
            .with_protocol(self.protocol);

        match self.created {
            Some(created) => msg.with_created(created),
            None => msg,
        }
    }
}
