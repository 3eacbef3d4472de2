//! Message - transport output
//!
//! Raw envelope delivered by the pub/sub transport.

use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw message envelope
///
/// Produced by the transport and handed to handlers by reference; the
/// pipeline never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Channel the message was published to
    pub channel: String,

    /// Optional subtopic below the channel
    #[serde(default)]
    pub subtopic: String,

    /// Publisher (device/thing) identifier
    pub publisher: String,

    /// Protocol the message entered the platform with (http, mqtt, coap...)
    #[serde(default)]
    pub protocol: String,

    /// Declared payload content type
    pub content_type: String,

    /// Transport subject the message was delivered on
    pub subject: String,

    /// Payload bytes (zero-copy)
    pub payload: Bytes,

    /// Ingestion time
    pub created: DateTime<Utc>,

    /// Opaque transport metadata
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl Message {
    /// Create a message stamped with the current time
    pub fn new(
        subject: impl Into<String>,
        content_type: impl Into<String>,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            channel: String::new(),
            subtopic: String::new(),
            publisher: String::new(),
            protocol: String::new(),
            content_type: content_type.into(),
            subject: subject.into(),
            payload: payload.into(),
            created: Utc::now(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = publisher.into();
        self
    }

    pub fn with_subtopic(mut self, subtopic: impl Into<String>) -> Self {
        self.subtopic = subtopic.into();
        self
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = created;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
