//! Record - transformer output
//!
//! Canonical measurement record, independent of the wire encoding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Message;

/// Normalized measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Originating channel
    pub channel: String,

    /// Originating subtopic
    #[serde(default)]
    pub subtopic: String,

    /// Originating publisher
    pub publisher: String,

    /// Ingestion protocol
    #[serde(default)]
    pub protocol: String,

    /// Measurement name
    pub name: String,

    /// Measurement unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Measured value (absent for sum-only SenML entries)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<RecordValue>,

    /// Integrated sum of the value over time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sum: Option<f64>,

    /// Measurement instant
    pub time: DateTime<Utc>,

    /// Maximum seconds before the sensor provides an updated value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<f64>,
}

impl Record {
    /// Create a record that inherits the message's channel metadata
    pub fn from_message(
        msg: &Message,
        name: impl Into<String>,
        value: RecordValue,
        time: DateTime<Utc>,
    ) -> Self {
        Self {
            channel: msg.channel.clone(),
            subtopic: msg.subtopic.clone(),
            publisher: msg.publisher.clone(),
            protocol: msg.protocol.clone(),
            name: name.into(),
            unit: None,
            value: Some(value),
            sum: None,
            time,
            update_time: None,
        }
    }
}

/// Measured value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordValue {
    Float(f64),
    String(String),
    Bool(bool),
    /// Opaque data value (SenML `vd`), kept in its textual form
    Data(String),
}

impl RecordValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }
}

/// What a consumer receives for one delivery
#[derive(Debug, Clone, PartialEq)]
pub enum Consumable {
    /// Transformer output
    Records(Vec<Record>),

    /// Untransformed message (no transformer bound to the subject)
    Raw(Message),
}

impl Consumable {
    /// Number of records (a raw message counts as one)
    pub fn len(&self) -> usize {
        match self {
            Self::Records(records) => records.len(),
            Self::Raw(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
