//! TimeField - timestamp location inside arbitrary JSON objects

use serde::{Deserialize, Serialize};

/// Epoch resolution of a time field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFormat {
    /// Seconds since the Unix epoch
    Unix,
    /// Milliseconds since the Unix epoch
    UnixMs,
    /// Microseconds since the Unix epoch
    UnixUs,
    /// Nanoseconds since the Unix epoch
    UnixNs,
}

impl TimeFormat {
    /// Nanoseconds per unit of this format
    pub fn nanos_per_unit(&self) -> i64 {
        match self {
            Self::Unix => 1_000_000_000,
            Self::UnixMs => 1_000_000,
            Self::UnixUs => 1_000,
            Self::UnixNs => 1,
        }
    }
}

/// Timezone a time field is interpreted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeLocation {
    #[default]
    #[serde(rename = "UTC")]
    Utc,
}

/// Named time field with its format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeField {
    /// Top-level JSON key
    pub field_name: String,

    /// Epoch resolution
    pub field_format: TimeFormat,

    /// Timezone
    #[serde(default)]
    pub location: TimeLocation,
}

impl TimeField {
    pub fn new(field_name: impl Into<String>, field_format: TimeFormat) -> Self {
        Self {
            field_name: field_name.into(),
            field_format,
            location: TimeLocation::Utc,
        }
    }
}

/// Static table of recognized time fields, in priority order
pub fn default_time_fields() -> Vec<TimeField> {
    vec![
        TimeField::new("seconds_key", TimeFormat::Unix),
        TimeField::new("millis_key", TimeFormat::UnixMs),
        TimeField::new("micros_key", TimeFormat::UnixUs),
        TimeField::new("nanos_key", TimeFormat::UnixNs),
    ]
}
