//! ContentType - wire-level dispatch key

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ContractError;

/// Closed set of payload encodings the pipeline can normalize.
///
/// Parsing is ASCII case-insensitive, so `APPLICATION/JSON` and
/// `application/json` are the same content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// `application/senml+json`
    SenmlJson,
    /// `application/senml+cbor`
    SenmlCbor,
    /// `application/json`
    Json,
}

impl ContentType {
    pub const SENML_JSON: &'static str = "application/senml+json";
    pub const SENML_CBOR: &'static str = "application/senml+cbor";
    pub const JSON: &'static str = "application/json";

    /// All known content types
    pub const ALL: [ContentType; 3] = [Self::SenmlJson, Self::SenmlCbor, Self::Json];

    /// Canonical lowercase MIME string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SenmlJson => Self::SENML_JSON,
            Self::SenmlCbor => Self::SENML_CBOR,
            Self::Json => Self::JSON,
        }
    }

    /// Whether this is one of the SenML encodings
    pub fn is_senml(&self) -> bool {
        matches!(self, Self::SenmlJson | Self::SenmlCbor)
    }

    /// Parse without producing an error value
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|ct| ct.as_str().eq_ignore_ascii_case(value))
    }
}

impl FromStr for ContentType {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ContractError::unknown_content_type(s))
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ContentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ContentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
