//! ServiceConfig - Config Loader output
//!
//! Consumer identity, transport behaviour and the sink records are routed to.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub version: ConfigVersion,

    /// Process-level settings
    pub service: ServiceSettings,

    /// Where normalized records go
    pub sink: SinkConfig,
}

/// Process-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Consumer identity shared by every subscription
    pub consumer_id: String,

    /// Prometheus listener port (disabled when absent)
    #[serde(default)]
    pub metrics_port: Option<u16>,

    /// Redelivery attempts after a failed delivery on the in-memory transport
    #[serde(default)]
    pub max_redeliveries: u32,
}

/// Sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name (used for logging/metrics)
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Tracing output
    Log,
    /// JSON-lines file
    File,
    /// Notification per delivery
    Notify,
}

impl SinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::File => "file",
            Self::Notify => "notify",
        }
    }
}

impl SinkConfig {
    /// Look up a parameter
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}
