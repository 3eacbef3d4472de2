//! Consumer implementations
//!
//! Contains LogConsumer, FileConsumer and NotifyConsumer, plus the
//! config-driven `SinkConsumer` that wraps whichever one is configured.

mod file;
mod log;
mod notify;

use async_trait::async_trait;
use contracts::{Consumable, Consumer, ContractError, Flush, SinkConfig, SinkType};
use tracing::instrument;

use crate::error::DispatcherError;

pub use self::file::{FileConsumer, FileConsumerConfig};
pub use self::log::LogConsumer;
pub use self::notify::{LocalNotifier, LogNotifier, Notification, Notifier, NotifyConsumer};

/// Consumer selected by configuration
pub enum SinkConsumer {
    Log(LogConsumer),
    File(FileConsumer),
    Notify(NotifyConsumer<LogNotifier>),
}

impl SinkConsumer {
    /// Create the consumer described by `config`
    #[instrument(
        name = "sink_consumer_from_config",
        skip(config),
        fields(sink = %config.name, sink_type = ?config.sink_type)
    )]
    pub fn from_config(config: &SinkConfig) -> Result<Self, DispatcherError> {
        match config.sink_type {
            SinkType::Log => Ok(Self::Log(LogConsumer::new(&config.name))),
            SinkType::File => FileConsumer::from_params(&config.name, &config.params)
                .map(Self::File)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string())),
            SinkType::Notify => {
                NotifyConsumer::from_params(&config.name, &config.params, LogNotifier)
                    .map(Self::Notify)
                    .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))
            }
        }
    }

    pub fn sink_type(&self) -> SinkType {
        match self {
            Self::Log(_) => SinkType::Log,
            Self::File(_) => SinkType::File,
            Self::Notify(_) => SinkType::Notify,
        }
    }
}

impl Consumer for SinkConsumer {
    fn name(&self) -> &str {
        match self {
            Self::Log(c) => c.name(),
            Self::File(c) => c.name(),
            Self::Notify(c) => c.name(),
        }
    }

    async fn consume(&self, input: Consumable) -> Result<(), ContractError> {
        match self {
            Self::Log(c) => c.consume(input).await,
            Self::File(c) => c.consume(input).await,
            Self::Notify(c) => c.consume(input).await,
        }
    }
}

#[async_trait]
impl Flush for SinkConsumer {
    async fn flush(&self) -> Result<(), ContractError> {
        match self {
            Self::File(c) => c.flush().await,
            Self::Log(_) | Self::Notify(_) => Ok(()),
        }
    }
}
