//! LogConsumer - logs a delivery summary via tracing

use contracts::{Consumable, Consumer, ContractError};
use tracing::{info, instrument};

/// Consumer that logs what it receives, for debugging
pub struct LogConsumer {
    name: String,
}

impl LogConsumer {
    /// Create a new LogConsumer with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_summary(&self, input: &Consumable) {
        match input {
            Consumable::Records(records) => {
                let first = records.first();
                info!(
                    consumer = %self.name,
                    records = records.len(),
                    channel = first.map(|r| r.channel.as_str()).unwrap_or_default(),
                    publisher = first.map(|r| r.publisher.as_str()).unwrap_or_default(),
                    "records received"
                );
            }
            Consumable::Raw(msg) => {
                info!(
                    consumer = %self.name,
                    subject = %msg.subject,
                    content_type = %msg.content_type,
                    bytes = msg.payload.len(),
                    "raw message received"
                );
            }
        }
    }
}

impl Consumer for LogConsumer {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_consumer_consume",
        skip(self, input),
        fields(consumer = %self.name, records = input.len())
    )]
    async fn consume(&self, input: Consumable) -> Result<(), ContractError> {
        self.log_summary(&input);
        Ok(())
    }
}
