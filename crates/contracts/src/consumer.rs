//! Consumer trait - pipeline output interface
//!
//! Defines the abstract interface for sinks (store writers, notifiers...).

use async_trait::async_trait;

use crate::{Consumable, ContractError};

/// Record consumer
///
/// Receivers are shared: deliveries may call `consume` concurrently, so
/// implementations serialize access to their sink internally.
#[trait_variant::make(Consumer: Send)]
pub trait LocalConsumer {
    /// Consumer name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Consume the output of one delivery
    ///
    /// # Errors
    /// Returns the sink failure unchanged; the caller forwards it to the
    /// transport, which decides about redelivery.
    async fn consume(&self, input: Consumable) -> Result<(), ContractError>;
}

/// Drain capability for consumers that buffer
///
/// Only consumers with something to flush implement this.
#[async_trait]
pub trait Flush: Send + Sync {
    /// Flush buffered output
    async fn flush(&self) -> Result<(), ContractError>;
}
