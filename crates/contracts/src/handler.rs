//! Transport seam: message handlers and the subscriber that drives them

use std::sync::Arc;

use async_trait::async_trait;

use crate::{ContractError, Message};

/// Unit invoked by the transport for every inbound message
///
/// The returned error is the signal the transport uses to decide about
/// acknowledgement or redelivery.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handle one delivery
    async fn handle(&self, msg: &Message) -> Result<(), ContractError>;

    /// Release resources when the subscription goes away
    async fn cancel(&self) -> Result<(), ContractError> {
        Ok(())
    }
}

/// Pub/sub transport, consumer side
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Register `handler` for `subject` under the consumer identity `id`
    ///
    /// Registrations sharing an `id` form one logical consumer group.
    async fn subscribe(
        &self,
        id: &str,
        subject: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<(), ContractError>;

    /// Remove the registration of `id` on `subject`
    async fn unsubscribe(&self, id: &str, subject: &str) -> Result<(), ContractError>;

    /// Remove every registration
    async fn close(&self) -> Result<(), ContractError>;
}
