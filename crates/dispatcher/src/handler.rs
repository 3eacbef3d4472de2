//! TransformHandler - per-subject message handler

use std::sync::Arc;

use async_trait::async_trait;
use contracts::{Consumable, Consumer, ContractError, Flush, Message, MessageHandler};
use tracing::{debug, instrument, warn};
use transformers::Transformer;

/// Handler registered with the transport for one subject
///
/// Transforms each delivery and hands the records to the consumer. With no
/// transformer bound the raw message is passed through.
pub struct TransformHandler<C> {
    transformer: Option<Transformer>,
    consumer: Arc<C>,
    flush: Option<Arc<dyn Flush>>,
}

impl<C: Consumer + Sync + 'static> TransformHandler<C> {
    pub fn new(transformer: Transformer, consumer: Arc<C>) -> Self {
        Self {
            transformer: Some(transformer),
            consumer,
            flush: None,
        }
    }

    /// Handler that forwards messages untouched
    pub fn passthrough(consumer: Arc<C>) -> Self {
        Self {
            transformer: None,
            consumer,
            flush: None,
        }
    }

    /// Flush `flush` when the subscription is cancelled
    pub fn with_flush(mut self, flush: Arc<dyn Flush>) -> Self {
        self.flush = Some(flush);
        self
    }

    pub fn transformer(&self) -> Option<&Transformer> {
        self.transformer.as_ref()
    }
}

#[async_trait]
impl<C: Consumer + Sync + 'static> MessageHandler for TransformHandler<C> {
    #[instrument(
        name = "transform_handler_handle",
        skip(self, msg),
        fields(subject = %msg.subject, consumer = %self.consumer.name())
    )]
    async fn handle(&self, msg: &Message) -> Result<(), ContractError> {
        let input = match &self.transformer {
            Some(transformer) => {
                let records = transformer.transform(msg).map_err(|e| {
                    warn!(
                        content_type = %transformer.content_type(),
                        error = %e,
                        "transform failed, message rejected"
                    );
                    e.into_contract(transformer.content_type().as_str())
                })?;
                debug!(records = records.len(), "message transformed");
                Consumable::Records(records)
            }
            None => Consumable::Raw(msg.clone()),
        };

        self.consumer.consume(input).await
    }

    async fn cancel(&self) -> Result<(), ContractError> {
        match &self.flush {
            Some(flush) => flush.flush().await,
            None => Ok(()),
        }
    }
}
