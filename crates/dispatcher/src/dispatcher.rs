//! Dispatcher - binds transformers to subjects on a transport

use std::sync::Arc;

use contracts::{
    default_bindings, Consumer, ContractError, Flush, MessageHandler, Subscriber,
    SubscriptionBinding,
};
use tracing::{error, info, instrument, warn};
use transformers::{Transformer, TransformerRegistry};

use crate::handler::TransformHandler;

/// Subscribes one handler per binding under a shared consumer identity
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: TransformerRegistry,
    bindings: Vec<SubscriptionBinding>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(TransformerRegistry::default())
    }
}

impl Dispatcher {
    /// Dispatcher over the process-wide binding table
    pub fn new(registry: TransformerRegistry) -> Self {
        Self::with_bindings(registry, default_bindings())
    }

    pub fn with_bindings(
        registry: TransformerRegistry,
        bindings: Vec<SubscriptionBinding>,
    ) -> Self {
        Self { registry, bindings }
    }

    pub fn bindings(&self) -> &[SubscriptionBinding] {
        &self.bindings
    }

    pub fn registry(&self) -> &TransformerRegistry {
        &self.registry
    }

    /// Subscribe every binding under `consumer_id`
    ///
    /// Transformers are resolved before anything is subscribed. If a
    /// subscription fails, subjects bound earlier in this call are
    /// unsubscribed again: either all subjects are bound or none.
    ///
    /// # Errors
    /// - `ContractError::UnknownContentType` for a binding without transformer
    /// - the transport's error when a subscription fails
    #[instrument(
        name = "dispatcher_start",
        skip(self, subscriber, consumer),
        fields(bindings = self.bindings.len())
    )]
    pub async fn start<C>(
        &self,
        consumer_id: &str,
        subscriber: &dyn Subscriber,
        consumer: Arc<C>,
    ) -> Result<(), ContractError>
    where
        C: Consumer + Sync + 'static,
    {
        let handlers = self
            .resolve_all()?
            .into_iter()
            .map(|(subject, transformer)| {
                let handler: Arc<dyn MessageHandler> =
                    Arc::new(TransformHandler::new(transformer, Arc::clone(&consumer)));
                (subject, handler)
            })
            .collect();

        self.subscribe_all(consumer_id, subscriber, handlers).await
    }

    /// Like [`Dispatcher::start`], flushing the consumer when a
    /// subscription is cancelled
    #[instrument(
        name = "dispatcher_start_with_flush",
        skip(self, subscriber, consumer),
        fields(bindings = self.bindings.len())
    )]
    pub async fn start_with_flush<C>(
        &self,
        consumer_id: &str,
        subscriber: &dyn Subscriber,
        consumer: Arc<C>,
    ) -> Result<(), ContractError>
    where
        C: Consumer + Flush + 'static,
    {
        let flush: Arc<dyn Flush> = consumer.clone();
        let handlers = self
            .resolve_all()?
            .into_iter()
            .map(|(subject, transformer)| {
                let handler: Arc<dyn MessageHandler> = Arc::new(
                    TransformHandler::new(transformer, Arc::clone(&consumer))
                        .with_flush(Arc::clone(&flush)),
                );
                (subject, handler)
            })
            .collect();

        self.subscribe_all(consumer_id, subscriber, handlers).await
    }

    /// Unsubscribe every binding under `consumer_id`
    ///
    /// Each removal cancels its handler. Keeps going after a failure and
    /// returns the first error.
    #[instrument(name = "dispatcher_stop", skip(self, subscriber))]
    pub async fn stop(
        &self,
        consumer_id: &str,
        subscriber: &dyn Subscriber,
    ) -> Result<(), ContractError> {
        let mut first_err = None;
        for binding in &self.bindings {
            if let Err(e) = subscriber.unsubscribe(consumer_id, &binding.subject).await {
                warn!(subject = %binding.subject, error = %e, "unsubscribe failed");
                first_err.get_or_insert(e);
            }
        }
        info!(consumer_id = %consumer_id, "dispatcher stopped");
        first_err.map_or(Ok(()), Err)
    }

    fn resolve_all(&self) -> Result<Vec<(String, Transformer)>, ContractError> {
        self.bindings
            .iter()
            .map(|binding| {
                let transformer = self.registry.resolve(&binding.content_type)?;
                Ok((binding.subject.clone(), transformer))
            })
            .collect()
    }

    async fn subscribe_all(
        &self,
        consumer_id: &str,
        subscriber: &dyn Subscriber,
        handlers: Vec<(String, Arc<dyn MessageHandler>)>,
    ) -> Result<(), ContractError> {
        let mut bound: Vec<String> = Vec::with_capacity(handlers.len());

        for (subject, handler) in handlers {
            if let Err(e) = subscriber.subscribe(consumer_id, &subject, handler).await {
                error!(subject = %subject, error = %e, "subscription failed, rolling back");
                Self::rollback(consumer_id, subscriber, &bound).await;
                return Err(e);
            }
            info!(consumer_id = %consumer_id, subject = %subject, "subject bound");
            bound.push(subject);
        }

        info!(consumer_id = %consumer_id, subjects = bound.len(), "dispatcher started");
        Ok(())
    }

    async fn rollback(consumer_id: &str, subscriber: &dyn Subscriber, bound: &[String]) {
        for subject in bound.iter().rev() {
            if let Err(e) = subscriber.unsubscribe(consumer_id, subject).await {
                warn!(subject = %subject, error = %e, "rollback unsubscribe failed");
            }
        }
    }
}
