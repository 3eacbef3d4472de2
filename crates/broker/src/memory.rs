//! InMemoryBroker - in-process subject-routed transport

use std::sync::Arc;

use async_trait::async_trait;
use contracts::{ContractError, Message, MessageHandler, Subscriber};
use metrics::counter;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::subject::{validate_subject, SubjectPattern};

/// Broker settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrokerConfig {
    /// Extra delivery attempts after a handler error (0 = at most once)
    pub max_redeliveries: u32,
}

/// Outcome of a single publish
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Subscriptions whose pattern matched the subject
    pub matched: usize,
    /// Subscriptions whose handler eventually succeeded
    pub delivered: usize,
    /// Subscriptions whose handler failed on every attempt
    pub failed: usize,
    /// Handler invocations across all matched subscriptions
    pub attempts: usize,
    /// Last error per failed subscription
    pub errors: Vec<String>,
}

impl DeliveryReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

struct Subscription {
    id: String,
    pattern: SubjectPattern,
    handler: Arc<dyn MessageHandler>,
}

/// In-memory pub/sub transport
///
/// Delivery happens on the publisher's task; handlers are invoked outside
/// the subscription lock so they may publish or subscribe themselves.
pub struct InMemoryBroker {
    config: BrokerConfig,
    subscriptions: RwLock<Vec<Subscription>>,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new(BrokerConfig::default())
    }
}

impl InMemoryBroker {
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            config,
            subscriptions: RwLock::new(Vec::new()),
        }
    }

    pub fn config(&self) -> BrokerConfig {
        self.config
    }

    /// Number of live subscriptions
    pub async fn subscription_count(&self) -> usize {
        self.subscriptions.read().await.len()
    }

    /// Whether `id` holds a subscription on exactly `subject`
    pub async fn is_subscribed(&self, id: &str, subject: &str) -> bool {
        self.subscriptions
            .read()
            .await
            .iter()
            .any(|s| s.id == id && s.pattern.as_str() == subject)
    }

    /// Deliver `msg` to every subscription matching `msg.subject`
    ///
    /// Handler errors are retried up to `max_redeliveries` times and then
    /// reported; they never fail the publish itself.
    #[instrument(name = "broker_publish", skip(self, msg), fields(subject = %msg.subject))]
    pub async fn publish(&self, msg: Message) -> Result<DeliveryReport, ContractError> {
        validate_subject(&msg.subject)?;

        let targets: Vec<(String, Arc<dyn MessageHandler>)> = self
            .subscriptions
            .read()
            .await
            .iter()
            .filter(|s| s.pattern.matches(&msg.subject))
            .map(|s| (s.id.clone(), Arc::clone(&s.handler)))
            .collect();

        let mut report = DeliveryReport {
            matched: targets.len(),
            ..Default::default()
        };

        if targets.is_empty() {
            debug!("no subscription matched");
            counter!("msg_consumer_broker_unrouted_total").increment(1);
            return Ok(report);
        }

        for (id, handler) in targets {
            match self.deliver(&id, handler.as_ref(), &msg, &mut report).await {
                Ok(()) => {
                    report.delivered += 1;
                    counter!("msg_consumer_broker_deliveries_total", "status" => "ok")
                        .increment(1);
                }
                Err(e) => {
                    warn!(consumer_id = %id, error = %e, "delivery failed");
                    report.failed += 1;
                    report.errors.push(e.to_string());
                    counter!("msg_consumer_broker_deliveries_total", "status" => "failed")
                        .increment(1);
                }
            }
        }

        Ok(report)
    }

    async fn deliver(
        &self,
        id: &str,
        handler: &dyn MessageHandler,
        msg: &Message,
        report: &mut DeliveryReport,
    ) -> Result<(), ContractError> {
        let mut attempt = 0u32;
        loop {
            report.attempts += 1;
            match handler.handle(msg).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.config.max_redeliveries => {
                    attempt += 1;
                    debug!(consumer_id = %id, attempt, error = %e, "redelivering");
                    counter!("msg_consumer_broker_redeliveries_total").increment(1);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl Subscriber for InMemoryBroker {
    async fn subscribe(
        &self,
        id: &str,
        subject: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<(), ContractError> {
        if id.is_empty() {
            return Err(ContractError::subscription(subject, "empty consumer id"));
        }
        let pattern = SubjectPattern::parse(subject)?;

        let mut subscriptions = self.subscriptions.write().await;
        if subscriptions
            .iter()
            .any(|s| s.id == id && s.pattern == pattern)
        {
            return Err(ContractError::subscription(
                subject,
                format!("'{id}' is already subscribed"),
            ));
        }

        subscriptions.push(Subscription {
            id: id.to_string(),
            pattern,
            handler,
        });
        info!(consumer_id = %id, subject = %subject, "subscribed");
        Ok(())
    }

    async fn unsubscribe(&self, id: &str, subject: &str) -> Result<(), ContractError> {
        let removed = {
            let mut subscriptions = self.subscriptions.write().await;
            let pos = subscriptions
                .iter()
                .position(|s| s.id == id && s.pattern.as_str() == subject)
                .ok_or_else(|| {
                    ContractError::subscription(subject, format!("'{id}' is not subscribed"))
                })?;
            subscriptions.remove(pos)
        };

        info!(consumer_id = %id, subject = %subject, "unsubscribed");
        removed.handler.cancel().await
    }

    async fn close(&self) -> Result<(), ContractError> {
        let drained: Vec<Subscription> = self.subscriptions.write().await.drain(..).collect();
        let count = drained.len();

        let mut first_err = None;
        for sub in drained {
            if let Err(e) = sub.handler.cancel().await {
                warn!(consumer_id = %sub.id, subject = %sub.pattern.as_str(), error = %e, "cancel failed");
                first_err.get_or_insert(e);
            }
        }

        info!(subscriptions = count, "broker closed");
        first_err.map_or(Ok(()), Err)
    }
}
