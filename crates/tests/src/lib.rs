//! # Integration Tests
//!
//! End-to-end tests across crates.
//!
//! Covers:
//! - broker → dispatcher → transformer → consumer flows
//! - startup failure and rollback
//! - redelivery after consumer failure
//! - config-driven sinks
//! - identity caching

#[cfg(test)]
mod support {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use broker::InMemoryBroker;
    use contracts::{
        Consumable, Consumer, ContractError, MessageHandler, Record, Subscriber,
    };

    /// Consumer that keeps every delivery and can fail the first N calls
    #[derive(Default)]
    pub struct RecordingConsumer {
        pub deliveries: Mutex<Vec<Consumable>>,
        pub calls: AtomicUsize,
        pub fail_first: usize,
    }

    impl RecordingConsumer {
        pub fn failing(fail_first: usize) -> Self {
            Self {
                fail_first,
                ..Default::default()
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn records(&self) -> Vec<Record> {
            self.deliveries
                .lock()
                .unwrap()
                .iter()
                .filter_map(|d| match d {
                    Consumable::Records(records) => Some(records.clone()),
                    Consumable::Raw(_) => None,
                })
                .flatten()
                .collect()
        }
    }

    impl Consumer for RecordingConsumer {
        fn name(&self) -> &str {
            "recording"
        }

        async fn consume(&self, input: Consumable) -> Result<(), ContractError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                return Err(ContractError::consume("recording", "store unavailable"));
            }
            self.deliveries.lock().unwrap().push(input);
            Ok(())
        }
    }

    /// Broker wrapper that refuses one subject pattern
    pub struct RefusingSubscriber {
        pub inner: Arc<InMemoryBroker>,
        pub refuse: &'static str,
    }

    #[async_trait]
    impl Subscriber for RefusingSubscriber {
        async fn subscribe(
            &self,
            id: &str,
            subject: &str,
            handler: Arc<dyn MessageHandler>,
        ) -> Result<(), ContractError> {
            if subject == self.refuse {
                return Err(ContractError::subscription(subject, "refused"));
            }
            self.inner.subscribe(id, subject, handler).await
        }

        async fn unsubscribe(&self, id: &str, subject: &str) -> Result<(), ContractError> {
            self.inner.unsubscribe(id, subject).await
        }

        async fn close(&self) -> Result<(), ContractError> {
            self.inner.close().await
        }
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;

    use broker::{BrokerConfig, InMemoryBroker};
    use contracts::{
        ContractError, Message, RecordValue, SubscriptionBinding, SUBJECT_ALL_JSON,
        SUBJECT_ALL_MESSAGES,
    };
    use dispatcher::Dispatcher;
    use transformers::TransformerRegistry;

    use crate::support::{RecordingConsumer, RefusingSubscriber};

    async fn started(
        config: BrokerConfig,
        consumer: Arc<RecordingConsumer>,
    ) -> InMemoryBroker {
        let broker = InMemoryBroker::new(config);
        Dispatcher::default()
            .start("e2e", &broker, consumer)
            .await
            .unwrap();
        broker
    }

    /// JSON message with a millisecond time field becomes one timed record
    #[tokio::test]
    async fn test_e2e_json_millis_record() {
        let consumer = Arc::new(RecordingConsumer::default());
        let broker = started(BrokerConfig::default(), consumer.clone()).await;

        let msg = Message::new(
            "json.ch1",
            "application/json",
            r#"{"millis_key": 1700000000000, "temp": 21.5}"#,
        )
        .with_channel("ch1")
        .with_publisher("thing1");
        let report = broker.publish(msg).await.unwrap();

        assert_eq!(report.matched, 1);
        assert_eq!(report.delivered, 1);
        let records = consumer.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "temp");
        assert_eq!(records[0].value, Some(RecordValue::Float(21.5)));
        assert_eq!(records[0].time.to_rfc3339(), "2023-11-14T22:13:20+00:00");
        assert_eq!(records[0].publisher, "thing1");
    }

    #[tokio::test]
    async fn test_e2e_senml_json_pack() {
        let consumer = Arc::new(RecordingConsumer::default());
        let broker = started(BrokerConfig::default(), consumer.clone()).await;

        let payload = r#"[
            {"bn":"room/","bt":1600000000,"bu":"Cel","n":"t1","v":20.5},
            {"n":"t2","v":21.0,"t":10}
        ]"#;
        let msg = Message::new("messages.ch1.sensors", "application/senml+json", payload)
            .with_channel("ch1");
        broker.publish(msg).await.unwrap();

        let records = consumer.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "room/t1");
        assert_eq!(records[0].unit.as_deref(), Some("Cel"));
        assert_eq!(records[1].name, "room/t2");
        assert_eq!(records[1].time.timestamp(), 1_600_000_010);
    }

    /// The message's own content type selects CBOR on the SenML subject
    #[tokio::test]
    async fn test_e2e_senml_cbor_pack() {
        use ciborium::Value;

        let consumer = Arc::new(RecordingConsumer::default());
        let broker = started(BrokerConfig::default(), consumer.clone()).await;

        let pack = Value::Array(vec![Value::Map(vec![
            (Value::Integer((-2).into()), Value::Text("dev1/".into())),
            (Value::Integer(0.into()), Value::Text("temp".into())),
            (Value::Integer(2.into()), Value::Float(21.5)),
            (Value::Integer(6.into()), Value::Integer(1_600_000_000.into())),
        ])]);
        let mut payload = Vec::new();
        ciborium::ser::into_writer(&pack, &mut payload).unwrap();

        let msg = Message::new("messages.ch1", "application/senml+cbor", payload);
        let report = broker.publish(msg).await.unwrap();

        assert!(report.is_clean());
        let records = consumer.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "dev1/temp");
        assert_eq!(records[0].time.timestamp(), 1_600_000_000);
    }

    /// A malformed payload is reported to the transport and never reaches the consumer
    #[tokio::test]
    async fn test_e2e_malformed_payload_not_consumed() {
        let consumer = Arc::new(RecordingConsumer::default());
        let broker = started(BrokerConfig::default(), consumer.clone()).await;

        let msg = Message::new("json.ch1", "application/json", "{not json");
        let report = broker.publish(msg).await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(consumer.calls(), 0);
    }

    #[tokio::test]
    async fn test_e2e_unbound_subject_is_unrouted() {
        let consumer = Arc::new(RecordingConsumer::default());
        let broker = started(BrokerConfig::default(), consumer.clone()).await;

        let report = broker
            .publish(Message::new("events.ch1", "application/json", "{}"))
            .await
            .unwrap();

        assert_eq!(report.matched, 0);
        assert_eq!(consumer.calls(), 0);
    }

    #[tokio::test]
    async fn test_e2e_content_type_is_case_insensitive() {
        let consumer = Arc::new(RecordingConsumer::default());
        let broker = InMemoryBroker::default();
        let dispatcher = Dispatcher::with_bindings(
            TransformerRegistry::default(),
            vec![SubscriptionBinding::new(
                SUBJECT_ALL_MESSAGES,
                "Application/SENML+JSON",
            )],
        );

        dispatcher.start("e2e", &broker, consumer.clone()).await.unwrap();
        broker
            .publish(Message::new(
                "messages.ch1",
                "application/senml+json",
                r#"[{"n":"t","v":1}]"#,
            ))
            .await
            .unwrap();

        assert_eq!(consumer.records().len(), 1);
    }

    #[tokio::test]
    async fn test_e2e_unknown_content_type_subscribes_nothing() {
        let consumer = Arc::new(RecordingConsumer::default());
        let broker = InMemoryBroker::default();
        let dispatcher = Dispatcher::with_bindings(
            TransformerRegistry::default(),
            vec![
                SubscriptionBinding::new(SUBJECT_ALL_JSON, "application/json"),
                SubscriptionBinding::new(SUBJECT_ALL_MESSAGES, "application/xml"),
            ],
        );

        let err = dispatcher
            .start("e2e", &broker, consumer)
            .await
            .unwrap_err();

        assert!(matches!(err, ContractError::UnknownContentType { .. }));
        assert_eq!(broker.subscription_count().await, 0);
    }

    /// Second subscription fails: the first one is rolled back
    #[tokio::test]
    async fn test_e2e_partial_subscription_rolls_back() {
        let broker = Arc::new(InMemoryBroker::default());
        let subscriber = RefusingSubscriber {
            inner: broker.clone(),
            refuse: SUBJECT_ALL_JSON,
        };

        let err = Dispatcher::default()
            .start("e2e", &subscriber, Arc::new(RecordingConsumer::default()))
            .await
            .unwrap_err();

        assert!(matches!(err, ContractError::Subscription { .. }));
        assert_eq!(broker.subscription_count().await, 0);
    }

    /// Consumer error → transport redelivers → second attempt lands
    #[tokio::test]
    async fn test_e2e_redelivery_after_consumer_failure() {
        let consumer = Arc::new(RecordingConsumer::failing(1));
        let broker = started(BrokerConfig { max_redeliveries: 1 }, consumer.clone()).await;

        let report = broker
            .publish(Message::new(
                "json.ch1",
                "application/json",
                r#"{"temp": 21.5}"#,
            ))
            .await
            .unwrap();

        assert_eq!(report.attempts, 2);
        assert_eq!(report.delivered, 1);
        assert_eq!(consumer.calls(), 2);
        assert_eq!(consumer.records().len(), 1);
    }

    #[tokio::test]
    async fn test_e2e_consumer_failure_without_redelivery() {
        let consumer = Arc::new(RecordingConsumer::failing(1));
        let broker = started(BrokerConfig::default(), consumer.clone()).await;

        let report = broker
            .publish(Message::new("json.ch1", "application/json", r#"{"v": 1}"#))
            .await
            .unwrap();

        assert_eq!(report.failed, 1);
        assert!(report.errors[0].contains("store unavailable"));
        assert!(consumer.records().is_empty());
    }

    #[tokio::test]
    async fn test_e2e_stop_removes_subscriptions() {
        let consumer = Arc::new(RecordingConsumer::default());
        let broker = started(BrokerConfig::default(), consumer.clone()).await;
        assert_eq!(broker.subscription_count().await, 2);

        Dispatcher::default().stop("e2e", &broker).await.unwrap();
        assert_eq!(broker.subscription_count().await, 0);

        let report = broker
            .publish(Message::new("json.ch1", "application/json", r#"{"v": 1}"#))
            .await
            .unwrap();
        assert_eq!(report.matched, 0);
    }
}

#[cfg(test)]
mod sink_tests {
    use std::sync::Arc;

    use broker::InMemoryBroker;
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{Message, Record};
    use dispatcher::{Dispatcher, Metered, SinkConsumer};

    /// Config file → file sink → flushed JSON lines on stop
    #[tokio::test]
    async fn test_e2e_config_driven_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("records.jsonl");
        let toml = format!(
            r#"
[service]
consumer_id = "file-writer"

[sink]
name = "records"
sink_type = "file"

[sink.params]
path = "{}"
"#,
            out.display()
        );
        let config = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();

        let consumer = Arc::new(Metered::new(SinkConsumer::from_config(&config.sink).unwrap()));
        let broker = InMemoryBroker::default();
        let dispatcher = Dispatcher::default();
        dispatcher
            .start_with_flush(&config.service.consumer_id, &broker, consumer.clone())
            .await
            .unwrap();

        broker
            .publish(Message::new(
                "json.ch1",
                "application/json",
                r#"[{"seconds_key": 1700000000, "a": 1}, {"b": true}]"#,
            ))
            .await
            .unwrap();
        dispatcher
            .stop(&config.service.consumer_id, &broker)
            .await
            .unwrap();

        let records: Vec<Record> = std::fs::read_to_string(&out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "a");
        assert_eq!(records[0].time.timestamp(), 1_700_000_000);

        let snapshot = consumer.metrics().snapshot();
        assert_eq!(snapshot.consume_count, 1);
        assert_eq!(snapshot.record_count, 2);
    }

    /// A sink write error is the delivery's result, so the transport redelivers
    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_e2e_file_sink_write_error_reaches_transport() {
        use broker::BrokerConfig;
        use contracts::{SinkConfig, SinkType};
        use std::collections::HashMap;

        let sink = SinkConfig {
            name: "full".to_string(),
            sink_type: SinkType::File,
            params: HashMap::from([("path".to_string(), "/dev/full".to_string())]),
        };
        let consumer = Arc::new(Metered::new(SinkConsumer::from_config(&sink).unwrap()));
        let broker = InMemoryBroker::new(BrokerConfig { max_redeliveries: 1 });
        Dispatcher::default()
            .start("full-writer", &broker, consumer.clone())
            .await
            .unwrap();

        let report = broker
            .publish(Message::new("json.ch1", "application/json", r#"{"temp": 21.5}"#))
            .await
            .unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.attempts, 2);
        assert!(report.errors[0].contains("full"));
        assert_eq!(consumer.metrics().snapshot().failure_count, 2);
    }
}

#[cfg(test)]
mod identity_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use contracts::{ConnectionIds, ContractError, IdentityCache, IdentityService};
    use identity::CachedIdentity;

    #[derive(Default)]
    struct CountingService {
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl IdentityService for CountingService {
        async fn identify(&self, key: &str) -> Result<String, ContractError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            match key {
                "secret" => Ok("thing-1".to_string()),
                _ => Err(ContractError::identity(key, "unknown key")),
            }
        }

        async fn connection_by_key(&self, key: &str) -> Result<ConnectionIds, ContractError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(ConnectionIds {
                entity_id: format!("thing-of-{key}"),
                channel_id: "ch1".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_identity_is_cached_after_first_lookup() {
        let cache = CachedIdentity::new(CountingService::default());

        assert_eq!(cache.identify("secret").await.unwrap(), "thing-1");
        assert_eq!(cache.identify("secret").await.unwrap(), "thing-1");
        assert_eq!(cache.service().lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_identity_failure_is_not_cached() {
        let cache = CachedIdentity::new(CountingService::default());

        assert!(cache.identify("bogus").await.is_err());
        assert!(cache.identify("bogus").await.is_err());
        assert_eq!(cache.service().lookups.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_connection_ids_pass_through() {
        let cache = CachedIdentity::new(CountingService::default());

        let ids = cache.connection_ids("secret").await.unwrap();
        assert_eq!(ids.entity_id, "thing-of-secret");
        assert_eq!(ids.channel_id, "ch1");
    }
}
