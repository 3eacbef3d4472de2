//! Pipeline orchestrator - wires broker, dispatcher and sink.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use broker::{BrokerConfig, InMemoryBroker};
use contracts::{ServiceConfig, Subscriber};
use dispatcher::{Dispatcher, Metered, SinkConsumer};
use observability::{record_delivery, record_input_rejected, record_subscriptions, DeliveryOutcome};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use super::{Envelope, PipelineStats};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Loaded service configuration
    pub service: ServiceConfig,

    /// Envelope file (None = stdin)
    pub input: Option<PathBuf>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until the input ends or `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> Result<PipelineStats>
    where
        F: Future<Output = ()>,
    {
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        match self.config.input.clone() {
            Some(path) => {
                let file = tokio::fs::File::open(&path)
                    .await
                    .with_context(|| format!("Failed to open input {}", path.display()))?;
                info!(input = %path.display(), "Reading envelopes from file");
                self.run_with_reader(BufReader::new(file), shutdown).await
            }
            None => {
                info!("Reading envelopes from stdin");
                self.run_with_reader(BufReader::new(tokio::io::stdin()), shutdown)
                    .await
            }
        }
    }

    /// Run against any line-oriented reader
    pub async fn run_with_reader<R, F>(self, reader: R, shutdown: F) -> Result<PipelineStats>
    where
        R: AsyncBufRead + Unpin,
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let service = &self.config.service;
        let consumer_id = service.service.consumer_id.as_str();

        let sink = SinkConsumer::from_config(&service.sink)
            .with_context(|| format!("Failed to create sink '{}'", service.sink.name))?;
        let consumer = Arc::new(Metered::new(sink));

        let broker = InMemoryBroker::new(BrokerConfig {
            max_redeliveries: service.service.max_redeliveries,
        });
        let dispatcher = Dispatcher::default();

        dispatcher
            .start_with_flush(consumer_id, &broker, Arc::clone(&consumer))
            .await
            .context("Failed to start dispatcher")?;
        record_subscriptions(broker.subscription_count().await);

        let mut stats = PipelineStats {
            sink: format!("{} ({})", service.sink.name, service.sink.sink_type.as_str()),
            ..Default::default()
        };

        let mut lines = reader.lines();
        let mut line_no = 0usize;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    warn!("Received shutdown signal, stopping input");
                    stats.interrupted = true;
                    break;
                }
                line = lines.next_line() => {
                    let Some(line) = line.context("Failed to read input")? else {
                        debug!(lines = line_no, "Input exhausted");
                        break;
                    };
                    line_no += 1;
                    if line.trim().is_empty() {
                        continue;
                    }
                    stats.lines_read += 1;
                    Self::publish_line(&broker, &line, line_no, &mut stats).await;
                }
            }
        }

        // stop cancels each handler, which syncs the sink
        let stopped = dispatcher.stop(consumer_id, &broker).await;
        let closed = broker.close().await;
        record_subscriptions(0);
        stopped.context("Failed to stop dispatcher")?;
        closed.context("Failed to close broker")?;

        stats.consumer = consumer.metrics().snapshot();
        stats.duration = start_time.elapsed();
        Ok(stats)
    }

    async fn publish_line(
        broker: &InMemoryBroker,
        line: &str,
        line_no: usize,
        stats: &mut PipelineStats,
    ) {
        let envelope = match Envelope::parse(line, line_no) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "Skipping input line");
                record_input_rejected("parse");
                stats.delivery.reject_input();
                return;
            }
        };

        let msg = envelope.into_message();
        let subject = msg.subject.clone();
        let started = Instant::now();

        match broker.publish(msg).await {
            Ok(report) => {
                let outcome = DeliveryOutcome {
                    subject,
                    matched: report.matched,
                    delivered: report.delivered,
                    failed: report.failed,
                    attempts: report.attempts,
                    latency_ms: started.elapsed().as_secs_f64() * 1000.0,
                };
                if report.matched == 0 {
                    debug!(subject = %outcome.subject, line = line_no, "No subscription for subject");
                }
                record_delivery(&outcome);
                stats.delivery.update(&outcome);
            }
            Err(e) => {
                warn!(line = line_no, error = %e, "Publish rejected");
                record_input_rejected("subject");
                stats.delivery.reject_input();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ConfigVersion, Record, ServiceSettings, SinkConfig, SinkType};
    use std::collections::HashMap;

    fn config(path: &std::path::Path, max_redeliveries: u32) -> PipelineConfig {
        PipelineConfig {
            service: ServiceConfig {
                version: ConfigVersion::V1,
                service: ServiceSettings {
                    consumer_id: "writer".into(),
                    metrics_port: None,
                    max_redeliveries,
                },
                sink: SinkConfig {
                    name: "records".into(),
                    sink_type: SinkType::File,
                    params: HashMap::from([("path".to_string(), path.display().to_string())]),
                },
            },
            input: None,
            metrics_port: None,
        }
    }

    const INPUT: &str = concat!(
        r#"{"subject":"messages.ch1","content_type":"application/senml+json","channel":"ch1","publisher":"t1","payload":[{"bn":"dev/","bt":1700000000,"n":"a","v":1},{"n":"b","v":2}]}"#,
        "\n",
        r#"{"subject":"json.ch1","content_type":"application/json","channel":"ch1","publisher":"t1","payload":{"millis_key":1700000000000,"temp":21.5}}"#,
        "\n",
        "\n",
        "not json\n",
        r#"{"subject":"json.ch1","content_type":"application/json","channel":"ch1","publisher":"t1","payload":"{broken"}"#,
        "\n",
        r#"{"subject":"other.ch1","content_type":"application/json","channel":"ch1","publisher":"t1","payload":{}}"#,
        "\n",
    );

    #[tokio::test]
    async fn test_pipeline_writes_records_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("records.jsonl");

        let stats = Pipeline::new(config(&out, 0))
            .run_with_reader(INPUT.as_bytes(), std::future::pending())
            .await
            .unwrap();

        assert!(!stats.interrupted);
        assert_eq!(stats.lines_read, 5);
        assert_eq!(stats.delivery.total_published, 4);
        assert_eq!(stats.delivery.total_delivered, 2);
        assert_eq!(stats.delivery.total_failed, 1);
        assert_eq!(stats.delivery.total_unrouted, 1);
        assert_eq!(stats.delivery.rejected_inputs, 1);
        assert_eq!(stats.consumer.record_count, 3);

        // every acked record is already on disk
        let records: Vec<Record> = std::fs::read_to_string(&out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].name, "dev/a");
        assert_eq!(records[2].name, "temp");
    }

    #[tokio::test]
    async fn test_redeliveries_are_counted() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("records.jsonl");
        let input = r#"{"subject":"json.ch1","content_type":"application/json","channel":"ch1","publisher":"t1","payload":"{broken"}"#;

        let stats = Pipeline::new(config(&out, 2))
            .run_with_reader(input.as_bytes(), std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.delivery.total_failed, 1);
        assert_eq!(stats.delivery.total_redeliveries, 2);
    }

    #[tokio::test]
    async fn test_shutdown_stops_reading() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("records.jsonl");
        let (_tx, rx) = tokio::io::duplex(64);

        let stats = Pipeline::new(config(&out, 0))
            .run_with_reader(BufReader::new(rx), async {})
            .await
            .unwrap();

        assert!(stats.interrupted);
        assert_eq!(stats.lines_read, 0);
    }
}
