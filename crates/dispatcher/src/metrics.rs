//! Consumer metrics and the metering middleware

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use contracts::{Consumable, Consumer, ContractError, Flush};
use metrics::{counter, histogram};
use tracing::{debug, warn};

/// Counters for a single consumer
#[derive(Debug, Default)]
pub struct ConsumerMetrics {
    /// Successful consume calls
    consume_count: AtomicU64,
    /// Failed consume calls
    failure_count: AtomicU64,
    /// Records handed over by successful calls
    record_count: AtomicU64,
    /// Raw messages handed over by successful calls
    raw_count: AtomicU64,
}

impl ConsumerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn consume_count(&self) -> u64 {
        self.consume_count.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn record_count(&self) -> u64 {
        self.record_count.load(Ordering::Relaxed)
    }

    pub fn raw_count(&self) -> u64 {
        self.raw_count.load(Ordering::Relaxed)
    }

    fn on_success(&self, records: usize, raw: bool) {
        self.consume_count.fetch_add(1, Ordering::Relaxed);
        self.record_count.fetch_add(records as u64, Ordering::Relaxed);
        if raw {
            self.raw_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn on_failure(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            consume_count: self.consume_count(),
            failure_count: self.failure_count(),
            record_count: self.record_count(),
            raw_count: self.raw_count(),
        }
    }
}

/// Snapshot of consumer metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub consume_count: u64,
    pub failure_count: u64,
    pub record_count: u64,
    pub raw_count: u64,
}

/// Logging and metrics around any consumer
///
/// Results pass through unchanged.
pub struct Metered<C> {
    inner: C,
    metrics: Arc<ConsumerMetrics>,
}

impl<C: Consumer + Sync> Metered<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            metrics: Arc::new(ConsumerMetrics::new()),
        }
    }

    pub fn metrics(&self) -> &Arc<ConsumerMetrics> {
        &self.metrics
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: Consumer + Sync> Consumer for Metered<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn consume(&self, input: Consumable) -> Result<(), ContractError> {
        let name = self.inner.name().to_string();
        let len = input.len();
        let raw = matches!(input, Consumable::Raw(_));
        let started = Instant::now();

        let result = self.inner.consume(input).await;

        let elapsed = started.elapsed();
        histogram!("msg_consumer_consume_duration_seconds", "consumer" => name.clone())
            .record(elapsed.as_secs_f64());

        match &result {
            Ok(()) => {
                self.metrics.on_success(len, raw);
                counter!("msg_consumer_consume_total", "consumer" => name.clone(), "status" => "ok")
                    .increment(1);
                counter!("msg_consumer_records_total", "consumer" => name.clone())
                    .increment(len as u64);
                debug!(
                    consumer = %name,
                    records = len,
                    took_us = elapsed.as_micros() as u64,
                    "consume completed"
                );
            }
            Err(e) => {
                self.metrics.on_failure();
                counter!("msg_consumer_consume_total", "consumer" => name.clone(), "status" => "failed")
                    .increment(1);
                warn!(
                    consumer = %name,
                    records = len,
                    took_us = elapsed.as_micros() as u64,
                    error = %e,
                    "consume failed"
                );
            }
        }

        result
    }
}

#[async_trait]
impl<C: Consumer + Flush> Flush for Metered<C> {
    async fn flush(&self) -> Result<(), ContractError> {
        self.inner.flush().await
    }
}
