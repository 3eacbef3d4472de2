//! Pipeline metrics
//!
//! Prometheus recording helpers plus an in-memory aggregator for the
//! end-of-run summary.

use std::collections::BTreeMap;

use metrics::{counter, gauge, histogram};

/// Outcome of publishing one message on the transport
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeliveryOutcome {
    /// Subject the message was published on
    pub subject: String,
    /// Subscriptions that matched
    pub matched: usize,
    /// Subscriptions whose handler succeeded
    pub delivered: usize,
    /// Subscriptions whose handler failed on every attempt
    pub failed: usize,
    /// Handler invocations, redeliveries included
    pub attempts: usize,
    /// Publish to last handler return
    pub latency_ms: f64,
}

/// Record one publish
///
/// # Example
///
/// ```ignore
/// use observability::metrics::{record_delivery, DeliveryOutcome};
///
/// let report = broker.publish(msg).await?;
/// record_delivery(&DeliveryOutcome { subject, matched: report.matched, ..Default::default() });
/// ```
pub fn record_delivery(outcome: &DeliveryOutcome) {
    let family = subject_family(&outcome.subject).to_string();

    counter!("msg_consumer_messages_published_total", "family" => family.clone()).increment(1);

    if outcome.matched == 0 {
        counter!("msg_consumer_messages_unrouted_total", "family" => family.clone()).increment(1);
    }
    if outcome.failed > 0 {
        counter!("msg_consumer_messages_failed_total", "family" => family.clone())
            .increment(outcome.failed as u64);
    }
    if outcome.attempts > outcome.matched {
        counter!("msg_consumer_redeliveries_total", "family" => family.clone())
            .increment((outcome.attempts - outcome.matched) as u64);
    }

    histogram!("msg_consumer_delivery_latency_ms", "family" => family).record(outcome.latency_ms);
}

/// Record an input line that never became a message
pub fn record_input_rejected(reason: &str) {
    counter!(
        "msg_consumer_input_rejected_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Record the number of live subscriptions
pub fn record_subscriptions(count: usize) {
    gauge!("msg_consumer_subscriptions").set(count as f64);
}

/// First token of a subject (`messages.ch1.temp` → `messages`)
pub fn subject_family(subject: &str) -> &str {
    subject.split('.').next().unwrap_or(subject)
}

/// In-memory aggregation of delivery outcomes
#[derive(Debug, Clone, Default)]
pub struct PipelineMetricsAggregator {
    pub total_published: u64,
    pub total_delivered: u64,
    pub total_failed: u64,
    pub total_unrouted: u64,
    pub total_redeliveries: u64,
    pub rejected_inputs: u64,

    /// Delivery latency statistics
    pub latency_stats: RunningStats,

    /// Published messages per subject family
    pub family_counts: BTreeMap<String, u64>,
}

impl PipelineMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in one publish
    pub fn update(&mut self, outcome: &DeliveryOutcome) {
        self.total_published += 1;
        self.total_delivered += outcome.delivered as u64;
        self.total_failed += outcome.failed as u64;
        if outcome.matched == 0 {
            self.total_unrouted += 1;
        }
        self.total_redeliveries += outcome.attempts.saturating_sub(outcome.matched) as u64;
        self.latency_stats.push(outcome.latency_ms);

        *self
            .family_counts
            .entry(subject_family(&outcome.subject).to_string())
            .or_insert(0) += 1;
    }

    pub fn reject_input(&mut self) {
        self.rejected_inputs += 1;
    }

    /// Generate summary report
    pub fn summary(&self) -> MetricsSummary {
        let deliveries = self.total_delivered + self.total_failed;
        MetricsSummary {
            total_published: self.total_published,
            total_delivered: self.total_delivered,
            total_failed: self.total_failed,
            total_unrouted: self.total_unrouted,
            total_redeliveries: self.total_redeliveries,
            rejected_inputs: self.rejected_inputs,
            failure_rate: if deliveries > 0 {
                self.total_failed as f64 / deliveries as f64 * 100.0
            } else {
                0.0
            },
            latency_ms: StatsSummary::from(&self.latency_stats),
            family_counts: self.family_counts.clone(),
        }
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_published: u64,
    pub total_delivered: u64,
    pub total_failed: u64,
    pub total_unrouted: u64,
    pub total_redeliveries: u64,
    pub rejected_inputs: u64,
    pub failure_rate: f64,
    pub latency_ms: StatsSummary,
    pub family_counts: BTreeMap<String, u64>,
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
