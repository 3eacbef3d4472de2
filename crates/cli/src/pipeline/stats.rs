//! Pipeline statistics.

use std::time::Duration;

use dispatcher::MetricsSnapshot;
use observability::PipelineMetricsAggregator;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Input lines read (blank lines excluded)
    pub lines_read: u64,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Stopped by a shutdown signal before the input ended
    pub interrupted: bool,

    /// Sink name and type
    pub sink: String,

    /// Consumer-side counters
    pub consumer: MetricsSnapshot,

    /// Transport-side aggregation
    pub delivery: PipelineMetricsAggregator,
}

impl PipelineStats {
    /// Messages per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.delivery.total_published as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Consumer Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Lines read: {}", self.lines_read);
        println!("   ├─ Throughput: {:.2} msg/s", self.throughput());
        println!("   ├─ Sink: {}", self.sink);
        println!(
            "   └─ Stopped by: {}",
            if self.interrupted { "signal" } else { "end of input" }
        );

        let summary = self.delivery.summary();

        println!("\n📨 Transport");
        println!("   ├─ Published: {}", summary.total_published);
        println!("   ├─ Delivered: {}", summary.total_delivered);
        println!(
            "   ├─ Failed: {} ({:.2}%)",
            summary.total_failed, summary.failure_rate
        );
        println!("   ├─ Unrouted: {}", summary.total_unrouted);
        println!("   ├─ Redeliveries: {}", summary.total_redeliveries);
        println!("   ├─ Rejected lines: {}", summary.rejected_inputs);
        println!("   └─ Latency (ms): {}", summary.latency_ms);

        println!("\n📤 Consumer");
        println!("   ├─ Successful calls: {}", self.consumer.consume_count);
        println!("   ├─ Failed calls: {}", self.consumer.failure_count);
        println!("   ├─ Records written: {}", self.consumer.record_count);
        println!("   └─ Raw messages: {}", self.consumer.raw_count);

        if !summary.family_counts.is_empty() {
            println!("\n🔀 Subjects");
            for (family, count) in &summary.family_counts {
                println!("   ├─ {}.>: {}", family, count);
            }
        }

        println!();
    }
}
