//! # Dispatcher
//!
//! Subscription wiring and record delivery.
//!
//! Responsible for:
//! - Binding one transformer per subject on a `Subscriber`
//! - Running transform then consume for every delivery
//! - Consumer implementations and the metering middleware

pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod metrics;
pub mod sinks;

pub use contracts::{Consumable, Consumer, Flush};
pub use dispatcher::Dispatcher;
pub use error::DispatcherError;
pub use handler::TransformHandler;
pub use metrics::{ConsumerMetrics, Metered, MetricsSnapshot};
pub use sinks::{
    FileConsumer, FileConsumerConfig, LogConsumer, LogNotifier, Notification, Notifier,
    NotifyConsumer, SinkConsumer,
};
