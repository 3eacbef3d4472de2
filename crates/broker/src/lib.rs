//! # Broker
//!
//! In-process transport implementing the `Subscriber` contract.
//!
//! Subjects are routed with NATS-style wildcards; handler errors can be
//! redelivered a bounded number of times.

pub mod memory;
pub mod subject;

pub use memory::{BrokerConfig, DeliveryReport, InMemoryBroker};
pub use subject::{validate_subject, SubjectPattern};
