//! Pipeline orchestration module.

mod envelope;
mod orchestrator;
mod stats;

pub use envelope::Envelope;
pub use orchestrator::{Pipeline, PipelineConfig};
pub use stats::PipelineStats;
