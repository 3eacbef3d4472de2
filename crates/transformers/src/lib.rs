//! # Transformers
//!
//! Payload normalization module.
//!
//! Responsibilities:
//! - Decode SenML packs (JSON and CBOR) and resolve base/delta entries
//! - Flatten arbitrary JSON objects into records, locating timestamps via
//!   configured time fields
//! - Map declared content types to transformer instances
//!
//! ## Usage Example
//!
//! ```ignore
//! use transformers::TransformerRegistry;
//!
//! let registry = TransformerRegistry::default();
//! let transformer = registry.resolve("application/senml+json")?;
//! let records = transformer.transform(&message)?;
//! ```
//!
//! Transformers are immutable values: they hold no shared state and can be
//! invoked concurrently from any number of deliveries.

mod error;
mod json;
mod registry;
mod senml;
mod transformer;

// Re-exports
pub use contracts::{ContentType, Record, TimeField};
pub use error::{Result, TransformError};
pub use json::JsonTransformer;
pub use registry::TransformerRegistry;
pub use senml::SenmlTransformer;
pub use transformer::Transformer;
