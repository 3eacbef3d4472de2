//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace: the raw
//! message envelope, the canonical record, content types, time fields,
//! subscription bindings, service configuration and the traits at each seam
//! (transport, handler, consumer, identity).
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Every instant is a `DateTime<Utc>`
//! - `Message::created` is the ingestion time stamped by the transport and is
//!   the fallback timestamp for payloads that carry none

mod config;
mod consumer;
mod content_type;
mod error;
mod handler;
mod identity;
mod message;
mod record;
mod subscription;
mod time_field;

pub use config::*;
pub use consumer::*;
pub use content_type::ContentType;
pub use error::*;
pub use handler::{MessageHandler, Subscriber};
pub use identity::{ConnectionIds, IdentityCache, IdentityService};
pub use message::Message;
pub use record::{Consumable, Record, RecordValue};
pub use subscription::*;
pub use time_field::*;
