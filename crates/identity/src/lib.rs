//! # Identity
//!
//! Key to entity resolution with a local fast path in front of an
//! authoritative `IdentityService`.

pub mod cached;

pub use cached::{CachedIdentity, DEFAULT_KEY_PREFIX};
pub use contracts::{ConnectionIds, IdentityCache, IdentityService};
