//! Identity lookup contracts
//!
//! Used by sinks that need authorization context; the normalization core
//! never calls these.

use async_trait::async_trait;

use crate::ContractError;

/// Entity and channel a key is connected through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionIds {
    pub entity_id: String,
    pub channel_id: String,
}

/// Identity resolution with a fast path
#[async_trait]
pub trait IdentityCache: Send + Sync {
    /// Resolve a key to the owning entity id
    async fn identify(&self, key: &str) -> Result<String, ContractError>;

    /// Resolve a key to its entity and channel ids
    async fn connection_ids(&self, key: &str) -> Result<ConnectionIds, ContractError>;
}

/// Authoritative identity service behind the cache
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn identify(&self, key: &str) -> Result<String, ContractError>;

    async fn connection_by_key(&self, key: &str) -> Result<ConnectionIds, ContractError>;
}
