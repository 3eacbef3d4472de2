//! CachedIdentity - cache-first identity lookup

use std::collections::HashMap;

use async_trait::async_trait;
use contracts::{ConnectionIds, ContractError, IdentityCache, IdentityService};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

/// Namespace for cached key lookups
pub const DEFAULT_KEY_PREFIX: &str = "thing_key";

/// Identity cache backed by an authoritative service
///
/// `identify` hits the cache first and populates it from the service on a
/// miss. `connection_ids` is never cached.
pub struct CachedIdentity<S> {
    service: S,
    key_prefix: String,
    entries: RwLock<HashMap<String, String>>,
}

impl<S: IdentityService> CachedIdentity<S> {
    pub fn new(service: S) -> Self {
        Self::with_prefix(service, DEFAULT_KEY_PREFIX)
    }

    pub fn with_prefix(service: S, key_prefix: impl Into<String>) -> Self {
        Self {
            service,
            key_prefix: key_prefix.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    fn cache_key(&self, key: &str) -> String {
        format!("{}:{}", self.key_prefix, key)
    }

    /// Seed the cache with a known mapping
    pub async fn insert(&self, key: &str, entity_id: impl Into<String>) {
        let cache_key = self.cache_key(key);
        self.entries.write().await.insert(cache_key, entity_id.into());
    }

    /// Drop a cached mapping, e.g. after the key was revoked
    pub async fn evict(&self, key: &str) -> Option<String> {
        let cache_key = self.cache_key(key);
        self.entries.write().await.remove(&cache_key)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl<S: IdentityService> IdentityCache for CachedIdentity<S> {
    #[instrument(name = "identity_identify", skip(self, key))]
    async fn identify(&self, key: &str) -> Result<String, ContractError> {
        if key.is_empty() {
            return Err(ContractError::identity(redact(key), "empty key"));
        }

        let cache_key = self.cache_key(key);
        if let Some(id) = self.entries.read().await.get(&cache_key) {
            debug!("identity cache hit");
            return Ok(id.clone());
        }

        let id = self.service.identify(key).await.map_err(|e| {
            warn!(error = %e, "identity service lookup failed");
            into_identity(key, e)
        })?;

        self.entries.write().await.insert(cache_key, id.clone());
        debug!("identity cache populated");
        Ok(id)
    }

    #[instrument(name = "identity_connection_ids", skip(self, key))]
    async fn connection_ids(&self, key: &str) -> Result<ConnectionIds, ContractError> {
        self.service
            .connection_by_key(key)
            .await
            .map_err(|e| into_identity(key, e))
    }
}

/// Keys are credentials; errors only carry a masked form
fn into_identity(key: &str, err: ContractError) -> ContractError {
    match err {
        ContractError::Identity { message, .. } => ContractError::identity(redact(key), message),
        other => ContractError::identity(redact(key), other.to_string()),
    }
}

/// First three characters of long keys, nothing of short ones
fn redact(key: &str) -> String {
    if key.chars().count() <= 6 {
        return "***".to_string();
    }
    let visible: String = key.chars().take(3).collect();
    format!("{visible}***")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MockService {
        identify_calls: AtomicUsize,
        connection_calls: AtomicUsize,
    }

    #[async_trait]
    impl IdentityService for MockService {
        async fn identify(&self, key: &str) -> Result<String, ContractError> {
            self.identify_calls.fetch_add(1, Ordering::SeqCst);
            match key {
                "known" => Ok("thing-1".to_string()),
                _ => Err(ContractError::Other("not found".into())),
            }
        }

        async fn connection_by_key(&self, key: &str) -> Result<ConnectionIds, ContractError> {
            self.connection_calls.fetch_add(1, Ordering::SeqCst);
            match key {
                "known" => Ok(ConnectionIds {
                    entity_id: "thing-1".into(),
                    channel_id: "chan-1".into(),
                }),
                _ => Err(ContractError::identity(key, "no connection")),
            }
        }
    }

    #[tokio::test]
    async fn test_identify_populates_cache() {
        let cache = CachedIdentity::new(MockService::default());

        assert_eq!(cache.identify("known").await.unwrap(), "thing-1");
        assert_eq!(cache.identify("known").await.unwrap(), "thing-1");

        assert_eq!(cache.service().identify_calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_seeded_entry_skips_service() {
        let cache = CachedIdentity::new(MockService::default());
        cache.insert("unknown", "thing-9").await;

        assert_eq!(cache.identify("unknown").await.unwrap(), "thing-9");
        assert_eq!(cache.service().identify_calls.load(Ordering::SeqCst), 0);

        cache.evict("unknown").await;
        assert!(cache.identify("unknown").await.is_err());
    }

    #[tokio::test]
    async fn test_service_error_is_identity_error() {
        let cache = CachedIdentity::new(MockService::default());
        let err = cache.identify("missing").await.unwrap_err();
        assert!(matches!(err, ContractError::Identity { ref key, .. } if key == "***"));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_errors_do_not_leak_key() {
        let cache = CachedIdentity::new(MockService::default());
        let secret = "sk-0123456789abcdef";

        let err = cache.identify(secret).await.unwrap_err();
        assert!(!err.to_string().contains(secret));
        assert!(matches!(err, ContractError::Identity { ref key, .. } if key == "sk-***"));

        let err = cache.connection_ids(secret).await.unwrap_err();
        assert!(!err.to_string().contains(secret));
    }

    #[tokio::test]
    async fn test_connection_ids_always_hit_service() {
        let cache = CachedIdentity::new(MockService::default());
        for _ in 0..2 {
            let ids = cache.connection_ids("known").await.unwrap();
            assert_eq!(ids.channel_id, "chan-1");
        }
        assert_eq!(cache.service().connection_calls.load(Ordering::SeqCst), 2);
        assert!(cache.connection_ids("missing").await.is_err());
    }
}
