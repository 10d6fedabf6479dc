//! Storage seams for cached and durable data.
//!
//! The fallback chain needs two kinds of storage: a short-term cache whose
//! entries expire, and a durable last-known-good slot that never does. Both
//! are byte-oriented collections so callers own the serialization format.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
pub trait KeyValueCollection: Send + Sync {
    async fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Stores a value. `None` TTL means the entry never expires.
    async fn put(&self, key: &[u8], value: &[u8], ttl: Option<Duration>);

    async fn remove(&self, key: &[u8]);

    async fn clear(&self);
}

pub trait Store: Send + Sync {
    fn get_collection(
        &self,
        name: &str,
        persist: bool,
        create_if_missing: bool,
    ) -> Option<Arc<dyn KeyValueCollection>>;

    fn remove_collection(&self, name: &str) -> bool;
}
