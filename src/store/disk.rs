use crate::core::cache::KeyValueCollection;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fjall::PartitionHandle;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Option<DateTime<Utc>>,
}

/// Durable collection backed by a fjall partition. Expiry is stored with
/// the entry and enforced on read, so TTLs survive process restarts.
pub struct DiskCollection {
    partition: PartitionHandle,
}

impl DiskCollection {
    pub fn new(partition: PartitionHandle) -> Self {
        Self { partition }
    }
}

#[async_trait]
impl KeyValueCollection for DiskCollection {
    async fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        let res: Result<Option<Vec<u8>>> = (|| {
            if let Some(raw) = self.partition.get(key)? {
                let entry: CacheEntry = serde_json::from_slice(&raw)?;
                if let Some(expires_at) = entry.expires_at {
                    if Utc::now() > expires_at {
                        debug!("Cache entry expired for key: {:?}", key);
                        self.partition.remove(key)?;
                        return Ok(None);
                    }
                }
                debug!("Cache HIT for key: {:?}", key);
                return Ok(Some(entry.value));
            }
            debug!("Cache MISS for key: {:?}", key);
            Ok(None)
        })();

        match res {
            Ok(val) => val,
            Err(e) => {
                debug!("DiskCollection get error: {}", e);
                None
            }
        }
    }

    async fn put(&self, key: &[u8], value: &[u8], ttl: Option<Duration>) {
        let res: Result<()> = (|| {
            let expires_at = ttl.and_then(|d| {
                chrono::Duration::from_std(d)
                    .ok()
                    .map(|d| Utc::now() + d)
            });
            let entry = CacheEntry {
                value: value.to_vec(),
                expires_at,
            };
            self.partition.insert(key, serde_json::to_vec(&entry)?)?;
            debug!("Cache PUT for key: {:?}", key);
            Ok(())
        })();
        if let Err(e) = res {
            debug!("DiskCollection put error: {}", e);
        }
    }

    async fn remove(&self, key: &[u8]) {
        if let Err(e) = self.partition.remove(key) {
            debug!("DiskCollection remove error: {}", e);
        }
    }

    async fn clear(&self) {
        let res: Result<()> = (|| {
            let keys: Vec<_> = self
                .partition
                .iter()
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .map(|(k, _)| k)
                .collect();
            for key in keys {
                self.partition.remove(key)?;
            }
            Ok(())
        })();
        if let Err(e) = res {
            debug!("DiskCollection clear error: {}", e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fjall::PartitionCreateOptions;
    use tempfile::tempdir;
    use tokio::time::sleep;

    fn open_collection(path: &std::path::Path) -> DiskCollection {
        let keyspace = fjall::Config::new(path).open().unwrap();
        let partition = keyspace
            .open_partition("test", PartitionCreateOptions::default())
            .unwrap();
        DiskCollection::new(partition)
    }

    #[tokio::test]
    async fn test_disk_collection_get_put() {
        let dir = tempdir().unwrap();
        let cache = open_collection(dir.path());

        // Initially, cache is empty
        assert!(cache.get(b"key1").await.is_none());

        // Put a value without TTL
        cache.put(b"key1", b"uno", None).await;

        // Get the value
        assert_eq!(cache.get(b"key1").await, Some(b"uno".to_vec()));

        // Get a non-existent key
        assert!(cache.get(b"key2").await.is_none());
    }

    #[tokio::test]
    async fn test_disk_collection_ttl_expiration() {
        let dir = tempdir().unwrap();
        let cache = open_collection(dir.path());

        // Put value with 10ms TTL
        cache
            .put(b"key1", b"uno", Some(Duration::from_millis(10)))
            .await;
        assert_eq!(cache.get(b"key1").await, Some(b"uno".to_vec()));

        // Wait for TTL expiration
        sleep(Duration::from_millis(20)).await;
        assert!(cache.get(b"key1").await.is_none());
    }

    #[tokio::test]
    async fn test_disk_collection_remove() {
        let dir = tempdir().unwrap();
        let cache = open_collection(dir.path());

        cache.put(b"key1", b"uno", None).await;
        assert_eq!(cache.get(b"key1").await, Some(b"uno".to_vec()));

        cache.remove(b"key1").await;
        assert!(cache.get(b"key1").await.is_none());
    }

    #[tokio::test]
    async fn test_disk_collection_clear() {
        let dir = tempdir().unwrap();
        let cache = open_collection(dir.path());

        cache.put(b"key1", b"uno", None).await;
        cache.put(b"key2", b"dos", None).await;

        cache.clear().await;

        assert!(cache.get(b"key1").await.is_none());
        assert!(cache.get(b"key2").await.is_none());
    }
}
