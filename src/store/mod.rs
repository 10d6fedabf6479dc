pub mod disk;
pub mod memory;

use crate::core::cache::{KeyValueCollection, Store};
use disk::DiskCollection;
use fjall::{Keyspace, PartitionCreateOptions};
use memory::MemoryCollection;
use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, RwLock},
};

/// A thread-safe key-value store that can hold multiple named collections.
///
/// Persistent collections map to fjall partitions of one shared keyspace;
/// non-persistent ones live in memory and die with the process.
pub struct KeyValueStore {
    collections: RwLock<HashMap<String, Arc<dyn KeyValueCollection>>>,
    keyspace: Option<Arc<Keyspace>>,
}

impl KeyValueStore {
    pub fn open(data_path: &Path) -> Self {
        let keyspace = fjall::Config::new(data_path).open().ok().map(Arc::new);

        Self {
            collections: RwLock::new(HashMap::new()),
            keyspace,
        }
    }

    /// A store with no backing keyspace; persistent collections are
    /// unavailable and `get_collection(.., true, ..)` returns `None`.
    pub fn ephemeral() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            keyspace: None,
        }
    }
}

impl Store for KeyValueStore {
    fn get_collection(
        &self,
        name: &str,
        persist: bool,
        create_if_missing: bool,
    ) -> Option<Arc<dyn KeyValueCollection>> {
        if create_if_missing {
            let mut collections = self.collections.write().unwrap();
            if !collections.contains_key(name) {
                let new_collection: Option<Arc<dyn KeyValueCollection>> = if persist {
                    self.keyspace.as_ref().and_then(|ks| {
                        ks.open_partition(name, PartitionCreateOptions::default())
                            .ok()
                            .map(|partition| {
                                Arc::new(DiskCollection::new(partition))
                                    as Arc<dyn KeyValueCollection>
                            })
                    })
                } else {
                    Some(Arc::new(MemoryCollection::new()))
                };

                if let Some(collection) = new_collection {
                    collections.insert(name.to_string(), collection);
                } else if persist {
                    return None; // Failed to create persistent collection
                }
            }
        }

        let collections = self.collections.read().unwrap();
        collections.get(name).cloned()
    }

    fn remove_collection(&self, name: &str) -> bool {
        let mut collections = self.collections.write().unwrap();
        collections.remove(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_persistent_and_memory_collections() {
        let dir = tempdir().unwrap();
        let store = KeyValueStore::open(dir.path());

        let disk = store.get_collection("rates", true, true).unwrap();
        disk.put(b"k", b"v", None).await;
        assert_eq!(disk.get(b"k").await, Some(b"v".to_vec()));

        let mem = store.get_collection("scratch", false, true).unwrap();
        mem.put(b"k", b"v", None).await;
        assert_eq!(mem.get(b"k").await, Some(b"v".to_vec()));

        // Same name resolves to the same collection
        let disk_again = store.get_collection("rates", true, false).unwrap();
        assert_eq!(disk_again.get(b"k").await, Some(b"v".to_vec()));

        assert!(store.remove_collection("scratch"));
        assert!(!store.remove_collection("scratch"));
    }

    #[test]
    fn test_ephemeral_store_has_no_persistent_collections() {
        let store = KeyValueStore::ephemeral();
        assert!(store.get_collection("rates", true, true).is_none());
        assert!(store.get_collection("scratch", false, true).is_some());
    }
}
