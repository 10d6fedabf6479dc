//! Accumulated wizard answers, keyed by a caller-supplied session key.
//!
//! Each step submits only its own fields; the store merges them over
//! whatever earlier steps left behind. Sessions expire after an hour of
//! inactivity; every merge refreshes the clock.

use crate::core::cache::KeyValueCollection;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const SESSION_TTL: Duration = Duration::from_secs(60 * 60);

pub struct SessionStore {
    collection: Arc<dyn KeyValueCollection>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(collection: Arc<dyn KeyValueCollection>) -> Self {
        Self::with_ttl(collection, SESSION_TTL)
    }

    pub fn with_ttl(collection: Arc<dyn KeyValueCollection>, ttl: Duration) -> Self {
        Self { collection, ttl }
    }

    /// Merges new fields over the stored ones and returns the full map.
    pub async fn merge(
        &self,
        session_key: &str,
        fields: HashMap<String, String>,
    ) -> HashMap<String, String> {
        let mut merged = self.get(session_key).await;
        merged.extend(fields);

        match serde_json::to_vec(&merged) {
            Ok(bytes) => {
                self.collection
                    .put(session_key.as_bytes(), &bytes, Some(self.ttl))
                    .await;
            }
            Err(e) => debug!("Failed to store session {}: {}", session_key, e),
        }
        merged
    }

    pub async fn get(&self, session_key: &str) -> HashMap<String, String> {
        match self.collection.get(session_key.as_bytes()).await {
            // An unreadable session starts over empty
            Some(raw) => serde_json::from_slice(&raw).unwrap_or_default(),
            None => HashMap::new(),
        }
    }

    pub async fn clear(&self, session_key: &str) {
        self.collection.remove(session_key.as_bytes()).await;
    }
}
