//! Market data feeds and the tiered acquisition policy.
//!
//! Each feed knows how to perform one live fetch; `TieredSource` wraps a
//! feed with the degradation chain: fresh cache, live call, durable
//! last-known value, hardcoded default. Upstream failures never propagate
//! past the chain. Concurrent fetches for the same feed may race to store
//! the same value; last writer wins and no locking is needed.

pub mod banco;
pub mod bcra;
pub mod uva;

use crate::core::cache::KeyValueCollection;
use crate::core::market::{MarketDatum, SourceTier};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// One upstream data feed.
#[async_trait]
pub trait LiveFeed: Send + Sync {
    type Value: Clone + Serialize + DeserializeOwned + Send + Sync;

    /// Key under which cached and last-known values are stored.
    fn feed_key(&self) -> &'static str;

    fn cache_ttl(&self) -> Duration;

    /// Hardcoded fallback when every other tier comes up empty.
    fn default_value(&self) -> Option<Self::Value>;

    async fn fetch_live(&self) -> Result<Self::Value>;
}

/// Persisted form of a fetched value. The tier is assigned on return and
/// never stored: the same bytes serve the cache and the last-known slot.
#[derive(Serialize, Deserialize)]
struct StoredDatum<T> {
    value: T,
    fetched_at: DateTime<Utc>,
}

pub struct TieredSource<F: LiveFeed> {
    feed: F,
    cache: Arc<dyn KeyValueCollection>,
    last_known: Arc<dyn KeyValueCollection>,
}

impl<F: LiveFeed> TieredSource<F> {
    pub fn new(
        feed: F,
        cache: Arc<dyn KeyValueCollection>,
        last_known: Arc<dyn KeyValueCollection>,
    ) -> Self {
        Self {
            feed,
            cache,
            last_known,
        }
    }

    /// Fetches the freshest available value, degrading tier by tier.
    ///
    /// The only error is a feed with no default constant configured; any
    /// upstream failure resolves to one of the fallback tiers. No retries:
    /// a failed live call falls through immediately.
    pub async fn fetch(&self) -> Result<MarketDatum<F::Value>> {
        let key = self.feed.feed_key().as_bytes();

        if let Some(raw) = self.cache.get(key).await {
            match serde_json::from_slice::<StoredDatum<F::Value>>(&raw) {
                Ok(stored) => {
                    debug!(feed = self.feed.feed_key(), "Serving cached value");
                    return Ok(MarketDatum {
                        value: stored.value,
                        fetched_at: stored.fetched_at,
                        tier: SourceTier::Cache,
                    });
                }
                // An unreadable entry is treated as a miss
                Err(e) => warn!(feed = self.feed.feed_key(), error = %e, "Discarding cache entry"),
            }
        }

        match self.feed.fetch_live().await {
            Ok(value) => {
                let stored = StoredDatum {
                    value,
                    fetched_at: Utc::now(),
                };
                match serde_json::to_vec(&stored) {
                    Ok(bytes) => {
                        self.cache
                            .put(key, &bytes, Some(self.feed.cache_ttl()))
                            .await;
                        self.last_known.put(key, &bytes, None).await;
                    }
                    Err(e) => {
                        warn!(feed = self.feed.feed_key(), error = %e, "Failed to store value")
                    }
                }
                debug!(feed = self.feed.feed_key(), "Serving live value");
                Ok(MarketDatum {
                    value: stored.value,
                    fetched_at: stored.fetched_at,
                    tier: SourceTier::Live,
                })
            }
            Err(e) => {
                warn!(feed = self.feed.feed_key(), error = %e, "Live fetch failed, degrading");

                if let Some(raw) = self.last_known.get(key).await {
                    if let Ok(stored) = serde_json::from_slice::<StoredDatum<F::Value>>(&raw) {
                        return Ok(MarketDatum {
                            value: stored.value,
                            fetched_at: stored.fetched_at,
                            tier: SourceTier::LastKnown,
                        });
                    }
                }

                match self.feed.default_value() {
                    Some(value) => Ok(MarketDatum {
                        value,
                        fetched_at: Utc::now(),
                        tier: SourceTier::Default,
                    }),
                    None => Err(anyhow!(
                        "No default value configured for feed: {}",
                        self.feed.feed_key()
                    )),
                }
            }
        }
    }
}

/// Shared client construction for the live feeds. The timeout bounds how
/// long a dead upstream can stall a calculation before the chain degrades.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent("uvacalc/0.2")
        .timeout(timeout)
        .build()?)
}
