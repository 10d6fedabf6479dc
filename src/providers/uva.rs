use crate::core::market::{IndexValue, IndexValueProvider, MarketDatum};
use crate::providers::{LiveFeed, TieredSource, http_client};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const CACHE_TTL: Duration = Duration::from_secs(60 * 60);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Fallback unit value when no tier can produce a fetched one.
const DEFAULT_UVA_VALUE: f64 = 1484.82;

/// Live feed for the UVA index value. Unauthenticated public endpoint.
pub struct UvaIndexFeed {
    base_url: String,
}

impl UvaIndexFeed {
    pub fn new(base_url: &str) -> Self {
        UvaIndexFeed {
            base_url: base_url.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UvaResponse {
    value: f64,
    time: i64,
}

#[async_trait]
impl LiveFeed for UvaIndexFeed {
    type Value = IndexValue;

    fn feed_key(&self) -> &'static str {
        "uva_index"
    }

    fn cache_ttl(&self) -> Duration {
        CACHE_TTL
    }

    fn default_value(&self) -> Option<IndexValue> {
        Some(IndexValue {
            value: DEFAULT_UVA_VALUE,
            quoted_at: None,
        })
    }

    async fn fetch_live(&self) -> Result<IndexValue> {
        let url = format!("{}/api/uva", self.base_url);
        debug!("Requesting UVA value from {}", url);

        let client = http_client(REQUEST_TIMEOUT)?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for UVA feed URL: {}", e, url))?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP error: {} for UVA feed", response.status()));
        }

        let data = response
            .json::<UvaResponse>()
            .await
            .map_err(|e| anyhow!("Failed to parse UVA response: {}", e))?;

        Ok(IndexValue {
            value: data.value,
            quoted_at: Utc.timestamp_opt(data.time, 0).single(),
        })
    }
}

#[async_trait]
impl IndexValueProvider for TieredSource<UvaIndexFeed> {
    async fn current_index(&self) -> Result<MarketDatum<IndexValue>> {
        self.fetch().await
    }
}
