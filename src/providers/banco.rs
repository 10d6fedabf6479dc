use crate::core::market::{BankQuote, BankQuoteProvider, MarketDatum};
use crate::providers::{LiveFeed, TieredSource, http_client};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const CACHE_TTL: Duration = Duration::from_secs(30 * 60);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Live feed for per-bank USD buy/sell quotes. Display-only: nothing in
/// the calculation consumes these, but they share the fallback policy of
/// the other feeds. The default is an empty list, which the UI renders as
/// "no data".
pub struct BankQuotesFeed {
    base_url: String,
}

impl BankQuotesFeed {
    pub fn new(base_url: &str) -> Self {
        BankQuotesFeed {
            base_url: base_url.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct QuoteEntry {
    buy: f64,
    sell: f64,
    time: Option<i64>,
}

#[async_trait]
impl LiveFeed for BankQuotesFeed {
    type Value = Vec<BankQuote>;

    fn feed_key(&self) -> &'static str {
        "bank_quotes"
    }

    fn cache_ttl(&self) -> Duration {
        CACHE_TTL
    }

    fn default_value(&self) -> Option<Vec<BankQuote>> {
        Some(Vec::new())
    }

    async fn fetch_live(&self) -> Result<Vec<BankQuote>> {
        let url = format!("{}/api/bancostodos", self.base_url);
        debug!("Requesting bank quotes from {}", url);

        let client = http_client(REQUEST_TIMEOUT)?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for bank quotes URL: {}", e, url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for bank quotes",
                response.status()
            ));
        }

        let banks = response
            .json::<HashMap<String, QuoteEntry>>()
            .await
            .map_err(|e| anyhow!("Failed to parse bank quotes: {}", e))?;

        let mut quotes: Vec<BankQuote> = banks
            .into_iter()
            .map(|(name, entry)| BankQuote {
                name,
                buy: entry.buy,
                sell: entry.sell,
                quoted_at: entry
                    .time
                    .and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
            })
            .collect();
        quotes.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(quotes)
    }
}

#[async_trait]
impl BankQuoteProvider for TieredSource<BankQuotesFeed> {
    async fn current_quotes(&self) -> Result<MarketDatum<Vec<BankQuote>>> {
        self.fetch().await
    }
}
