//! Market data types and provider abstractions.
//!
//! Every fetched value carries its provenance: which tier of the fallback
//! chain produced it and when it was originally fetched. The tier is never
//! hidden from callers since the UI layer drives staleness messaging off it.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Which tier of the fallback chain produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTier {
    Live,
    Cache,
    LastKnown,
    Default,
}

impl Display for SourceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SourceTier::Live => "live",
                SourceTier::Cache => "cache",
                SourceTier::LastKnown => "last_known",
                SourceTier::Default => "default",
            }
        )
    }
}

/// A fetched market value together with its provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDatum<T> {
    pub value: T,
    pub fetched_at: DateTime<Utc>,
    pub tier: SourceTier,
}

/// Current value of the UVA unit of account, in pesos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexValue {
    pub value: f64,
    /// Upstream quote timestamp, when the feed reports one.
    pub quoted_at: Option<DateTime<Utc>>,
}

/// The mortgage rate triple. `tna_rate` drives the amortization; the other
/// two are informational.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateSet {
    pub tna_rate: f64,
    pub tea_rate: f64,
    pub cftea_rate: f64,
}

/// One institution's USD buy/sell quote. Display-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankQuote {
    pub name: String,
    pub buy: f64,
    pub sell: f64,
    pub quoted_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait IndexValueProvider: Send + Sync {
    async fn current_index(&self) -> Result<MarketDatum<IndexValue>>;
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn current_rates(&self) -> Result<MarketDatum<RateSet>>;
}

#[async_trait]
pub trait BankQuoteProvider: Send + Sync {
    async fn current_quotes(&self) -> Result<MarketDatum<Vec<BankQuote>>>;
}
