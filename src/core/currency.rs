//! Currency rate provider abstractions

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::rates::RateTable;

/// One successful load from a rate provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSnapshot {
    /// Currency all values in `table` are expressed against.
    pub base: String,
    pub table: RateTable,
    pub updated_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    async fn fetch_rates(&self, base: &str) -> Result<RateSnapshot>;
}
