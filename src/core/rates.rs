//! Rate table and the store answering pairwise-rate queries

use anyhow::{Result as AnyResult, bail};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::currency::{CurrencyRateProvider, RateSnapshot};
use super::error::{AppError, Result};

/// Mapping from currency code to its value against an implicit base
/// currency. Every value is finite and strictly positive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: HashMap<String, f64>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Codes in case-sensitive ascending order.
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.rates.keys().cloned().collect();
        codes.sort();
        codes
    }
}

impl TryFrom<HashMap<String, f64>> for RateTable {
    type Error = anyhow::Error;

    fn try_from(rates: HashMap<String, f64>) -> AnyResult<Self> {
        for (code, value) in &rates {
            if !value.is_finite() || *value <= 0.0 {
                bail!("Invalid rate {value} for currency {code}");
            }
        }
        Ok(RateTable { rates })
    }
}

impl<const N: usize> TryFrom<[(&str, f64); N]> for RateTable {
    type Error = anyhow::Error;

    fn try_from(pairs: [(&str, f64); N]) -> AnyResult<Self> {
        pairs
            .into_iter()
            .map(|(code, value)| (code.to_string(), value))
            .collect::<HashMap<_, _>>()
            .try_into()
    }
}

/// Load state of the store.
#[derive(Debug, Clone, PartialEq)]
pub enum RateStatus {
    /// No refresh has been started yet.
    Idle,
    Loading,
    Loaded,
    Failed(AppError),
}

/// Identifies one in-flight refresh. Results carrying an older ticket are
/// discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket(u64);

pub struct RateStore {
    base: String,
    table: RateTable,
    updated_at: Option<DateTime<Utc>>,
    status: RateStatus,
    generation: u64,
}

impl RateStore {
    pub fn new(base: &str) -> Self {
        RateStore {
            base: base.to_string(),
            table: RateTable::new(),
            updated_at: None,
            status: RateStatus::Idle,
            generation: 0,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn table(&self) -> &RateTable {
        &self.table
    }

    pub fn status(&self) -> &RateStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == RateStatus::Loading
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Fetches a fresh table and swaps it in whole. On failure the current
    /// table is kept.
    pub async fn refresh(&mut self, provider: &dyn CurrencyRateProvider) -> Result<()> {
        let ticket = self.begin_refresh();
        let fetched = provider.fetch_rates(&self.base).await;
        self.finish_refresh(ticket, fetched).map(|_| ())
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.generation += 1;
        self.status = RateStatus::Loading;
        debug!(generation = self.generation, "Rate refresh started");
        RefreshTicket(self.generation)
    }

    /// Applies the outcome of the refresh identified by `ticket`. Returns
    /// `Ok(false)` when the ticket is stale and nothing changed.
    pub fn finish_refresh(
        &mut self,
        ticket: RefreshTicket,
        fetched: AnyResult<RateSnapshot>,
    ) -> Result<bool> {
        if ticket.0 != self.generation {
            debug!(
                ticket = ticket.0,
                current = self.generation,
                "Discarding stale rate refresh"
            );
            return Ok(false);
        }

        match fetched {
            Ok(snapshot) => {
                info!(
                    base = %snapshot.base,
                    currencies = snapshot.table.len(),
                    "Loaded exchange rates"
                );
                self.base = snapshot.base;
                self.table = snapshot.table;
                self.updated_at = snapshot.updated_at;
                self.status = RateStatus::Loaded;
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "Rate refresh failed");
                let err = AppError::fetch_failed(&e);
                self.status = RateStatus::Failed(err.clone());
                Err(err)
            }
        }
    }

    /// Units of `to` bought by one unit of `from`, or `None` if either code
    /// is unknown.
    pub fn pair_rate(&self, from: &str, to: &str) -> Option<f64> {
        let from_value = self.table.get(from)?;
        let to_value = self.table.get(to)?;
        Some(to_value / from_value)
    }

    pub fn list_codes(&self) -> Vec<String> {
        self.table.codes()
    }
}
