use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::core::currency::{CurrencyRateProvider, RateSnapshot};
use crate::core::rates::RateTable;

// ExchangeRateApiProvider implementation for CurrencyRateProvider
pub struct ExchangeRateApiProvider {
    base_url: String,
    api_key: String,
}

impl ExchangeRateApiProvider {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        ExchangeRateApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn latest_url(&self, base: &str, api_key: &str) -> String {
        format!("{}/v6/{}/latest/{}", self.base_url, api_key, base)
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default, rename = "error-type")]
    error_type: Option<String>,
    #[serde(default)]
    base_code: Option<String>,
    #[serde(default)]
    time_last_update_unix: Option<i64>,
    #[serde(default)]
    conversion_rates: Option<HashMap<String, f64>>,
}

fn provider_error(body: &str) -> Option<String> {
    serde_json::from_str::<LatestRatesResponse>(body)
        .ok()
        .and_then(|r| r.error_type)
}

#[async_trait]
impl CurrencyRateProvider for ExchangeRateApiProvider {
    #[instrument(
        name = "ExchangeRateFetch",
        skip(self),
        fields(base = %base)
    )]
    async fn fetch_rates(&self, base: &str) -> Result<RateSnapshot> {
        let url = self.latest_url(base, &self.api_key);
        // The key is part of the path, keep it out of logs and errors
        let redacted = self.latest_url(base, "***");
        debug!("Requesting exchange rates from {}", redacted);

        let client = reqwest::Client::builder()
            .user_agent("cambio/0.1")
            .build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error for base {}: {}", base, e.without_url()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| {
                anyhow!(
                    "Failed to read response body for base {}: {}",
                    base,
                    e.without_url()
                )
            })?;

        if !status.is_success() {
            return Err(match provider_error(&text) {
                Some(kind) => anyhow!("HTTP error: {} ({}) for base: {}", status, kind, base),
                None => anyhow!("HTTP error: {} for base: {}", status, base),
            });
        }

        let data: LatestRatesResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", base, e))?;

        if data.result.as_deref() == Some("error") {
            return Err(anyhow!(
                "Provider error: {} for base: {}",
                data.error_type.as_deref().unwrap_or("unknown"),
                base
            ));
        }

        let rates = data
            .conversion_rates
            .ok_or_else(|| anyhow!("No conversion_rates found for base: {}", base))?;
        let table = RateTable::try_from(rates)
            .with_context(|| format!("Malformed conversion_rates for base: {base}"))?;

        let updated_at = data
            .time_last_update_unix
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single());

        debug!(currencies = table.len(), ?updated_at, "Parsed exchange rates");

        Ok(RateSnapshot {
            base: data.base_code.unwrap_or_else(|| base.to_string()),
            table,
            updated_at,
        })
    }
}
