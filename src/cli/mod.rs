pub mod convert;
pub mod interactive;
pub mod rates;
pub mod setup;
pub mod ui;

use anyhow::Result;

use crate::core::{CurrencyRateProvider, RateStore};

/// Loads rates into `store` once, with a spinner while waiting.
pub async fn load_rates(store: &mut RateStore, provider: &dyn CurrencyRateProvider) -> Result<()> {
    let pb = ui::new_spinner("Loading exchange rates...");
    let result = store.refresh(provider).await;
    pb.finish_and_clear();
    Ok(result?)
}
