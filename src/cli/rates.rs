use super::ui;
use crate::core::amount::format_rate;
use crate::core::marker::marker_for;
use crate::core::{AppError, CurrencyRateProvider, RateStore};
use anyhow::Result;
use comfy_table::Cell;

/// Prints the pair rate, e.g. `1 BRL = 0.1800 EUR`.
pub async fn run_rate(
    provider: &dyn CurrencyRateProvider,
    base_currency: &str,
    from: &str,
    to: &str,
) -> Result<()> {
    let mut store = RateStore::new(base_currency);
    super::load_rates(&mut store, provider).await?;
    println!("{}", render_rate(&store, from, to)?);
    Ok(())
}

pub fn render_rate(store: &RateStore, from: &str, to: &str) -> Result<String, AppError> {
    let rate = store
        .pair_rate(from, to)
        .ok_or_else(|| AppError::RateUnavailable {
            from: from.to_string(),
            to: to.to_string(),
        })?;
    Ok(format!(
        "1 {} = {} {}",
        ui::style_text(from, ui::StyleType::Label),
        ui::style_text(&format_rate(rate), ui::StyleType::Value),
        ui::style_text(to, ui::StyleType::Label)
    ))
}

/// Lists every known currency with its value against the base.
pub async fn run_list(provider: &dyn CurrencyRateProvider, base_currency: &str) -> Result<()> {
    let mut store = RateStore::new(base_currency);
    super::load_rates(&mut store, provider).await?;
    println!("{}", render_list(&store));
    Ok(())
}

pub fn render_list(store: &RateStore) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell(""),
        ui::header_cell("Currency"),
        ui::header_cell(&format!("Per 1 {}", store.base())),
    ]);

    for code in store.list_codes() {
        let value = store
            .pair_rate(store.base(), &code)
            .map_or("N/A".to_string(), format_rate);
        table.add_row(vec![
            Cell::new(marker_for(&code).to_string()),
            Cell::new(&code),
            ui::number_cell(&value),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text("Exchange rates", ui::StyleType::Title),
        table
    )
}
