use super::ui;
use crate::core::amount::{Locale, format_amount, format_rate};
use crate::core::convert::{Conversion, convert};
use crate::core::{CurrencyRateProvider, RateStore};
use anyhow::Result;
use comfy_table::Cell;

pub async fn run(
    provider: &dyn CurrencyRateProvider,
    base_currency: &str,
    locale: Locale,
    amount: &str,
    from: &str,
    to: &str,
) -> Result<()> {
    let mut store = RateStore::new(base_currency);
    super::load_rates(&mut store, provider).await?;

    let conversion = convert(&store, amount, from, to, locale)?;
    println!("{}", render(&conversion, from, to, locale, &store));
    Ok(())
}

pub fn render(
    conversion: &Conversion,
    from: &str,
    to: &str,
    locale: Locale,
    store: &RateStore,
) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("From"),
        ui::header_cell("To"),
        ui::header_cell("Rate"),
        ui::header_cell(&format!("Amount ({from})")),
        ui::header_cell(&format!("Converted ({to})")),
    ]);
    table.add_row(vec![
        Cell::new(from),
        Cell::new(to),
        ui::number_cell(&format_rate(conversion.rate)),
        ui::number_cell(&format_amount(conversion.amount, locale)),
        ui::highlight_cell(&conversion.formatted),
    ]);

    let mut output = table.to_string();
    if let Some(updated_at) = store.updated_at() {
        output.push_str(&format!(
            "\n{}",
            ui::style_text(
                &format!("Rates as of {}", updated_at.format("%Y-%m-%d %H:%M UTC")),
                ui::StyleType::Subtle
            )
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RateSnapshot, RateTable};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_render_conversion() {
        let mut store = RateStore::new("USD");
        let ticket = store.begin_refresh();
        store
            .finish_refresh(
                ticket,
                Ok(RateSnapshot {
                    base: "USD".to_string(),
                    table: RateTable::try_from([("USD", 1.0), ("BRL", 5.0), ("EUR", 0.9)])
                        .unwrap(),
                    updated_at: Utc.timestamp_opt(1760486401, 0).single(),
                }),
            )
            .unwrap();

        let conversion = convert(&store, "1000", "BRL", "EUR", Locale::PtBr).unwrap();
        let output = render(&conversion, "BRL", "EUR", Locale::PtBr, &store);
        assert!(output.contains("Converted (EUR)"));
        assert!(output.contains("0.1800"));
        assert!(output.contains("1.000,00"));
        assert!(output.contains("180,00"));
        assert!(output.contains("Rates as of 2025-10-15 00:00 UTC"));
    }
}
