//! Conversion of a typed amount between two currencies

use tracing::debug;

use super::amount::{Locale, format_amount, parse_amount};
use super::error::{AppError, Result};
use super::rates::RateStore;

#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub amount: f64,
    pub rate: f64,
    pub value: f64,
    pub formatted: String,
}

/// Parses `amount`, looks up the pair rate and formats the product with two
/// decimals in `locale`.
pub fn convert(
    rates: &RateStore,
    input: &str,
    from: &str,
    to: &str,
    locale: Locale,
) -> Result<Conversion> {
    let amount = parse_amount(input)?;
    let rate = rates
        .pair_rate(from, to)
        .ok_or_else(|| AppError::RateUnavailable {
            from: from.to_string(),
            to: to.to_string(),
        })?;
    let value = amount * rate;
    if !value.is_finite() {
        return Err(AppError::InvalidAmount {
            input: input.to_string(),
        });
    }
    debug!(amount, rate, value, from, to, "Converted amount");

    Ok(Conversion {
        amount,
        rate,
        value,
        formatted: format_amount(value, locale),
    })
}

/// Form state behind the converter: the amount text, the selected pair and
/// the last explicitly computed result.
#[derive(Debug, Clone, PartialEq)]
pub struct ConverterForm {
    amount: String,
    from: String,
    to: String,
    result: Option<String>,
    locale: Locale,
}

impl ConverterForm {
    pub fn new(amount: &str, from: &str, to: &str, locale: Locale) -> Self {
        ConverterForm {
            amount: amount.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            result: None,
            locale,
        }
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Edits drop any explicit result so it never shows a stale amount.
    pub fn set_amount(&mut self, amount: &str) {
        self.amount = amount.to_string();
        self.result = None;
    }

    pub fn set_from(&mut self, code: &str) {
        self.from = code.to_string();
        self.result = None;
    }

    pub fn set_to(&mut self, code: &str) {
        self.to = code.to_string();
        self.result = None;
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.from, &mut self.to);
        self.result = None;
    }

    /// Resets the amount to zero and drops any explicit result.
    pub fn clear(&mut self) {
        self.amount = "0".to_string();
        self.result = None;
    }

    /// Recomputes and stores the result. On error the form is unchanged.
    pub fn convert(&mut self, rates: &RateStore) -> Result<&str> {
        let conversion = convert(rates, &self.amount, &self.from, &self.to, self.locale)?;
        Ok(self.result.insert(conversion.formatted).as_str())
    }

    pub fn pair_rate(&self, rates: &RateStore) -> Option<f64> {
        rates.pair_rate(&self.from, &self.to)
    }

    /// Text for the target field: the explicit result if any, otherwise a
    /// live preview, or empty when nothing is computable.
    pub fn display_value(&self, rates: &RateStore) -> String {
        if let Some(result) = &self.result {
            return result.clone();
        }
        convert(rates, &self.amount, &self.from, &self.to, self.locale)
            .map(|c| c.formatted)
            .unwrap_or_default()
    }
}
