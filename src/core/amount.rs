//! Amount parsing and locale-aware number formatting
//!
//! Amounts are typed as free text. The accepted grammar is:
//!
//! ```text
//! amount := ws* sign? digits (sep digits?)? ws*
//!         | ws* sign? sep digits ws*
//! sign   := "+" | "-"
//! sep    := "," | "."
//! ```
//!
//! Either `,` or `.` is taken as the decimal separator and at most one
//! separator may appear. Grouping separators are never accepted, so input
//! such as `1.234,56` or `1,234` with a second separator is rejected.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use super::error::{AppError, Result};

/// Display conventions for formatted amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "pt-BR")]
    PtBr,
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "de-DE")]
    DeDe,
}

impl Locale {
    pub fn decimal_separator(&self) -> char {
        match self {
            Locale::PtBr | Locale::DeDe => ',',
            Locale::EnUs => '.',
        }
    }

    pub fn group_separator(&self) -> char {
        match self {
            Locale::PtBr | Locale::DeDe => '.',
            Locale::EnUs => ',',
        }
    }
}

impl Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Locale::PtBr => "pt-BR",
                Locale::EnUs => "en-US",
                Locale::DeDe => "de-DE",
            }
        )
    }
}

impl FromStr for Locale {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "pt-br" => Ok(Locale::PtBr),
            "en-us" => Ok(Locale::EnUs),
            "de-de" => Ok(Locale::DeDe),
            _ => Err(anyhow::anyhow!("Unsupported locale: {}", s)),
        }
    }
}

pub fn parse_amount(input: &str) -> Result<f64> {
    let invalid = || AppError::InvalidAmount {
        input: input.to_string(),
    };

    let trimmed = input.trim();
    let unsigned = trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('+'))
        .unwrap_or(trimmed);

    let mut separators = 0;
    let mut digits = 0;
    for c in unsigned.chars() {
        match c {
            '0'..='9' => digits += 1,
            ',' | '.' => separators += 1,
            _ => return Err(invalid()),
        }
    }
    if digits == 0 || separators > 1 {
        return Err(invalid());
    }

    let normalized = trimmed.replace(',', ".");
    let value: f64 = normalized.parse().map_err(|_| invalid())?;
    if !value.is_finite() {
        return Err(invalid());
    }
    Ok(value)
}

/// Formats with exactly two fraction digits and the locale's grouping.
pub fn format_amount(value: f64, locale: Locale) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(locale.group_separator());
        }
        grouped.push(c);
    }

    let is_zero = int_part.bytes().all(|b| b == b'0') && frac_part.bytes().all(|b| b == b'0');
    let sign = if value.is_sign_negative() && !is_zero {
        "-"
    } else {
        ""
    };
    format!(
        "{sign}{grouped}{}{frac_part}",
        locale.decimal_separator()
    )
}

/// Formats a pair rate with four fraction digits, e.g. `0.1800`.
pub fn format_rate(rate: f64) -> String {
    format!("{rate:.4}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_accepts_either_separator() {
        assert_eq!(parse_amount("1000").unwrap(), 1000.0);
        assert_eq!(parse_amount("12,5").unwrap(), 12.5);
        assert_eq!(parse_amount("12.5").unwrap(), 12.5);
        assert_eq!(parse_amount(" 7, ").unwrap(), 7.0);
        assert_eq!(parse_amount(",25").unwrap(), 0.25);
        assert_eq!(parse_amount("-3,75").unwrap(), -3.75);
        assert_eq!(parse_amount("+2").unwrap(), 2.0);
    }

    #[test]
    fn test_parse_amount_treats_lone_separator_as_decimal() {
        // A single separator is always decimal, never grouping
        assert_eq!(parse_amount("1.234").unwrap(), 1.234);
        assert_eq!(parse_amount("1,234").unwrap(), 1.234);
    }

    #[test]
    fn test_parse_amount_rejects_mixed_separators() {
        for input in ["1.234,56", "1,234.56", "1.234.567", "1,2,3"] {
            assert_eq!(
                parse_amount(input),
                Err(AppError::InvalidAmount {
                    input: input.to_string()
                }),
                "{input}"
            );
        }
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        for input in ["", "   ", "abc", "10 BRL", "1e3", "--1", "-", ",", "NaN", "inf"] {
            assert!(parse_amount(input).is_err(), "{input}");
        }
    }

    #[test]
    fn test_parse_amount_rejects_overflow() {
        let huge = "9".repeat(400);
        assert!(parse_amount(&huge).is_err());
    }

    #[test]
    fn test_format_amount_pt_br() {
        assert_eq!(format_amount(180.0, Locale::PtBr), "180,00");
        assert_eq!(format_amount(1234567.891, Locale::PtBr), "1.234.567,89");
        assert_eq!(format_amount(0.005, Locale::PtBr), "0,01");
        assert_eq!(format_amount(-1500.5, Locale::PtBr), "-1.500,50");
    }

    #[test]
    fn test_format_amount_other_locales() {
        assert_eq!(format_amount(1234567.891, Locale::EnUs), "1,234,567.89");
        assert_eq!(format_amount(999.999, Locale::EnUs), "1,000.00");
        assert_eq!(format_amount(100.0, Locale::DeDe), "100,00");
    }

    #[test]
    fn test_format_amount_drops_sign_of_zero() {
        assert_eq!(format_amount(-0.001, Locale::PtBr), "0,00");
        assert_eq!(format_amount(-0.0, Locale::EnUs), "0.00");
    }

    #[test]
    fn test_locale_from_str() {
        assert_eq!("pt-BR".parse::<Locale>().unwrap(), Locale::PtBr);
        assert_eq!("en_us".parse::<Locale>().unwrap(), Locale::EnUs);
        assert!("xx-YY".parse::<Locale>().is_err());
        assert_eq!(Locale::DeDe.to_string(), "de-DE");
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(0.18), "0.1800");
        assert_eq!(format_rate(5.55555), "5.5556");
    }
}
