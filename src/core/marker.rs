//! Iconographic markers shown next to currency codes

use std::fmt::Display;

const CURRENCY_COUNTRIES: &[(&str, &str)] = &[
    ("USD", "US"),
    ("BRL", "BR"),
    ("EUR", "EU"),
    ("GBP", "GB"),
    ("JPY", "JP"),
    ("AUD", "AU"),
    ("CAD", "CA"),
    ("CNY", "CN"),
    ("INR", "IN"),
    ("RUB", "RU"),
    ("CHF", "CH"),
    ("MXN", "MX"),
    ("KRW", "KR"),
    ("TRY", "TR"),
    ("AED", "AE"),
    ("ARS", "AR"),
    ("CLP", "CL"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// Flag of the issuing country or union, by ISO 3166 alpha-2 code.
    Flag(&'static str),
    Placeholder,
}

/// Unknown codes get the placeholder rather than an error.
pub fn marker_for(code: &str) -> Marker {
    CURRENCY_COUNTRIES
        .iter()
        .find(|(currency, _)| *currency == code)
        .map_or(Marker::Placeholder, |(_, country)| Marker::Flag(country))
}

impl Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Marker::Flag(country) => {
                // Regional indicator symbols A..Z start at U+1F1E6
                for c in country.chars() {
                    let offset = c as u32 - 'A' as u32;
                    let symbol = char::from_u32(0x1F1E6 + offset).unwrap_or('?');
                    write!(f, "{symbol}")?;
                }
                Ok(())
            }
            Marker::Placeholder => write!(f, "\u{1F310}"),
        }
    }
}
