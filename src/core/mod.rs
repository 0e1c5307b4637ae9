//! Core business logic abstractions

pub mod amount;
pub mod config;
pub mod convert;
pub mod currency;
pub mod error;
pub mod log;
pub mod marker;
pub mod rates;
pub mod selector;

// Re-export main types for cleaner imports
pub use amount::Locale;
pub use currency::{CurrencyRateProvider, RateSnapshot};
pub use error::AppError;
pub use rates::{RateStatus, RateStore, RateTable};
