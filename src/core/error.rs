//! Error kinds surfaced to the user as blocking notices

use thiserror::Error;

/// Failures of a single user or network action. None of them are fatal to
/// the session: the widget stays usable after any of them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Failed to load exchange rates: {reason}")]
    FetchFailed { reason: String },

    #[error("Invalid amount: {input:?}")]
    InvalidAmount { input: String },

    #[error("Rate unavailable for {from} -> {to}")]
    RateUnavailable { from: String, to: String },
}

impl AppError {
    pub fn fetch_failed(err: &anyhow::Error) -> Self {
        AppError::FetchFailed {
            reason: format!("{err:#}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_failed_keeps_error_chain() {
        let err = anyhow::anyhow!("connection refused").context("GET /v6/latest/USD");
        let app_err = AppError::fetch_failed(&err);
        assert_eq!(
            app_err.to_string(),
            "Failed to load exchange rates: GET /v6/latest/USD: connection refused"
        );
    }
}
