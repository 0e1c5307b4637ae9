pub mod app;
pub mod cli;
pub mod core;
pub mod providers;

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::CurrencyRateProvider;
use crate::core::config::AppConfig;

pub enum AppCommand {
    Convert {
        amount: String,
        from: Option<String>,
        to: Option<String>,
    },
    Rate {
        from: String,
        to: String,
    },
    List,
    Interactive,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Currency converter starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(
        base_url = %config.provider.base_url,
        base_currency = %config.base_currency,
        locale = %config.locale,
        "Loaded config"
    );

    let api_key = config.api_key()?;
    let provider: Arc<dyn CurrencyRateProvider> = Arc::new(
        providers::ExchangeRateApiProvider::new(&config.provider.base_url, &api_key),
    );

    match command {
        AppCommand::Convert { amount, from, to } => {
            let from = from.unwrap_or_else(|| config.defaults.from.clone());
            let to = to.unwrap_or_else(|| config.defaults.to.clone());
            cli::convert::run(
                provider.as_ref(),
                &config.base_currency,
                config.locale,
                &amount,
                &from.to_ascii_uppercase(),
                &to.to_ascii_uppercase(),
            )
            .await
        }
        AppCommand::Rate { from, to } => {
            cli::rates::run_rate(
                provider.as_ref(),
                &config.base_currency,
                &from.to_ascii_uppercase(),
                &to.to_ascii_uppercase(),
            )
            .await
        }
        AppCommand::List => cli::rates::run_list(provider.as_ref(), &config.base_currency).await,
        AppCommand::Interactive => {
            let mut session = cli::interactive::Session::new(
                app::App::new(&config),
                provider,
                std::io::stdout(),
            );
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            let result = cli::interactive::run(&mut session, input).await;
            session.finish();
            result
        }
    }
}
