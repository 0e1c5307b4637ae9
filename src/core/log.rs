use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

const APP_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Level for our own spans and events. `--verbose` turns them on; HTTP
/// client internals stay at warn unless `RUST_LOG` says otherwise.
fn app_targets(verbose: bool) -> Targets {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::OFF
    };
    Targets::new()
        .with_target(APP_TARGET, level)
        .with_target("reqwest", LevelFilter::WARN)
}

pub fn init_logging(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "off" }));

    // stderr, so logs never interleave with the converter output on stdout
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .pretty()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(app_targets(verbose))
        .with(env_filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_app_targets_follow_verbosity() {
        assert!(app_targets(true).would_enable(APP_TARGET, &Level::DEBUG));
        assert!(!app_targets(false).would_enable(APP_TARGET, &Level::ERROR));
        assert!(!app_targets(true).would_enable("reqwest", &Level::DEBUG));
    }
}
