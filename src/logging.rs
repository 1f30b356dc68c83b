//! Tracing subscriber setup.

use crate::config::LoggingConfig;

/// Install a global `fmt` subscriber. `RUST_LOG` takes precedence over `config.level`.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init(config: &LoggingConfig) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.json {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
}

/// [`init`] with default settings, for tests and small tools.
pub fn init_default() {
    init(&LoggingConfig::default());
}
