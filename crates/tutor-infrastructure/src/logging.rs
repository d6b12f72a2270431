//! Tracing subscriber setup.

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};
use tutor_core::config::LoggingConfig;

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `config.level`. Fails if a global subscriber is
/// already set or the directive does not parse.
pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = env_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    if config.json {
        registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init()
            .context("Failed to install JSON tracing subscriber")?;
    } else {
        registry
            .with(fmt::layer().with_target(true))
            .try_init()
            .context("Failed to install tracing subscriber")?;
    }

    tracing::debug!(level = %config.level, json = config.json, "Tracing initialized");
    Ok(())
}

fn env_filter(config: &LoggingConfig) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .with_context(|| format!("Invalid log level directive: {}", config.level)),
    }
}
