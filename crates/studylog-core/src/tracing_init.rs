//! Shared tracing/logging initialization.

use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Error, Result};

/// Log output options resolved from config and CLI flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFormat {
    /// Emit one JSON object per line instead of the human-readable format.
    pub json: bool,
}

/// Build the env-filter: `RUST_LOG` wins, otherwise `default_filter`
/// (e.g. `"studylog_server=info"`).
pub fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Install the global tracing subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init_tracing(default_filter: &str, format: LogFormat) -> Result<()> {
    let fmt_layer = if format.json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter(default_filter))
        .with(fmt_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("tracing already initialised: {e}")))
}
