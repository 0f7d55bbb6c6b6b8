//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::LoggingConfig;

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence over `config.level`. Returns false if a
/// subscriber was already installed, in which case nothing changes.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if config.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    if installed {
        tracing::debug!(json = config.json, "logging initialized");
    }
    installed
}
