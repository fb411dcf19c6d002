use crate::config::LoggingConfig;
use tracing_subscriber::{EnvFilter, fmt, prelude::*, util::TryInitError};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `logging.level` when set. `logging.format` selects
/// `pretty` output; anything else logs JSON lines.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.format.as_str() {
        "pretty" => registry.with(fmt::layer().pretty()).try_init(),
        _ => registry.with(fmt::layer().json()).try_init(),
    }
}
