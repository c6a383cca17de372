//! Subscriber setup for the crate's `tracing` events.
//!
//! The codec itself only emits events; installing a subscriber is left to the
//! embedding program. [`init_logging`] is a convenience for binaries, tests and
//! benches that want the configured level and format without wiring
//! `tracing-subscriber` by hand.

use crate::config::LoggingConfig;
use crate::error::{CodecError, Result};
use tracing_subscriber::EnvFilter;

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` takes precedence over `config.log_level`. Fails if a global
/// subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str().to_ascii_lowercase()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target);

    let installed = if config.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| CodecError::ConfigError(format!("Failed to install subscriber: {e}")))
}
