//! Logging setup for programs driving sweeps.
//!
//! The library itself only emits `tracing` events. Binaries and demos call
//! [`init_logging`] once to print them to stderr.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{LooperError, Result};

/// Install a stderr subscriber.
///
/// `level` applies to this crate (`"info"`, `"debug"`, ...). The `RUST_LOG`
/// environment variable takes precedence when set.
pub fn init_logging(level: &str) -> Result<()> {
    let default_filter = format!("looper_rs={level},warn");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_names(true),
        )
        .try_init()
        .map_err(|e| LooperError::Config(format!("Failed to install logger: {}", e)))?;

    tracing::debug!("looper-rs logging initialized (level={})", level);
    Ok(())
}
