//! Logging system setup.
//!
//! Initializes the tracing-based logging used throughout the scan engine.
//! The filter respects the `RUST_LOG` environment variable and falls back
//! to the configured level.

use crate::config::LoggingSettings;
use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes the global tracing subscriber.
///
/// # Arguments
///
/// * `settings` - level and format configuration; `None` means plain
///   output at `info`
///
/// # Environment Variables
///
/// * `RUST_LOG` - overrides the configured filter (e.g. "debug",
///   "vigil_scan=trace")
///
/// # Returns
///
/// An error when a global subscriber is already installed; the process
/// can only initialize logging once.
pub fn setup_logging(settings: Option<&LoggingSettings>) -> Result<()> {
    let level = settings.map(|s| s.level.as_str()).unwrap_or("info");
    let json_format = settings.map(|s| s.json_format).unwrap_or(false);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(false))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .try_init()?;
    }

    Ok(())
}
