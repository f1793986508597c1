//! Logging initialization for the CLI.
//!
//! The subscriber lives in the binary so the library crate stays free of
//! global state. Logs go to stderr; stdout is reserved for the run summary.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber.
///
/// `verbosity`: 0 = INFO, 1 = DEBUG, 2+ = TRACE. A `RUST_LOG` setting takes
/// precedence over the default filter.
///
/// # Panics
/// Panics if a subscriber is already installed.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"))
        .add_directive(format!("pyshade={level}").parse().unwrap())
        .add_directive(level.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
