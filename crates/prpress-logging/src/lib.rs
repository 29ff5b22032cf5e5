//! # prpress-logging
//!
//! Event logging and run records for the prpress article pipeline.
//!
//! - [`Logger`] renders [`LogEvent`]s in one of the [`LogFormat`]s
//!   (colored pretty, JSON lines, compact) on stderr, optionally mirrored
//!   to a JSON file
//! - [`RunLog`] writes one JSONL record per batch run
//! - [`init_tracing`] wires `tracing` output from the library crates

mod events;
mod run_log;

pub use events::{LogEvent, LogFormat, Logger, ServiceRole};
pub use run_log::{RunLine, RunLog};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber. `RUST_LOG` overrides `level`.
pub fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(layer.json()).init(),
        LogFormat::Compact => registry.with(layer.compact()).init(),
        LogFormat::Pretty => registry.with(layer).init(),
    }
}
