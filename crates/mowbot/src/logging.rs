//! Tracing subscriber setup.
//!
//! The crate logs through both `log` macros and `tracing` spans; the
//! `tracing-log` bridge funnels the former into the latter so one
//! subscriber sees everything.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber with the default `info` filter
/// (overridable via `RUST_LOG`). Safe to call more than once; later
/// calls are no-ops.
pub fn init() {
    init_with_filter("info");
}

/// Installs the global subscriber with an explicit default filter.
pub fn init_with_filter(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    // Both return Err when a logger/subscriber is already installed,
    // which is fine for repeated init in tests.
    let _ = tracing_log::LogTracer::init();
    let _ = tracing::subscriber::set_global_default(
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .finish(),
    );
}
