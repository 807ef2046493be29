//! Tracing bootstrap for host processes.
//!
//! The library itself only emits `tracing` events; hosts that have no
//! subscriber of their own can install this one. Controlled by `RUST_LOG`
//! (default `info`).

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install an env-filtered fmt subscriber.
///
/// Safe to call more than once: later calls are no-ops, so library tests and
/// embedding hosts do not fight over the global subscriber.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
