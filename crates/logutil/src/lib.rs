//! Utilities for logging.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install a global subscriber filtered by `RUST_LOG`, defaulting to `warn`.
///
/// Does nothing if a global subscriber has already been set.
pub fn init() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::WARN.into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_file(true)
        .with_line_number(true)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Install a subscriber suitable for tests.
///
/// Output goes through the test writer so it's captured per test, and the
/// level defaults to `debug`. Safe to call from every test.
pub fn init_test() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::DEBUG.into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder()
        .with_test_writer()
        .with_env_filter(env_filter)
        .with_file(true)
        .with_line_number(true)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
