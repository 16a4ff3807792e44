#![allow(dead_code)]

use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Upper bound for any blocking wait in the test suite.
pub const TIMEOUT: Duration = Duration::from_secs(10);

/// Installs a test-friendly subscriber; the first call wins.
///
/// Verbosity follows `RUST_LOG`, defaulting to `debug`.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .with_thread_ids(true)
            .with_ansi(false)
            .try_init();
    });
}
