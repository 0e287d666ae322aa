//! Test logging setup.

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

static INIT: OnceLock<()> = OnceLock::new();

/// Routes `tracing` output of the scoring crates to the test harness.
///
/// Safe to call from every test; only the first call has effect. The
/// default filter is `scoreforge_scoring=debug`, overridable with `RUST_LOG`.
pub fn init_test_logging() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("scoreforge_scoring=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
