//! `tracing` subscriber setup.
//!
//! The batcher itself only emits events through the `tracing` macros; applications and
//! tests decide whether anything is listening by calling one of the functions below.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info,quadbatch=debug,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// Install a global fmt subscriber, honouring `RUST_LOG` and falling back to
/// [`DEFAULT_FILTER`].
///
/// # Panics
/// Panics if a global subscriber has already been installed.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Install a global fmt subscriber with an explicit filter directive string.
///
/// # Panics
/// Panics if a global subscriber has already been installed.
pub fn init_with_filter(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();
}

/// Like [`init_with_filter`] but returns `false` instead of panicking when a subscriber
/// is already installed. Handy in tests, where every test may try to set one up.
pub fn try_init(filter: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_test_writer()
        .try_init()
        .is_ok()
}
