//! Profiling hooks based on the `puffin` crate.
//!
//! With the `profiling` feature disabled the scope macros expand to nothing, so hot
//! paths in the batcher can be instrumented unconditionally.

#[cfg(feature = "profiling")]
pub use enabled::*;

#[cfg(not(feature = "profiling"))]
pub use disabled::*;

#[cfg(feature = "profiling")]
mod enabled {
    use std::sync::OnceLock;

    pub use puffin::{profile_function, profile_scope};

    /// Address the puffin HTTP server listens on.
    pub const PUFFIN_ADDR: &str = "0.0.0.0:8585";

    static PROFILING_SERVER: OnceLock<puffin_http::Server> = OnceLock::new();

    /// Turn puffin scopes on and start the HTTP server `puffin_viewer` connects to.
    ///
    /// Calling this more than once keeps the first server alive.
    pub fn init_profiling() {
        puffin::set_scopes_on(true);

        if PROFILING_SERVER.get().is_some() {
            return;
        }

        match puffin_http::Server::new(PUFFIN_ADDR) {
            Ok(server) => {
                tracing::info!("Puffin profiler server started on http://{PUFFIN_ADDR}");
                let _ = PROFILING_SERVER.set(server);
            }
            Err(e) => {
                tracing::error!("Failed to start puffin server: {}", e);
            }
        }
    }

    /// Mark the start of a new frame. Call once per frame, typically right before
    /// `SpriteBatch::begin`.
    #[inline]
    pub fn new_frame() {
        puffin::GlobalProfiler::lock().new_frame();
    }
}

#[cfg(not(feature = "profiling"))]
mod disabled {
    #[macro_export]
    macro_rules! profile_function {
        ($($arg:tt)*) => {};
    }

    #[macro_export]
    macro_rules! profile_scope {
        ($($arg:tt)*) => {};
    }

    pub use crate::{profile_function, profile_scope};

    /// No-op: profiling is disabled.
    pub fn init_profiling() {
        tracing::debug!("Profiling requested but the `profiling` feature is disabled");
    }

    /// No-op: profiling is disabled.
    #[inline]
    pub fn new_frame() {}
}
