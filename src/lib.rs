// src/lib.rs
// Public library surface for the two binaries and the integration tests.

pub mod config;
pub mod content;
pub mod images;
pub mod normalize;
pub mod pipeline;
pub mod present;
pub mod seed;
pub mod sheets;
pub mod snapshot;

// ---- Re-exports for stable public API ----
pub use crate::config::SyncConfig;
pub use crate::content::{ContentCategory, Snapshot};
pub use crate::pipeline::{run, sync_all, SyncMode, SyncReport};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the console subscriber used by both binaries.
/// `RUST_LOG` overrides the default `cms_sync=info,warn` filter.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cms_sync=info,warn"));

    // try_init: tests may call this more than once per process
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .try_init();
}
