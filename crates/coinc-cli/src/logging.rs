//! Tracing bootstrap for the drivers.
//!
//! Compact output on stderr so result tables on stdout stay machine
//! readable. `RUST_LOG` overrides the default `info` filter.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber. Calling it twice is harmless; the second
/// call is ignored.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(std::io::stderr),
    );
    let _ = tracing::subscriber::set_global_default(subscriber);
}
