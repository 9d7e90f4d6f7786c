//! Tracing subscriber setup shared by binaries, examples, and tests.

use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber with the default `tenon=info` filter.
///
/// `RUST_LOG` overrides the default. Calling this more than once is a no-op.
pub fn init() {
    init_with_filter("tenon=info");
}

/// Install the global subscriber with an explicit fallback filter.
pub fn init_with_filter(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(ErrorLayer::default())
        .try_init();
}
