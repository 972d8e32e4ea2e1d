//! Tracing bootstrap for services
//!
//! Emits JSON lines to stdout; sink fan-out and shipping are the
//! deployment's concern.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber: env filter (`RUST_LOG` wins over the
/// supplied default) plus a JSON formatter.
///
/// Returns an error when a global subscriber is already installed.
pub fn try_init(default_filter: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()
}
