//! Log output for hosts that do not install their own subscriber.
//!
//! Library code only emits `tracing` events. Hosts with a subscriber of
//! their own never need this module.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Directive used when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "ripsrc=info";

/// Build the filter: `RUST_LOG` when set, otherwise `default_directive`.
pub fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Install a global fmt subscriber.
///
/// Returns `false` when a global subscriber was already installed; the
/// existing one is left in place.
pub fn init(default_directive: &str) -> bool {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(env_filter(default_directive))
        .try_init()
        .is_ok()
}
