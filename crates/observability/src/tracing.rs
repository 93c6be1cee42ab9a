//! Tracing subscriber initialization.
//!
//! Logs are JSON lines with timestamps. `RUST_LOG` overrides the default
//! directive, e.g. `RUST_LOG=screengate::audit=info,screengate_infra=debug`.

use tracing_subscriber::EnvFilter;

/// Install the subscriber, falling back to `default_directive` when
/// `RUST_LOG` is unset or invalid.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(default_directive: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // Targets stay on: audit records are routed by the `screengate::audit` target.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(true)
        .try_init()
        .is_ok()
}
