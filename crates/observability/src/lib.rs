//! Process-wide logging setup shared by screengate binaries.

/// Install the JSON tracing subscriber with the default `info` filter.
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    tracing::init("info");
}

/// Subscriber construction (filters, formatting).
pub mod tracing;
