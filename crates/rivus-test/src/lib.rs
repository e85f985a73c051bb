//! RIVUS Test Harness - Deterministic fixtures and event capture
//!
//! This crate provides:
//! - Sequential id sources for reproducible record identities
//! - An event recorder that captures every emission for assertion
//! - Shared model fixtures (points, shapes, a todo model)
//! - End-to-end integration tests and property tests

pub mod fixtures;
pub mod ids;
pub mod recorder;

#[cfg(test)]
mod integration;
#[cfg(test)]
mod properties;

pub use fixtures::*;
pub use ids::*;
pub use recorder::*;

/// Install a subscriber that honors `RUST_LOG`, for harness debugging.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
