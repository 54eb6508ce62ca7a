//! Shared helpers for the root integration tests

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;

/// Route `tracing` output through the test harness; `RUST_LOG` filters it
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
