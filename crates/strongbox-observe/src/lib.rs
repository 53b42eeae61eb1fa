//! Observability setup for Strongbox.

pub mod tracing_setup;
