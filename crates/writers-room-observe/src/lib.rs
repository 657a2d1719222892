//! Logging and trace export setup for the Writers' Room binaries.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, log_filter, shutdown_tracing};
