//! `eccmon-agent` library crate.
//!
//! Re-exports internal modules for integration testing. The binary
//! entrypoint lives in `main.rs`.

pub mod config;
pub mod error;
pub mod monitor;
pub mod properties;
pub mod scheduler;
pub mod source;
pub mod sysfs;
