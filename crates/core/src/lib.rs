//! Pure decision logic for the memory ECC monitor.
//!
//! Nothing in this crate performs I/O. The agent reads raw counters,
//! feeds them to [`ecc::EccMonitor`], and acts on the returned
//! [`ecc::CycleOutcome`].

pub mod ecc;
pub mod error;
pub mod types;
