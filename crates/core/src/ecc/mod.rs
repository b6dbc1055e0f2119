//! Memory ECC tracking domain logic.
//!
//! - [`tracker`]: per-counter delta tracking against the last processed value.
//! - [`policy`]: threshold classification and the two reporting strategies.
//! - [`monitor`]: the aggregate owned by the polling task.
//!
//! All logic in this module is pure. Callers pass in the raw counter values
//! and the current time, and carry out the returned side effects themselves.

pub mod event;
pub mod monitor;
pub mod policy;
pub mod status;
pub mod tracker;

pub use event::{EccEvent, EccEventKind};
pub use monitor::{CycleOutcome, EccMonitor, EccProperties};
pub use policy::{
    DirectPolicy, ReportControl, ReportingMode, ReportingPolicy, Sample, SuppressionPolicy,
    Verdict,
};
pub use status::EccStatus;
pub use tracker::{CounterAdvance, CounterKind, CounterTracker};

use crate::error::EccError;
use crate::types::CounterValue;

/// Parse the textual content of a counter node into a value.
///
/// Leading and trailing whitespace (sysfs nodes end with a newline) is
/// ignored. Empty, non-numeric and negative content is rejected.
pub fn parse_counter(raw: &str) -> Result<CounterValue, EccError> {
    let trimmed = raw.trim();
    let value: CounterValue = trimmed
        .parse()
        .map_err(|_| EccError::MalformedCounter {
            raw: trimmed.to_string(),
        })?;
    if value < 0 {
        return Err(EccError::NegativeCounter(value));
    }
    Ok(value)
}

/// Parse the configured log limit.
///
/// A value of zero or below means "no limit", matching an unset limit.
pub fn parse_max_log(raw: &str) -> Result<Option<CounterValue>, EccError> {
    let trimmed = raw.trim();
    let value: CounterValue = trimmed
        .parse()
        .map_err(|_| EccError::MalformedCounter {
            raw: trimmed.to_string(),
        })?;
    Ok((value > 0).then_some(value))
}
