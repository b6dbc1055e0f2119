//! Counter delta tracking.
//!
//! EDAC counters only grow until something clears them. A [`CounterTracker`]
//! remembers the last value it fully processed and turns each new
//! observation into the unit increments that happened since.

use std::ops::RangeInclusive;

use crate::types::CounterValue;

/// Which EDAC counter a tracker follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    Correctable,
    Uncorrectable,
}

impl CounterKind {
    /// File name of the counter node under the EDAC controller directory.
    pub fn node_name(&self) -> &'static str {
        match self {
            Self::Correctable => "ce_count",
            Self::Uncorrectable => "ue_count",
        }
    }
}

impl std::fmt::Display for CounterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.node_name())
    }
}

/// Result of feeding one observation to a tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterAdvance {
    /// Observation equals the baseline.
    Unchanged,
    /// The counter grew; one increment per value in `from..=to`.
    Increments { from: CounterValue, to: CounterValue },
    /// The counter dropped to zero from a positive baseline (external clear).
    Reset { previous: CounterValue },
    /// The counter dropped to a non-zero value. Not a valid transition for a
    /// monotonic-until-reset source; the baseline is clamped.
    Regressed {
        previous: CounterValue,
        observed: CounterValue,
    },
}

impl CounterAdvance {
    /// Cumulative counter values of every new increment, in order.
    pub fn increments(&self) -> RangeInclusive<CounterValue> {
        match *self {
            Self::Increments { from, to } => from..=to,
            // Empty range.
            _ => 1..=0,
        }
    }

    pub fn is_reset(&self) -> bool {
        matches!(self, Self::Reset { .. })
    }
}

/// Tracks the last processed value of one counter.
#[derive(Debug, Clone)]
pub struct CounterTracker {
    kind: CounterKind,
    baseline: CounterValue,
}

impl CounterTracker {
    pub fn new(kind: CounterKind) -> Self {
        Self { kind, baseline: 0 }
    }

    pub fn baseline(&self) -> CounterValue {
        self.baseline
    }

    /// Advance the baseline to `observed` and report what changed.
    pub fn advance(&mut self, observed: CounterValue) -> CounterAdvance {
        let previous = self.baseline;
        let advance = if observed > previous {
            CounterAdvance::Increments {
                from: previous + 1,
                to: observed,
            }
        } else if observed == previous {
            CounterAdvance::Unchanged
        } else if observed == 0 {
            tracing::info!(counter = %self.kind, previous, "Counter cleared externally");
            CounterAdvance::Reset { previous }
        } else {
            tracing::warn!(
                counter = %self.kind,
                previous,
                observed,
                "Counter went backwards without a reset, clamping baseline",
            );
            CounterAdvance::Regressed { previous, observed }
        };
        self.baseline = observed;
        advance
    }
}
