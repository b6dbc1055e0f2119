//! Threshold classification and event emission strategies.
//!
//! A [`ReportingPolicy`] turns one [`Sample`] (current totals plus the new
//! increments found by the trackers) into a [`Verdict`]: the state to publish,
//! the events to emit and an optional change to the kernel error-report
//! toggle. Two strategies exist and one is chosen at startup:
//!
//! - [`DirectPolicy`]: one event per increment until the limit is reached,
//!   then a single log-full event and silence until the counters clear.
//! - [`SuppressionPolicy`]: the limit applies to errors counted since the
//!   last quiet period; reaching it opens a window during which correctable
//!   events are dropped, after which counting and emission resume.
//!
//! When correctable and uncorrectable increments land in the same cycle the
//! correctable events are emitted first and the uncorrectable state is
//! published last. This ordering is kept as observed on existing systems and
//! is not known to be intentional.

use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

use crate::ecc::event::EccEvent;
use crate::ecc::status::EccStatus;
use crate::error::EccError;
use crate::types::{CounterValue, Timestamp};

/// Default quiet period of [`SuppressionPolicy`].
pub const DEFAULT_SUPPRESSION_WINDOW: Duration = Duration::from_secs(3600);

/// Everything a policy needs to classify one polling cycle.
#[derive(Debug, Clone)]
pub struct Sample {
    pub ce_total: CounterValue,
    pub ue_total: CounterValue,
    /// Cumulative values of correctable increments new in this cycle.
    pub new_ce: RangeInclusive<CounterValue>,
    /// Cumulative values of uncorrectable increments new in this cycle.
    pub new_ue: RangeInclusive<CounterValue>,
    /// `None` disables the log-full check.
    pub max_log: Option<CounterValue>,
    /// One of the counters was cleared to zero this cycle.
    pub counter_reset: bool,
}

impl Sample {
    pub fn combined(&self) -> CounterValue {
        self.ce_total.saturating_add(self.ue_total)
    }

    /// State implied by the totals alone.
    fn resting_state(&self) -> EccStatus {
        if self.ue_total > 0 {
            EccStatus::UncorrectableEvent
        } else if self.ce_total > 0 {
            EccStatus::CorrectableEvent
        } else {
            EccStatus::Normal
        }
    }

    /// State to keep when no new increment decides it. A reset or a stale
    /// LogFull falls back to what the totals show.
    fn fallback_state(&self, previous: &Verdict) -> EccStatus {
        if self.counter_reset || previous.state == EccStatus::LogFull {
            self.resting_state()
        } else {
            previous.state
        }
    }

    fn reaches_limit(&self, total: CounterValue) -> bool {
        self.max_log.is_some_and(|limit| total >= limit)
    }
}

/// Requested change to the kernel EDAC error-report toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportControl {
    Disable,
    Enable,
}

impl ReportControl {
    /// Text accepted by the toggle node.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disable => "off",
            Self::Enable => "on",
        }
    }
}

/// Outcome of classifying one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdict {
    pub state: EccStatus,
    pub logging_limit_reached: bool,
    pub events: Vec<EccEvent>,
    pub report_control: Option<ReportControl>,
}

impl Verdict {
    /// Counters read zero: everything back to normal.
    fn cleared(report_control: Option<ReportControl>) -> Self {
        Self {
            report_control,
            ..Self::default()
        }
    }
}

/// A classify-and-emit strategy.
pub trait ReportingPolicy: Send + std::fmt::Debug {
    fn mode(&self) -> ReportingMode;

    /// Classify `sample`, given the verdict published for the previous cycle.
    fn classify(&mut self, sample: &Sample, previous: &Verdict, now: Timestamp) -> Verdict;
}

/// Selects a [`ReportingPolicy`] implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportingMode {
    #[default]
    Direct,
    Suppression,
}

impl ReportingMode {
    /// Build the policy for this mode. `window` only applies to
    /// [`ReportingMode::Suppression`].
    pub fn build(self, window: Duration) -> Box<dyn ReportingPolicy> {
        match self {
            Self::Direct => Box::new(DirectPolicy),
            Self::Suppression => Box::new(SuppressionPolicy::new(window)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Suppression => "suppression",
        }
    }
}

impl FromStr for ReportingMode {
    type Err = EccError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "suppression" => Ok(Self::Suppression),
            other => Err(EccError::UnknownReportingMode(other.to_string())),
        }
    }
}

impl std::fmt::Display for ReportingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emit one event per new increment, CE before UE. Returns the resulting
/// state, which is `fallback` when nothing new happened.
fn emit_increments(
    sample: &Sample,
    fallback: EccStatus,
    emit_ce: bool,
    events: &mut Vec<EccEvent>,
) -> EccStatus {
    let mut state = fallback;
    if emit_ce {
        for seq in sample.new_ce.clone() {
            events.push(EccEvent::correctable(seq));
            state = EccStatus::CorrectableEvent;
        }
    }
    for seq in sample.new_ue.clone() {
        events.push(EccEvent::uncorrectable(seq));
        state = EccStatus::UncorrectableEvent;
    }
    state
}

// ---------------------------------------------------------------------------
// DirectPolicy
// ---------------------------------------------------------------------------

/// One event per increment; log-full is sticky until a counter is cleared.
///
/// Reports are only ever switched off here. Clearing the counters re-arms the
/// limit but leaves the kernel toggle alone.
#[derive(Debug, Default)]
pub struct DirectPolicy;

impl ReportingPolicy for DirectPolicy {
    fn mode(&self) -> ReportingMode {
        ReportingMode::Direct
    }

    fn classify(&mut self, sample: &Sample, previous: &Verdict, _now: Timestamp) -> Verdict {
        let total = sample.combined();
        if total == 0 {
            return Verdict::cleared(None);
        }

        // A counter cleared to zero re-arms the limit.
        let was_full = previous.logging_limit_reached && !sample.counter_reset;
        if was_full || sample.reaches_limit(total) {
            let entering = !was_full;
            if entering {
                tracing::warn!(
                    total,
                    max_log = ?sample.max_log,
                    "ECC logging limit reached, disabling error reports",
                );
            }
            return Verdict {
                state: EccStatus::LogFull,
                logging_limit_reached: true,
                events: if entering {
                    vec![EccEvent::log_full()]
                } else {
                    Vec::new()
                },
                report_control: entering.then_some(ReportControl::Disable),
            };
        }

        let mut events = Vec::new();
        let state = emit_increments(sample, sample.fallback_state(previous), true, &mut events);
        Verdict {
            state,
            logging_limit_reached: false,
            events,
            report_control: None,
        }
    }
}

// ---------------------------------------------------------------------------
// SuppressionPolicy
// ---------------------------------------------------------------------------

/// An open quiet period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppressionWindow {
    /// CE total when the window opened.
    pub baseline_at_start: CounterValue,
    pub started_at: Timestamp,
}

/// Rate-limits correctable events with a timed quiet period.
#[derive(Debug)]
pub struct SuppressionPolicy {
    duration: Duration,
    /// CE total at which the current counting period started.
    ce_baseline: CounterValue,
    window: Option<SuppressionWindow>,
}

impl SuppressionPolicy {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            ce_baseline: 0,
            window: None,
        }
    }

    pub fn window(&self) -> Option<&SuppressionWindow> {
        self.window.as_ref()
    }

    pub fn ce_baseline(&self) -> CounterValue {
        self.ce_baseline
    }

    fn elapsed(&self, window: &SuppressionWindow, now: Timestamp) -> bool {
        // A clock that stepped backwards keeps the window open.
        (now - window.started_at)
            .to_std()
            .is_ok_and(|elapsed| elapsed >= self.duration)
    }
}

impl Default for SuppressionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SUPPRESSION_WINDOW)
    }
}

impl ReportingPolicy for SuppressionPolicy {
    fn mode(&self) -> ReportingMode {
        ReportingMode::Suppression
    }

    fn classify(&mut self, sample: &Sample, previous: &Verdict, now: Timestamp) -> Verdict {
        if sample.combined() == 0 {
            let was_open = self.window.take().is_some();
            self.ce_baseline = 0;
            return Verdict::cleared(was_open.then_some(ReportControl::Enable));
        }

        let mut report_control = None;
        if sample.counter_reset && self.window.take().is_some() {
            tracing::info!("ECC counter cleared, closing suppression window");
            report_control = Some(ReportControl::Enable);
        }

        // The CE counter was cleared or regressed underneath us.
        self.ce_baseline = self.ce_baseline.min(sample.ce_total);

        let mut events = Vec::new();

        if let Some(window) = self.window.clone() {
            if !self.elapsed(&window, now) {
                emit_increments(sample, EccStatus::LogFull, false, &mut events);
                if !sample.new_ce.is_empty() {
                    tracing::debug!(
                        suppressed = sample.new_ce.end() - sample.new_ce.start() + 1,
                        "Correctable ECC events suppressed",
                    );
                }
                return Verdict {
                    state: EccStatus::LogFull,
                    logging_limit_reached: true,
                    events,
                    report_control: None,
                };
            }

            self.ce_baseline = sample.ce_total;
            emit_increments(sample, EccStatus::LogFull, false, &mut events);

            // Only uncorrectable errors count towards the limit after rebasing.
            if sample.reaches_limit(sample.ue_total) {
                tracing::info!(
                    ue_total = sample.ue_total,
                    max_log = ?sample.max_log,
                    "ECC logging limit still reached by uncorrectable errors, extending suppression window",
                );
                self.window = Some(SuppressionWindow {
                    baseline_at_start: sample.ce_total,
                    started_at: now,
                });
                return Verdict {
                    state: EccStatus::LogFull,
                    logging_limit_reached: true,
                    events,
                    report_control: None,
                };
            }

            tracing::info!(
                suppressed = sample.ce_total.saturating_sub(window.baseline_at_start),
                ce_total = sample.ce_total,
                "ECC suppression window closed, resuming correctable events",
            );
            self.window = None;
            let state = if sample.ue_total > 0 {
                EccStatus::UncorrectableEvent
            } else {
                EccStatus::CorrectableEvent
            };
            return Verdict {
                state,
                logging_limit_reached: false,
                events,
                report_control: Some(ReportControl::Enable),
            };
        }

        let windowed = sample
            .ce_total
            .saturating_sub(self.ce_baseline)
            .saturating_add(sample.ue_total);
        if sample.reaches_limit(windowed) {
            tracing::warn!(
                windowed,
                max_log = ?sample.max_log,
                window_secs = self.duration.as_secs(),
                "ECC logging limit reached, suppressing correctable events",
            );
            self.window = Some(SuppressionWindow {
                baseline_at_start: sample.ce_total,
                started_at: now,
            });
            return Verdict {
                state: EccStatus::LogFull,
                logging_limit_reached: true,
                events: vec![EccEvent::log_full()],
                report_control: Some(ReportControl::Disable),
            };
        }

        let state = emit_increments(sample, sample.fallback_state(previous), true, &mut events);
        Verdict {
            state,
            logging_limit_reached: false,
            events,
            report_control,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
