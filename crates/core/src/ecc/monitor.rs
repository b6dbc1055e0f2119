//! The ECC monitor aggregate.
//!
//! [`EccMonitor`] owns both counter trackers, the configured log limit, the
//! selected [`ReportingPolicy`] and the last published verdict. It is driven
//! by exactly one polling task and performs no I/O.

use serde::Serialize;

use crate::ecc::event::EccEvent;
use crate::ecc::policy::{ReportControl, ReportingMode, ReportingPolicy, Sample, Verdict};
use crate::ecc::status::EccStatus;
use crate::ecc::tracker::{CounterKind, CounterTracker};
use crate::types::{CounterValue, Timestamp};

/// The four properties exposed by the ECC object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EccProperties {
    pub ce_count: CounterValue,
    pub ue_count: CounterValue,
    pub is_logging_limit_reached: bool,
    pub state: EccStatus,
}

/// Everything the caller has to act on after one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOutcome {
    pub properties: EccProperties,
    pub events: Vec<EccEvent>,
    pub report_control: Option<ReportControl>,
}

#[derive(Debug)]
pub struct EccMonitor {
    ce: CounterTracker,
    ue: CounterTracker,
    max_log: Option<CounterValue>,
    policy: Box<dyn ReportingPolicy>,
    last: Verdict,
}

impl EccMonitor {
    pub fn new(policy: Box<dyn ReportingPolicy>) -> Self {
        Self {
            ce: CounterTracker::new(CounterKind::Correctable),
            ue: CounterTracker::new(CounterKind::Uncorrectable),
            max_log: None,
            policy,
            last: Verdict::default(),
        }
    }

    pub fn mode(&self) -> ReportingMode {
        self.policy.mode()
    }

    /// Install the combined CE+UE limit. `None` disables the log-full check.
    pub fn set_max_log(&mut self, max_log: Option<CounterValue>) {
        self.max_log = max_log;
    }

    pub fn max_log(&self) -> Option<CounterValue> {
        self.max_log
    }

    pub fn previous_ce_count(&self) -> CounterValue {
        self.ce.baseline()
    }

    pub fn previous_ue_count(&self) -> CounterValue {
        self.ue.baseline()
    }

    /// Properties as last published.
    pub fn properties(&self) -> EccProperties {
        EccProperties {
            ce_count: self.ce.baseline(),
            ue_count: self.ue.baseline(),
            is_logging_limit_reached: self.last.logging_limit_reached,
            state: self.last.state,
        }
    }

    /// Process one pair of raw counter readings taken at `now`.
    pub fn observe(
        &mut self,
        ce_raw: CounterValue,
        ue_raw: CounterValue,
        now: Timestamp,
    ) -> CycleOutcome {
        let ce = self.ce.advance(ce_raw);
        let ue = self.ue.advance(ue_raw);

        let sample = Sample {
            ce_total: ce_raw,
            ue_total: ue_raw,
            new_ce: ce.increments(),
            new_ue: ue.increments(),
            max_log: self.max_log,
            counter_reset: ce.is_reset() || ue.is_reset(),
        };

        let mut verdict = self.policy.classify(&sample, &self.last, now);
        let events = std::mem::take(&mut verdict.events);
        let report_control = verdict.report_control.take();

        if verdict.state != self.last.state {
            tracing::debug!(from = %self.last.state, to = %verdict.state, "ECC state changed");
        }
        self.last = verdict;

        CycleOutcome {
            properties: self.properties(),
            events,
            report_control,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::ecc::event::EccEventKind;

    fn at(secs: i64) -> Timestamp {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn monitor(mode: ReportingMode, max_log: Option<i64>) -> EccMonitor {
        let mut m = EccMonitor::new(mode.build(Duration::from_secs(3600)));
        m.set_max_log(max_log);
        m
    }

    fn count(outcome: &CycleOutcome, kind: EccEventKind) -> usize {
        outcome.events.iter().filter(|e| e.kind == kind).count()
    }

    #[test]
    fn scenario_a_counts_below_limit() {
        let mut m = monitor(ReportingMode::Direct, Some(5));
        let ce = [0, 2, 4];
        let mut outcomes = Vec::new();
        for (i, v) in ce.iter().enumerate() {
            outcomes.push(m.observe(*v, 0, at(i as i64)));
        }

        assert_eq!(outcomes[0].properties, EccProperties::default());

        let p = &outcomes[1].properties;
        assert_eq!(p.ce_count, 2);
        assert_eq!(p.state, EccStatus::CorrectableEvent);
        assert!(!p.is_logging_limit_reached);
        assert_eq!(count(&outcomes[1], EccEventKind::Correctable), 2);

        let p = &outcomes[2].properties;
        assert_eq!(p.ce_count, 4);
        assert_eq!(p.state, EccStatus::CorrectableEvent);
        assert!(!p.is_logging_limit_reached);
        let seqs: Vec<_> = outcomes[2].events.iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![Some(3), Some(4)]);
    }

    #[test]
    fn scenario_b_limit_crossing_disables_reports_once() {
        let mut m = monitor(ReportingMode::Direct, Some(5));
        let o1 = m.observe(0, 0, at(0));
        let o2 = m.observe(3, 3, at(1));
        let o3 = m.observe(3, 3, at(2));

        assert_eq!(o1.report_control, None);
        assert_eq!(o2.properties.state, EccStatus::LogFull);
        assert!(o2.properties.is_logging_limit_reached);
        assert_eq!(o2.report_control, Some(ReportControl::Disable));
        assert_eq!(count(&o2, EccEventKind::LogFull), 1);

        assert_eq!(o3.properties.state, EccStatus::LogFull);
        assert_eq!(o3.report_control, None);
        assert!(o3.events.is_empty());
    }

    #[test]
    fn scenario_c_external_reset_returns_to_normal() {
        let mut m = monitor(ReportingMode::Direct, Some(5));
        m.observe(10, 0, at(0));
        m.observe(10, 0, at(1));
        let o = m.observe(0, 0, at(2));
        assert_eq!(m.previous_ce_count(), 0);
        assert_eq!(o.properties.state, EccStatus::Normal);
        assert!(!o.properties.is_logging_limit_reached);
        assert!(o.events.is_empty());
    }

    #[test]
    fn scenario_d_suppression_window() {
        let mut m = monitor(ReportingMode::Suppression, Some(5));
        m.observe(0, 0, at(0));
        let full = m.observe(5, 0, at(1));
        assert_eq!(count(&full, EccEventKind::LogFull), 1);
        assert_eq!(full.report_control, Some(ReportControl::Disable));

        let quiet = m.observe(9, 0, at(1800));
        assert!(quiet.events.is_empty());
        assert_eq!(quiet.properties.ce_count, 9);
        assert_eq!(quiet.properties.state, EccStatus::LogFull);

        let closed = m.observe(12, 0, at(1 + 3600));
        assert_eq!(closed.report_control, Some(ReportControl::Enable));
        assert_eq!(closed.properties.ce_count, 12);
        assert!(!closed.properties.is_logging_limit_reached);
        assert!(closed.events.is_empty());

        let resumed = m.observe(14, 0, at(3700));
        let seqs: Vec<_> = resumed.events.iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![Some(13), Some(14)]);
        assert_eq!(resumed.properties.state, EccStatus::CorrectableEvent);
    }

    #[test]
    fn unchanged_readings_are_idempotent() {
        for mode in [ReportingMode::Direct, ReportingMode::Suppression] {
            let mut m = monitor(mode, Some(100));
            let first = m.observe(7, 2, at(0));
            let second = m.observe(7, 2, at(1));
            assert_eq!(first.events.len(), 9);
            assert!(second.events.is_empty());
            assert_eq!(first.properties, second.properties);
            assert_eq!(second.report_control, None);
        }
    }

    #[test]
    fn event_count_matches_total_increase() {
        let mut m = monitor(ReportingMode::Direct, None);
        let readings = [0, 1, 1, 4, 9, 9, 20];
        let mut emitted = 0;
        for (i, v) in readings.iter().enumerate() {
            let o = m.observe(*v, 0, at(i as i64));
            emitted += count(&o, EccEventKind::Correctable);
            assert_eq!(o.properties.ce_count, *v);
        }
        assert_eq!(emitted, 20);
    }

    #[test]
    fn log_full_does_not_flap_while_total_stays_high() {
        let mut m = monitor(ReportingMode::Direct, Some(5));
        m.observe(5, 0, at(0));
        for (i, (ce, ue)) in [(6, 0), (6, 1), (7, 3)].into_iter().enumerate() {
            let o = m.observe(ce, ue, at(i as i64 + 1));
            assert_eq!(o.properties.state, EccStatus::LogFull);
            assert!(o.properties.is_logging_limit_reached);
        }
    }

    #[test]
    fn full_reset_clears_log_full() {
        let mut m = monitor(ReportingMode::Direct, Some(5));
        m.observe(4, 4, at(0));
        let o = m.observe(0, 0, at(1));
        assert_eq!(m.previous_ce_count(), 0);
        assert_eq!(m.previous_ue_count(), 0);
        assert!(!o.properties.is_logging_limit_reached);
        assert_eq!(o.properties.state, EccStatus::Normal);
    }

    #[test]
    fn properties_serialize_with_bus_names() {
        let props = EccProperties {
            ce_count: 3,
            ue_count: 1,
            is_logging_limit_reached: false,
            state: EccStatus::UncorrectableEvent,
        };
        let json = serde_json::to_value(&props).expect("serializable");
        assert_eq!(json["ceCount"], 3);
        assert_eq!(json["ueCount"], 1);
        assert_eq!(json["isLoggingLimitReached"], false);
        assert_eq!(json["state"], "UncorrectableEvent");
    }

    #[test]
    fn partial_reset_clears_log_full() {
        let mut m = monitor(ReportingMode::Direct, Some(5));
        let full = m.observe(10, 3, at(0));
        assert_eq!(full.properties.state, EccStatus::LogFull);

        let o = m.observe(0, 3, at(1));
        assert_eq!(m.previous_ce_count(), 0);
        assert_eq!(m.previous_ue_count(), 3);
        assert!(!o.properties.is_logging_limit_reached);
        assert_eq!(o.properties.state, EccStatus::UncorrectableEvent);
        assert!(o.events.is_empty());

        // Counting restarts from the cleared counter.
        let o = m.observe(1, 3, at(2));
        assert_eq!(o.events, vec![EccEvent::correctable(1)]);
        assert_eq!(o.properties.state, EccStatus::CorrectableEvent);
    }

    #[test]
    fn partial_reset_below_limit_keeps_counting() {
        let mut m = monitor(ReportingMode::Suppression, Some(100));
        m.observe(4, 2, at(0));
        let o = m.observe(4, 0, at(1));
        assert_eq!(o.properties.state, EccStatus::CorrectableEvent);
        assert_eq!(o.properties.ue_count, 0);
        assert!(o.events.is_empty());
        assert_eq!(o.report_control, None);

        let o = m.observe(4, 1, at(2));
        assert_eq!(o.events, vec![EccEvent::uncorrectable(1)]);
    }

    #[test]
    fn regressed_counter_rebaselines_without_events() {
        let mut m = monitor(ReportingMode::Direct, Some(100));
        m.observe(10, 0, at(0));

        let o = m.observe(4, 0, at(1));
        assert!(o.events.is_empty());
        assert_eq!(m.previous_ce_count(), 4);
        assert_eq!(o.properties.ce_count, 4);
        assert_eq!(o.properties.state, EccStatus::CorrectableEvent);

        let o = m.observe(6, 0, at(2));
        let seqs: Vec<_> = o.events.iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![Some(5), Some(6)]);
    }

    #[test]
    fn saturated_counters_do_not_overflow() {
        for mode in [ReportingMode::Direct, ReportingMode::Suppression] {
            let mut m = monitor(mode, Some(5));
            m.observe(i64::MAX - 1, 0, at(0));
            let o = m.observe(i64::MAX, 1, at(1));
            assert_eq!(o.properties.state, EccStatus::LogFull);
            assert!(o.properties.is_logging_limit_reached);
        }
    }
}
