//! Binds the pure [`EccMonitor`] to the counter source, the property
//! publisher and the event sink.
//!
//! [`MonitorService::startup`] performs the one-time bootstrap (hardware
//! counter reset, log limit load). [`MonitorService::poll`] runs one
//! read → classify → publish → emit cycle.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use eccmon_core::ecc::{parse_max_log, CounterKind, CycleOutcome, EccMonitor};
use eccmon_core::types::{CounterValue, Timestamp};
use eccmon_events::{EventSink, SelRecord};

use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::properties::PropertyPublisher;
use crate::source::EdacSource;
use crate::sysfs::SysfsIo;

pub struct MonitorService {
    monitor: EccMonitor,
    source: EdacSource,
    max_log_file: PathBuf,
    object_path: String,
    sink: Arc<dyn EventSink>,
    publisher: Arc<dyn PropertyPublisher>,
}

impl MonitorService {
    pub fn new(
        config: &AgentConfig,
        sink: Arc<dyn EventSink>,
        publisher: Arc<dyn PropertyPublisher>,
    ) -> Self {
        let policy = config.reporting_mode.build(config.suppression_window);
        Self {
            monitor: EccMonitor::new(policy),
            source: EdacSource::new(
                &config.sysfs_root,
                &config.report_toggle_path,
                SysfsIo::new(config.retry),
            ),
            max_log_file: config.max_log_file.clone(),
            object_path: config.object_path.clone(),
            sink,
            publisher,
        }
    }

    pub fn monitor(&self) -> &EccMonitor {
        &self.monitor
    }

    /// Reset the hardware counters and load the log limit.
    ///
    /// Nothing here is fatal: a missing controller directory skips both
    /// steps, and individual failures are logged.
    pub async fn startup(&mut self) {
        if !self.source.is_present().await {
            tracing::info!(
                root = %self.source.root().display(),
                "EDAC sysfs root not found, skipping counter reset and log limit load",
            );
        } else {
            match self.source.reset_counters().await {
                Ok(()) => tracing::info!("EDAC counters reset"),
                Err(e) => tracing::error!(error = %e, "Failed to reset EDAC counters"),
            }

            match self.load_max_log().await {
                Ok(max_log) => {
                    self.monitor.set_max_log(max_log);
                    tracing::info!(max_log = ?max_log, "ECC log limit loaded");
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        file = %self.max_log_file.display(),
                        "Failed to load ECC log limit, log-full check disabled",
                    );
                }
            }
        }

        self.publisher.publish(&self.monitor.properties());
    }

    async fn load_max_log(&self) -> Result<Option<CounterValue>, AgentError> {
        let raw = self.source.io().read_value(&self.max_log_file).await?;
        Ok(parse_max_log(&raw)?)
    }

    /// Run one polling cycle at the current time.
    pub async fn poll(&mut self) -> Result<CycleOutcome, AgentError> {
        self.poll_at(Utc::now()).await
    }

    /// Run one polling cycle, treating `now` as the current time.
    ///
    /// A failed counter read aborts the cycle before any state changes.
    pub async fn poll_at(&mut self, now: Timestamp) -> Result<CycleOutcome, AgentError> {
        let ce = self.source.read_counter(CounterKind::Correctable).await?;
        let ue = self.source.read_counter(CounterKind::Uncorrectable).await?;

        let outcome = self.monitor.observe(ce, ue, now);
        self.publisher.publish(&outcome.properties);

        for event in &outcome.events {
            let record = SelRecord::from_event(event, self.object_path.as_str());
            if let Err(e) = self.sink.deliver(record).await {
                tracing::error!(
                    error = %e,
                    kind = ?event.kind,
                    sequence = ?event.sequence,
                    "Failed to add SEL record",
                );
            }
        }

        if let Some(control) = outcome.report_control {
            match self.source.set_report(control).await {
                Ok(()) => tracing::info!(report = control.as_str(), "EDAC error reports toggled"),
                Err(e) => tracing::error!(
                    error = %e,
                    report = control.as_str(),
                    "Failed to toggle EDAC error reports",
                ),
            }
        }

        Ok(outcome)
    }
}
