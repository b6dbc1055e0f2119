//! EDAC counter source.
//!
//! Wraps the sysfs nodes of one memory controller plus the kernel's
//! error-report toggle behind typed operations.

use std::path::{Path, PathBuf};

use eccmon_core::ecc::{CounterKind, ReportControl};
use eccmon_core::types::CounterValue;

use crate::sysfs::{SysfsError, SysfsIo};

/// Node that clears both counters when written.
const RESET_NODE: &str = "reset_counters";

/// Token accepted by [`RESET_NODE`].
const RESET_TOKEN: &str = "1";

#[derive(Debug, Clone)]
pub struct EdacSource {
    root: PathBuf,
    report_toggle: PathBuf,
    io: SysfsIo,
}

impl EdacSource {
    pub fn new(root: impl Into<PathBuf>, report_toggle: impl Into<PathBuf>, io: SysfsIo) -> Self {
        Self {
            root: root.into(),
            report_toggle: report_toggle.into(),
            io,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn io(&self) -> &SysfsIo {
        &self.io
    }

    /// Whether the controller directory is present at all.
    pub async fn is_present(&self) -> bool {
        tokio::fs::try_exists(&self.root).await.unwrap_or(false)
    }

    pub async fn read_counter(&self, kind: CounterKind) -> Result<CounterValue, SysfsError> {
        self.io.read_counter(&self.root.join(kind.node_name())).await
    }

    /// Clear the hardware CE and UE counters.
    pub async fn reset_counters(&self) -> Result<(), SysfsError> {
        self.io
            .write_value(&self.root.join(RESET_NODE), RESET_TOKEN)
            .await
    }

    /// Switch kernel EDAC error reports on or off.
    pub async fn set_report(&self, control: ReportControl) -> Result<(), SysfsError> {
        self.io
            .write_value(&self.report_toggle, control.as_str())
            .await
    }
}
