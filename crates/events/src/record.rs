//! SEL record envelope.

use chrono::{DateTime, Utc};
use eccmon_core::ecc::event::SEL_BMC_GENERATOR_ID;
use eccmon_core::ecc::{EccEvent, EccEventKind};
use serde::{Deserialize, Serialize};

/// One incident as delivered to the event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelRecord {
    /// Human-readable message, e.g. `"ECC error(correctable)"`.
    pub message: String,

    /// Object path of the reporting ECC object.
    pub object_path: String,

    /// Event-type specific SEL payload.
    pub sel_data: [u8; 3],

    /// Assertion (true) or deassertion (false) of the condition.
    pub assert: bool,

    /// IPMI generator id of the reporter.
    pub generator_id: u16,

    /// Cumulative counter value for per-increment events.
    pub sequence: Option<i64>,

    /// When the record was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl SelRecord {
    /// Build the record for `event` raised by the object at `object_path`.
    pub fn from_event(event: &EccEvent, object_path: impl Into<String>) -> Self {
        Self {
            message: event.kind.message().to_string(),
            object_path: object_path.into(),
            sel_data: event.kind.sel_data(),
            assert: true,
            generator_id: SEL_BMC_GENERATOR_ID,
            sequence: event.sequence,
            timestamp: Utc::now(),
        }
    }

    /// Recover the event kind from the SEL payload.
    pub fn kind(&self) -> Option<EccEventKind> {
        [
            EccEventKind::Correctable,
            EccEventKind::Uncorrectable,
            EccEventKind::LogFull,
        ]
        .into_iter()
        .find(|k| k.sel_data() == self.sel_data)
    }
}
