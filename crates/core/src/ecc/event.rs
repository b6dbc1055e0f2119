//! Discrete ECC incidents handed to the event sink.
//!
//! Message text, payload bytes and the generator id follow the IPMI SEL
//! conventions expected by the platform's event log.

use serde::Serialize;

use crate::types::CounterValue;

/// Generator id for records raised by the BMC itself.
pub const SEL_BMC_GENERATOR_ID: u16 = 0x0020;

pub const MSG_CORRECTABLE: &str = "ECC error(correctable)";
pub const MSG_UNCORRECTABLE: &str = "ECC error(uncorrectable)";
pub const MSG_LOG_FULL: &str = "ECC error(memory error logging limit reached)";

/// Kind of incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EccEventKind {
    Correctable,
    Uncorrectable,
    LogFull,
}

impl EccEventKind {
    /// Fixed 3-byte SEL event data for this kind.
    pub fn sel_data(&self) -> [u8; 3] {
        match self {
            Self::Correctable => [0x00, 0xff, 0xfe],
            Self::Uncorrectable => [0x01, 0xff, 0xfe],
            Self::LogFull => [0x05, 0xff, 0xfe],
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Correctable => MSG_CORRECTABLE,
            Self::Uncorrectable => MSG_UNCORRECTABLE,
            Self::LogFull => MSG_LOG_FULL,
        }
    }
}

/// One incident produced by a classification cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EccEvent {
    pub kind: EccEventKind,
    /// Cumulative counter value this event accounts for. `None` for
    /// log-full events, which are not tied to a single increment.
    pub sequence: Option<CounterValue>,
}

impl EccEvent {
    pub fn correctable(sequence: CounterValue) -> Self {
        Self {
            kind: EccEventKind::Correctable,
            sequence: Some(sequence),
        }
    }

    pub fn uncorrectable(sequence: CounterValue) -> Self {
        Self {
            kind: EccEventKind::Uncorrectable,
            sequence: Some(sequence),
        }
    }

    pub fn log_full() -> Self {
        Self {
            kind: EccEventKind::LogFull,
            sequence: None,
        }
    }
}
