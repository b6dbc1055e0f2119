//! Aggregate ECC classification published as the `state` property.

use serde::Serialize;

/// Last externally published classification.
///
/// Not a strict state machine: any state may follow any other, driven by
/// the current sample alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum EccStatus {
    /// No errors recorded since the last reset.
    #[default]
    Normal,
    /// The most recent change was a correctable error.
    CorrectableEvent,
    /// The most recent change was an uncorrectable error.
    UncorrectableEvent,
    /// The combined error count reached the configured logging limit.
    LogFull,
}

impl EccStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::CorrectableEvent => "CorrectableEvent",
            Self::UncorrectableEvent => "UncorrectableEvent",
            Self::LogFull => "LogFull",
        }
    }
}

impl std::fmt::Display for EccStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
