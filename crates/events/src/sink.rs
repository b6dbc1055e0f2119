//! Delivery seam between the monitor and the event log.

use async_trait::async_trait;

use crate::record::SelRecord;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Event sink closed")]
    Closed,

    #[error("Event delivery failed: {0}")]
    Delivery(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Accepts SEL records from the monitor.
///
/// Delivery is fire-and-forget from the monitor's point of view: a failed
/// delivery is logged by the caller and never retried.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn deliver(&self, record: SelRecord) -> Result<(), SinkError>;
}
