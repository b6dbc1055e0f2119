//! Bounded in-process queue between the monitor and the SEL journal.
//!
//! [`EventQueue`] wraps the sending half of a bounded `tokio::sync::mpsc`
//! channel and is the [`EventSink`] the daemon hands to the monitor. When the
//! consumer falls behind, [`EventSink::deliver`] waits for room instead of
//! dropping records, so every accepted record reaches the receiver.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::record::SelRecord;
use crate::sink::{EventSink, SinkError};

/// Default number of records buffered ahead of the consumer.
pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct EventQueue {
    sender: mpsc::Sender<SelRecord>,
}

impl EventQueue {
    /// Create a queue buffering up to `capacity` records (at least one).
    ///
    /// The queue closes once every [`EventQueue`] clone is dropped.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<SelRecord>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl EventSink for EventQueue {
    /// Waits while the buffer is full. Fails once the receiver is gone.
    async fn deliver(&self, record: SelRecord) -> Result<(), SinkError> {
        self.sender.send(record).await.map_err(|_| SinkError::Closed)
    }
}
