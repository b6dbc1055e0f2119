//! Publication of the ECC object's properties.
//!
//! The monitor pushes [`EccProperties`] through a [`PropertyPublisher`]
//! after every cycle. [`WatchPublisher`] keeps the latest snapshot in a
//! `tokio::sync::watch` channel and only notifies readers when a value
//! actually changed.

use eccmon_core::ecc::EccProperties;
use tokio::sync::watch;

/// Receives the property snapshot after each polling cycle.
pub trait PropertyPublisher: Send + Sync {
    fn publish(&self, properties: &EccProperties);
}

pub struct WatchPublisher {
    sender: watch::Sender<EccProperties>,
}

impl WatchPublisher {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(EccProperties::default());
        Self { sender }
    }

    pub fn subscribe(&self) -> watch::Receiver<EccProperties> {
        self.sender.subscribe()
    }

    pub fn current(&self) -> EccProperties {
        self.sender.borrow().clone()
    }
}

impl Default for WatchPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyPublisher for WatchPublisher {
    fn publish(&self, properties: &EccProperties) {
        self.sender.send_if_modified(|current| {
            if current == properties {
                return false;
            }
            *current = properties.clone();
            true
        });
    }
}

/// Log every property change until the publisher is dropped.
pub async fn log_changes(mut receiver: watch::Receiver<EccProperties>) {
    while receiver.changed().await.is_ok() {
        let props = receiver.borrow_and_update().clone();
        tracing::info!(
            ce_count = props.ce_count,
            ue_count = props.ue_count,
            is_logging_limit_reached = props.is_logging_limit_reached,
            state = %props.state,
            "ECC properties updated",
        );
    }
}
