//! ECC event sink.
//!
//! This crate carries discrete ECC incidents away from the monitor:
//!
//! - [`SelRecord`]: the event-log envelope (message, source object, 3-byte
//!   SEL payload, assertion flag, generator id).
//! - [`EventSink`]: the delivery seam used by the monitor.
//! - [`EventQueue`]: bounded in-process sink backed by
//!   `tokio::sync::mpsc`.
//! - [`SelJournal`]: background consumer that logs every record and can
//!   append it to a JSON-lines journal file.

pub mod journal;
pub mod queue;
pub mod record;
pub mod sink;

pub use journal::SelJournal;
pub use queue::EventQueue;
pub use record::SelRecord;
pub use sink::{EventSink, SinkError};
