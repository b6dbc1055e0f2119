//! SEL journal consumer.
//!
//! [`SelJournal`] drains the [`EventQueue`](crate::queue::EventQueue) and
//! logs every received [`SelRecord`]. When a journal path is configured each
//! record is also appended to that file as one JSON line. It runs as a
//! long-lived background task and stops once every queue handle is dropped.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use crate::record::SelRecord;
use crate::sink::SinkError;

/// Background service that records SEL entries.
pub struct SelJournal {
    path: Option<PathBuf>,
}

impl SelJournal {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// Run the journal loop until the queue is closed.
    pub async fn run(self, mut receiver: mpsc::Receiver<SelRecord>) {
        while let Some(record) = receiver.recv().await {
            tracing::info!(
                message = %record.message,
                path = %record.object_path,
                sel_data = ?record.sel_data,
                sequence = ?record.sequence,
                "SEL entry added",
            );
            if let Some(path) = self.path.as_deref() {
                if let Err(e) = Self::append(path, &record).await {
                    tracing::error!(
                        error = %e,
                        journal = %path.display(),
                        "Failed to append SEL entry",
                    );
                }
            }
        }
        tracing::info!("Event queue closed, SEL journal shutting down");
    }

    /// Append one record as a JSON line.
    async fn append(path: &Path, record: &SelRecord) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use eccmon_core::ecc::EccEvent;

    use super::*;
    use crate::queue::EventQueue;
    use crate::sink::EventSink;

    fn read_journal(content: &str) -> Vec<SelRecord> {
        content
            .lines()
            .map(|l| serde_json::from_str(l).expect("valid json line"))
            .collect()
    }

    #[tokio::test]
    async fn appends_one_json_line_per_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sel.jsonl");

        let (queue, rx) = EventQueue::channel(8);
        let handle = tokio::spawn(SelJournal::new(Some(path.clone())).run(rx));

        let ce = SelRecord::from_event(&EccEvent::correctable(1), "/ecc");
        let full = SelRecord::from_event(&EccEvent::log_full(), "/ecc");
        queue.deliver(ce).await.expect("deliver");
        queue.deliver(full).await.expect("deliver");
        drop(queue);
        handle.await.expect("journal task should finish");

        let content = tokio::fs::read_to_string(&path).await.expect("journal file");
        let records = read_journal(&content);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sequence, Some(1));
        assert_eq!(records[1].sel_data, [0x05, 0xff, 0xfe]);
    }

    #[tokio::test]
    async fn burst_larger_than_capacity_is_fully_journaled() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sel.jsonl");

        let (queue, rx) = EventQueue::channel(4);
        let handle = tokio::spawn(SelJournal::new(Some(path.clone())).run(rx));

        for seq in 1..=50 {
            let record = SelRecord::from_event(&EccEvent::correctable(seq), "/ecc");
            queue.deliver(record).await.expect("deliver");
        }
        drop(queue);
        handle.await.expect("journal task should finish");

        let content = tokio::fs::read_to_string(&path).await.expect("journal file");
        let seqs: Vec<_> = read_journal(&content).iter().map(|r| r.sequence).collect();
        assert_eq!(seqs, (1..=50).map(Some).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn stops_when_queue_is_dropped() {
        let (queue, rx) = EventQueue::channel(1);
        let handle = tokio::spawn(SelJournal::new(None).run(rx));
        drop(queue);
        handle.await.expect("journal task should finish");
    }
}
