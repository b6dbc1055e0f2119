//! Retrying access to single-value sysfs nodes.
//!
//! sysfs attributes can race with driver state and fail transiently, so
//! every read and write is retried with a fixed delay. Each call gets its
//! own attempt budget from [`RetryPolicy`]; when it runs out the call
//! returns [`SysfsError::RetriesExhausted`] instead of blocking forever.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use eccmon_core::ecc::parse_counter;
use eccmon_core::error::EccError;
use eccmon_core::types::CounterValue;
use tokio::io::AsyncWriteExt;

/// Per-call retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(100),
        }
    }
}

/// Why a single attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] EccError),
}

#[derive(Debug, thiserror::Error)]
pub enum SysfsError {
    #[error("{}: gave up after {attempts} attempts: {last}", .path.display())]
    RetriesExhausted {
        path: PathBuf,
        attempts: u32,
        #[source]
        last: AttemptError,
    },
}

impl SysfsError {
    pub fn path(&self) -> &Path {
        match self {
            Self::RetriesExhausted { path, .. } => path,
        }
    }
}

/// Reader/writer for sysfs-style scalar files.
#[derive(Debug, Clone, Default)]
pub struct SysfsIo {
    retry: RetryPolicy,
}

impl SysfsIo {
    pub fn new(retry: RetryPolicy) -> Self {
        Self { retry }
    }

    /// Read the first whitespace-delimited token of `path`.
    pub async fn read_value(&self, path: &Path) -> Result<String, SysfsError> {
        self.with_retry(path, "read", || read_token(path)).await
    }

    /// Read `path` as a counter. Malformed content counts as a failed
    /// attempt, the same as an I/O error.
    pub async fn read_counter(&self, path: &Path) -> Result<CounterValue, SysfsError> {
        self.with_retry(path, "read", || async move {
            let token = read_token(path).await?;
            Ok::<_, AttemptError>(parse_counter(&token)?)
        })
        .await
    }

    /// Replace the content of `path` with `value` and flush. The node must
    /// already exist.
    pub async fn write_value(&self, path: &Path, value: &str) -> Result<(), SysfsError> {
        self.with_retry(path, "write", || async move {
            let mut file = tokio::fs::OpenOptions::new()
                .write(true)
                .truncate(true)
                .open(path)
                .await?;
            file.write_all(value.as_bytes()).await?;
            file.flush().await?;
            Ok::<_, AttemptError>(())
        })
        .await
    }

    async fn with_retry<T, F, Fut>(
        &self,
        path: &Path,
        op: &'static str,
        mut attempt: F,
    ) -> Result<T, SysfsError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AttemptError>>,
    {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut n = 1;
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) if n >= max_attempts => {
                    tracing::error!(
                        path = %path.display(),
                        op,
                        attempts = n,
                        error = %e,
                        "sysfs access failed, giving up",
                    );
                    return Err(SysfsError::RetriesExhausted {
                        path: path.to_path_buf(),
                        attempts: n,
                        last: e,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        op,
                        attempt = n,
                        max_attempts,
                        error = %e,
                        "sysfs access failed, retrying",
                    );
                    tokio::time::sleep(self.retry.delay).await;
                    n += 1;
                }
            }
        }
    }
}

async fn read_token(path: &Path) -> Result<String, AttemptError> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(content
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string())
}
