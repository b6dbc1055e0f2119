//! Agent configuration loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use eccmon_core::ecc::ReportingMode;

use crate::sysfs::RetryPolicy;

const DEFAULT_SYSFS_ROOT: &str = "/sys/devices/system/edac/mc/mc0";
const DEFAULT_REPORT_TOGGLE_PATH: &str = "/sys/module/edac_core/parameters/edac_report";
const DEFAULT_MAX_LOG_FILE: &str = "/etc/ecc/maxlog.conf";
const DEFAULT_OBJECT_PATH: &str = "/xyz/openbmc_project/metrics/memory/BmcECC";
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const DEFAULT_SUPPRESSION_WINDOW_SECS: u64 = 3600;
const DEFAULT_IO_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_IO_RETRY_DELAY_MS: u64 = 100;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// EDAC memory controller directory holding `ce_count`, `ue_count` and
    /// `reset_counters`.
    pub sysfs_root: PathBuf,
    /// Kernel toggle that enables or disables EDAC error reports.
    pub report_toggle_path: PathBuf,
    /// File holding the combined CE+UE logging limit.
    pub max_log_file: PathBuf,
    /// Object path stamped on every SEL record.
    pub object_path: String,
    pub poll_interval: Duration,
    pub reporting_mode: ReportingMode,
    /// Quiet period of the suppression reporting mode.
    pub suppression_window: Duration,
    pub retry: RetryPolicy,
    /// Optional JSON-lines file receiving every SEL record.
    pub sel_journal: Option<PathBuf>,
}

impl AgentConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                                        |
    /// |-------------------------------|------------------------------------------------|
    /// | `ECC_SYSFS_ROOT`              | `/sys/devices/system/edac/mc/mc0`              |
    /// | `ECC_REPORT_TOGGLE_PATH`      | `/sys/module/edac_core/parameters/edac_report` |
    /// | `ECC_MAX_LOG_FILE`            | `/etc/ecc/maxlog.conf`                         |
    /// | `ECC_OBJECT_PATH`             | `/xyz/openbmc_project/metrics/memory/BmcECC`   |
    /// | `ECC_POLL_INTERVAL_MS`        | `1000`                                         |
    /// | `ECC_REPORTING_MODE`          | `direct` (or `suppression`)                    |
    /// | `ECC_SUPPRESSION_WINDOW_SECS` | `3600`                                         |
    /// | `ECC_IO_MAX_ATTEMPTS`         | `3`                                            |
    /// | `ECC_IO_RETRY_DELAY_MS`       | `100`                                          |
    /// | `ECC_SEL_JOURNAL`             | unset                                          |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = |key: &str, default: &str| PathBuf::from(lookup(key).unwrap_or_else(|| default.into()));

        let poll_interval_ms: u64 = parsed(&lookup, "ECC_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?;
        if poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "ECC_POLL_INTERVAL_MS",
                value: "0".into(),
                reason: "must be greater than zero".into(),
            });
        }

        let max_attempts: u32 = parsed(&lookup, "ECC_IO_MAX_ATTEMPTS", DEFAULT_IO_MAX_ATTEMPTS)?;
        if max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "ECC_IO_MAX_ATTEMPTS",
                value: "0".into(),
                reason: "at least one attempt is required".into(),
            });
        }

        let retry_delay_ms: u64 = parsed(&lookup, "ECC_IO_RETRY_DELAY_MS", DEFAULT_IO_RETRY_DELAY_MS)?;
        let window_secs: u64 = parsed(
            &lookup,
            "ECC_SUPPRESSION_WINDOW_SECS",
            DEFAULT_SUPPRESSION_WINDOW_SECS,
        )?;
        let reporting_mode: ReportingMode =
            parsed(&lookup, "ECC_REPORTING_MODE", ReportingMode::default())?;

        Ok(Self {
            sysfs_root: path("ECC_SYSFS_ROOT", DEFAULT_SYSFS_ROOT),
            report_toggle_path: path("ECC_REPORT_TOGGLE_PATH", DEFAULT_REPORT_TOGGLE_PATH),
            max_log_file: path("ECC_MAX_LOG_FILE", DEFAULT_MAX_LOG_FILE),
            object_path: lookup("ECC_OBJECT_PATH").unwrap_or_else(|| DEFAULT_OBJECT_PATH.into()),
            poll_interval: Duration::from_millis(poll_interval_ms),
            reporting_mode,
            suppression_window: Duration::from_secs(window_secs),
            retry: RetryPolicy {
                max_attempts,
                delay: Duration::from_millis(retry_delay_ms),
            },
            sel_journal: lookup("ECC_SEL_JOURNAL")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

/// Parse `key` if set, otherwise return `default`.
fn parsed<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<AgentConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AgentConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = load(&[]).expect("defaults are valid");
        assert_eq!(cfg.sysfs_root, PathBuf::from(DEFAULT_SYSFS_ROOT));
        assert_eq!(cfg.report_toggle_path, PathBuf::from(DEFAULT_REPORT_TOGGLE_PATH));
        assert_eq!(cfg.max_log_file, PathBuf::from(DEFAULT_MAX_LOG_FILE));
        assert_eq!(cfg.poll_interval, Duration::from_secs(1));
        assert_eq!(cfg.reporting_mode, ReportingMode::Direct);
        assert_eq!(cfg.suppression_window, Duration::from_secs(3600));
        assert_eq!(cfg.retry.max_attempts, 3);
        assert_eq!(cfg.retry.delay, Duration::from_millis(100));
        assert!(cfg.sel_journal.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = load(&[
            ("ECC_SYSFS_ROOT", "/tmp/mc1"),
            ("ECC_POLL_INTERVAL_MS", "250"),
            ("ECC_REPORTING_MODE", "suppression"),
            ("ECC_SUPPRESSION_WINDOW_SECS", "60"),
            ("ECC_SEL_JOURNAL", "/var/log/sel.jsonl"),
        ])
        .expect("valid overrides");
        assert_eq!(cfg.sysfs_root, PathBuf::from("/tmp/mc1"));
        assert_eq!(cfg.poll_interval, Duration::from_millis(250));
        assert_eq!(cfg.reporting_mode, ReportingMode::Suppression);
        assert_eq!(cfg.suppression_window, Duration::from_secs(60));
        assert_eq!(cfg.sel_journal, Some(PathBuf::from("/var/log/sel.jsonl")));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert_matches!(
            load(&[("ECC_POLL_INTERVAL_MS", "soon")]),
            Err(ConfigError::Invalid { key: "ECC_POLL_INTERVAL_MS", .. })
        );
        assert_matches!(
            load(&[("ECC_POLL_INTERVAL_MS", "0")]),
            Err(ConfigError::Invalid { key: "ECC_POLL_INTERVAL_MS", .. })
        );
        assert_matches!(
            load(&[("ECC_REPORTING_MODE", "loud")]),
            Err(ConfigError::Invalid { key: "ECC_REPORTING_MODE", .. })
        );
        assert_matches!(
            load(&[("ECC_IO_MAX_ATTEMPTS", "0")]),
            Err(ConfigError::Invalid { key: "ECC_IO_MAX_ATTEMPTS", .. })
        );
    }
}
