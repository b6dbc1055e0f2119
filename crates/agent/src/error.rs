use eccmon_core::error::EccError;

use crate::config::ConfigError;
use crate::sysfs::SysfsError;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Sysfs(#[from] SysfsError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid log limit: {0}")]
    Limit(#[from] EccError),

    #[error("Polling period must be non-zero")]
    ZeroPeriod,
}
