use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::FdlError;

/// Global configuration loaded from `~/.config/fdl/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FdlConfig {
    /// Maximum number of transfers running at once. Must be at least 1.
    pub max_concurrent_transfers: usize,
    /// Retry count per transfer. Accepted and stored but not acted on: no retries are performed.
    pub max_retry: u32,
    /// Wall-clock limit for one batch, in minutes. Must be at least 1.
    pub timeout_minutes: u64,
    /// Publish per-second throughput and fractional progress to subscribers.
    pub detailed_progress: bool,
    /// Turn any failed transfer into a batch error when the batch was not cancelled or timed out.
    pub fail_on_transfer_error: bool,
}

impl Default for FdlConfig {
    fn default() -> Self {
        Self {
            max_concurrent_transfers: 3,
            max_retry: 0,
            timeout_minutes: 60,
            detailed_progress: false,
            fail_on_transfer_error: false,
        }
    }
}

impl FdlConfig {
    /// Checks the values the orchestrator cannot run with.
    pub fn validate(&self) -> Result<(), FdlError> {
        if self.max_concurrent_transfers == 0 {
            return Err(FdlError::Configuration(
                "max_concurrent_transfers must be at least 1".to_string(),
            ));
        }
        if self.timeout_minutes == 0 {
            return Err(FdlError::Configuration(
                "timeout_minutes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_minutes.saturating_mul(60))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("fdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FdlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: FdlConfig = toml::from_str(&data)?;
    Ok(cfg)
}
