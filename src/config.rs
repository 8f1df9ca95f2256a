use crate::error::{DriverError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Timing and connect-feedback knobs for the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Upper bound on each per-channel interrupt read.
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,
    /// Pause between attempts to attach the receiver.
    pub attach_retry_ms: u64,
    /// Confirmation buzz played when a controller joins.
    pub connect_rumble_ms: u64,
    pub connect_rumble_big: u8,
    pub connect_rumble_small: u8,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: 50,
            write_timeout_ms: 50,
            attach_retry_ms: 500,
            connect_rumble_ms: 250,
            connect_rumble_big: 0xFF,
            connect_rumble_small: 0x00,
        }
    }
}

impl DriverConfig {
    fn config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| DriverError::Config("Cannot find config directory".into()))?
            .join("x360-wireless");
        Ok(dir.join("config.json"))
    }

    /// Load the user's config, or the defaults when none has been written.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn attach_retry(&self) -> Duration {
        Duration::from_millis(self.attach_retry_ms)
    }

    pub fn connect_rumble(&self) -> Duration {
        Duration::from_millis(self.connect_rumble_ms)
    }
}
