use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration, read from `lockbox.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockboxSettings {
    #[serde(default)]
    pub pairing: PairingSettings,

    #[serde(default)]
    pub registry: RegistrySettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingSettings {
    /// Bound for finding a device in dashboard mode.
    pub setup_timeout_ms: u64,
    /// Bound for the signing app to be opened on a known device.
    pub signing_timeout_ms: u64,
    /// Default bound for post-pairing reconnects.
    pub reconnect_timeout_ms: u64,
    /// Pause between two open attempts.
    pub retry_interval_ms: u64,
    /// Bound for reading key material over an open channel.
    pub request_timeout_ms: u64,
}

impl PairingSettings {
    pub fn setup_timeout(&self) -> Duration {
        clamped_millis(self.setup_timeout_ms)
    }

    pub fn signing_timeout(&self) -> Duration {
        clamped_millis(self.signing_timeout_ms)
    }

    pub fn reconnect_timeout(&self) -> Duration {
        clamped_millis(self.reconnect_timeout_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        clamped_millis(self.retry_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        clamped_millis(self.request_timeout_ms)
    }
}

// A zero duration would turn the poll loop into a busy wait.
fn clamped_millis(ms: u64) -> Duration {
    Duration::from_millis(ms.max(1))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// Registry file. `None` resolves to the platform data directory.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub file_logging: bool,
    /// Log directory. `None` resolves to the platform data directory.
    pub directory: Option<PathBuf>,
}
