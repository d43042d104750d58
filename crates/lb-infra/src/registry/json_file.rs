use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use lb_core::ports::{DeviceRegistryPort, RegistryError};
use lb_core::{DeviceId, RegisteredDevice};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// On-disk layout of the registry file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryDocument {
    #[serde(default)]
    devices: BTreeMap<DeviceId, RegisteredDevice>,
}

/// Device registry kept as a single pretty-printed JSON document.
///
/// Every write replaces the whole file atomically (temp file, then rename),
/// so a crash leaves either the previous or the new registry on disk.
pub struct JsonFileDeviceRegistry {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileDeviceRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<RegistryDocument> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(RegistryDocument::default());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("read registry failed: {}", self.path.display()))
            }
        };

        serde_json::from_str(&content)
            .with_context(|| format!("parse registry failed: {}", self.path.display()))
    }

    async fn save(&self, document: &RegistryDocument) -> Result<()> {
        let content =
            serde_json::to_string_pretty(document).context("serialize registry failed")?;

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("create registry dir failed: {}", dir.display()))?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .await
            .with_context(|| format!("write temp registry failed: {}", tmp_path.display()))?;

        if let Err(err) = fs::rename(&tmp_path, &self.path).await {
            if let Err(cleanup) = fs::remove_file(&tmp_path).await {
                warn!(path = %tmp_path.display(), error = %cleanup, "remove temp registry failed");
            }
            return Err(err).with_context(|| {
                format!(
                    "rename temp registry to target failed: {} -> {}",
                    tmp_path.display(),
                    self.path.display()
                )
            });
        }

        debug!(path = %self.path.display(), devices = document.devices.len(), "registry saved");
        Ok(())
    }
}

fn unavailable(err: anyhow::Error) -> RegistryError {
    RegistryError::Unavailable(format!("{err:#}"))
}

#[async_trait]
impl DeviceRegistryPort for JsonFileDeviceRegistry {
    async fn get(&self, device_id: &DeviceId) -> Result<Option<RegisteredDevice>, RegistryError> {
        let mut document = self.load().await.map_err(unavailable)?;
        Ok(document.devices.remove(device_id))
    }

    async fn list(&self) -> Result<Vec<RegisteredDevice>, RegistryError> {
        let document = self.load().await.map_err(unavailable)?;
        Ok(document.devices.into_values().collect())
    }

    async fn put(&self, device: RegisteredDevice) -> Result<(), RegistryError> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.load().await.map_err(unavailable)?;
        document.devices.insert(device.device_id.clone(), device);
        self.save(&document).await.map_err(unavailable)
    }

    async fn delete(&self, device_id: &DeviceId) -> Result<bool, RegistryError> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.load().await.map_err(unavailable)?;
        if document.devices.remove(device_id).is_none() {
            return Ok(false);
        }
        self.save(&document).await.map_err(unavailable)?;
        Ok(true)
    }
}
