use std::collections::BTreeMap;

use async_trait::async_trait;
use lb_core::ports::{DeviceRegistryPort, RegistryError};
use lb_core::{DeviceId, RegisteredDevice};
use tokio::sync::RwLock;

/// Process-local registry, for hosts without persistent storage and for tests.
#[derive(Default)]
pub struct InMemoryDeviceRegistry {
    devices: RwLock<BTreeMap<DeviceId, RegisteredDevice>>,
}

impl InMemoryDeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_devices(devices: impl IntoIterator<Item = RegisteredDevice>) -> Self {
        Self {
            devices: RwLock::new(
                devices
                    .into_iter()
                    .map(|device| (device.device_id.clone(), device))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl DeviceRegistryPort for InMemoryDeviceRegistry {
    async fn get(&self, device_id: &DeviceId) -> Result<Option<RegisteredDevice>, RegistryError> {
        Ok(self.devices.read().await.get(device_id).cloned())
    }

    async fn list(&self) -> Result<Vec<RegisteredDevice>, RegistryError> {
        Ok(self.devices.read().await.values().cloned().collect())
    }

    async fn put(&self, device: RegisteredDevice) -> Result<(), RegistryError> {
        self.devices
            .write()
            .await
            .insert(device.device_id.clone(), device);
        Ok(())
    }

    async fn delete(&self, device_id: &DeviceId) -> Result<bool, RegistryError> {
        Ok(self.devices.write().await.remove(device_id).is_some())
    }
}
