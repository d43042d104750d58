use async_trait::async_trait;
use thiserror::Error;

use crate::device::RegisteredDevice;
use crate::ids::DeviceId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("device registry unavailable: {0}")]
    Unavailable(String),
}

/// Persistent store of registered devices, keyed by [`DeviceId`].
///
/// A missing record is `Ok(None)` / `Ok(false)`, never an error.
#[async_trait]
pub trait DeviceRegistryPort: Send + Sync {
    async fn get(&self, device_id: &DeviceId) -> Result<Option<RegisteredDevice>, RegistryError>;

    async fn list(&self) -> Result<Vec<RegisteredDevice>, RegistryError>;

    /// Insert or replace the record under `device.device_id`.
    async fn put(&self, device: RegisteredDevice) -> Result<(), RegistryError>;

    /// Returns whether a record was removed.
    async fn delete(&self, device_id: &DeviceId) -> Result<bool, RegistryError>;
}

#[cfg(test)]
mockall::mock! {
    pub DeviceRegistry {}

    #[async_trait]
    impl DeviceRegistryPort for DeviceRegistry {
        async fn get(&self, device_id: &DeviceId) -> Result<Option<RegisteredDevice>, RegistryError>;
        async fn list(&self) -> Result<Vec<RegisteredDevice>, RegistryError>;
        async fn put(&self, device: RegisteredDevice) -> Result<(), RegistryError>;
        async fn delete(&self, device_id: &DeviceId) -> Result<bool, RegistryError>;
    }
}
