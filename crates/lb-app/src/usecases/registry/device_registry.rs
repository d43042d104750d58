use std::collections::BTreeMap;
use std::sync::Arc;

use lb_core::ports::DeviceRegistryPort;
use lb_core::{DeviceId, RegisteredDevice};
use tracing::{debug, info};

use super::RegistryUseCaseError;

/// Read-modify-write access to registered devices.
pub struct DeviceRegistry {
    port: Arc<dyn DeviceRegistryPort>,
}

impl DeviceRegistry {
    pub fn new(port: Arc<dyn DeviceRegistryPort>) -> Self {
        Self { port }
    }

    pub async fn list_devices(
        &self,
    ) -> Result<BTreeMap<DeviceId, RegisteredDevice>, RegistryUseCaseError> {
        let devices = self.port.list().await?;
        Ok(devices
            .into_iter()
            .map(|device| (device.device_id.clone(), device))
            .collect())
    }

    /// Whether any lockbox is registered. Hosts use it to decide whether
    /// to show the dashboard or the setup wizard.
    pub async fn has_devices(&self) -> Result<bool, RegistryUseCaseError> {
        Ok(!self.port.list().await?.is_empty())
    }

    pub async fn get_device(
        &self,
        device_id: &DeviceId,
    ) -> Result<Option<RegisteredDevice>, RegistryUseCaseError> {
        Ok(self.port.get(device_id).await?)
    }

    pub async fn upsert_device(&self, device: RegisteredDevice) -> Result<(), RegistryUseCaseError> {
        debug!(device_id = %device.device_id, "upserting lockbox record");
        self.port.put(device).await?;
        Ok(())
    }

    pub async fn rename(
        &self,
        device_id: &DeviceId,
        device_name: &str,
    ) -> Result<RegisteredDevice, RegistryUseCaseError> {
        let device_name = device_name.trim();
        if device_name.is_empty() {
            return Err(RegistryUseCaseError::EmptyDeviceName);
        }
        let device_name = device_name.to_string();
        self.modify(device_id, move |device| device.device_name = device_name)
            .await
    }

    pub async fn set_balance_display(
        &self,
        device_id: &DeviceId,
        show_balances: bool,
    ) -> Result<RegisteredDevice, RegistryUseCaseError> {
        self.modify(device_id, move |device| device.show_balances = show_balances)
            .await
    }

    pub async fn remove(&self, device_id: &DeviceId) -> Result<(), RegistryUseCaseError> {
        if !self.port.delete(device_id).await? {
            return Err(RegistryUseCaseError::UnknownDevice(device_id.clone()));
        }
        info!(%device_id, "lockbox removed from registry");
        Ok(())
    }

    async fn modify<F>(
        &self,
        device_id: &DeviceId,
        apply: F,
    ) -> Result<RegisteredDevice, RegistryUseCaseError>
    where
        F: FnOnce(&mut RegisteredDevice) + Send,
    {
        let mut device = self
            .port
            .get(device_id)
            .await?
            .ok_or_else(|| RegistryUseCaseError::UnknownDevice(device_id.clone()))?;
        apply(&mut device);
        // The key never changes, whatever the closure did.
        device.device_id = device_id.clone();
        self.port.put(device.clone()).await?;
        Ok(device)
    }
}
