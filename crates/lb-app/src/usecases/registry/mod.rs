//! Registry reconciliation: reading and maintaining registered lockboxes.

mod delete_device;
mod device_registry;
mod update_device;

use lb_core::ports::{ErrorLogPort, Notice, NotificationPort, RegistryError};
use lb_core::{DeviceId, FailureKind};
use thiserror::Error;

pub use delete_device::DeleteDevice;
pub use device_registry::DeviceRegistry;
pub use update_device::{UpdateDeviceBalanceDisplay, UpdateDeviceName};

pub const LOG_LOCATION: &str = "components/lockbox/registry";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryUseCaseError {
    #[error("device {0} is not registered")]
    UnknownDevice(DeviceId),

    #[error("device name must not be empty")]
    EmptyDeviceName,

    #[error(transparent)]
    RegistryUnavailable(#[from] RegistryError),
}

impl RegistryUseCaseError {
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            RegistryUseCaseError::UnknownDevice(_) => Some(FailureKind::UnknownDevice),
            RegistryUseCaseError::RegistryUnavailable(_) => Some(FailureKind::RegistryUnavailable),
            RegistryUseCaseError::EmptyDeviceName => None,
        }
    }
}

/// Exactly one notification per outcome, plus a log entry on failure.
async fn report_outcome<T>(
    result: &Result<T, RegistryUseCaseError>,
    notifier: &dyn NotificationPort,
    error_log: &dyn ErrorLogPort,
    operation: &str,
    success: Notice,
    failure: Notice,
) {
    match result {
        Ok(_) => notifier.notify_success(success).await,
        Err(err) => {
            tracing::warn!(operation, error = %err, "lockbox registry operation failed");
            notifier.notify_error(failure).await;
            error_log
                .log_error(LOG_LOCATION, operation, &err.to_string())
                .await;
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use lb_core::ports::{DeviceRegistryPort, ErrorLogPort, Notice, NotificationPort, RegistryError};
    use lb_core::{AccountsMetadata, DeviceClass, DeviceId, RegisteredDevice};

    #[derive(Default)]
    pub struct FakeRegistry {
        pub records: Mutex<BTreeMap<DeviceId, RegisteredDevice>>,
        pub offline: bool,
    }

    impl FakeRegistry {
        pub fn with(devices: Vec<RegisteredDevice>) -> Self {
            let records = devices
                .into_iter()
                .map(|d| (d.device_id.clone(), d))
                .collect();
            Self {
                records: Mutex::new(records),
                offline: false,
            }
        }

        pub fn offline() -> Self {
            Self {
                records: Mutex::default(),
                offline: true,
            }
        }

        fn check(&self) -> Result<(), RegistryError> {
            if self.offline {
                Err(RegistryError::Unavailable("store offline".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl DeviceRegistryPort for FakeRegistry {
        async fn get(&self, device_id: &DeviceId) -> Result<Option<RegisteredDevice>, RegistryError> {
            self.check()?;
            Ok(self.records.lock().unwrap().get(device_id).cloned())
        }

        async fn list(&self) -> Result<Vec<RegisteredDevice>, RegistryError> {
            self.check()?;
            Ok(self.records.lock().unwrap().values().cloned().collect())
        }

        async fn put(&self, device: RegisteredDevice) -> Result<(), RegistryError> {
            self.check()?;
            self.records
                .lock()
                .unwrap()
                .insert(device.device_id.clone(), device);
            Ok(())
        }

        async fn delete(&self, device_id: &DeviceId) -> Result<bool, RegistryError> {
            self.check()?;
            Ok(self.records.lock().unwrap().remove(device_id).is_some())
        }
    }

    #[derive(Default)]
    pub struct RecordingSinks {
        pub successes: Mutex<Vec<Notice>>,
        pub errors: Mutex<Vec<Notice>>,
        pub logs: Mutex<Vec<(String, String, String)>>,
    }

    #[async_trait]
    impl NotificationPort for RecordingSinks {
        async fn notify_success(&self, notice: Notice) {
            self.successes.lock().unwrap().push(notice);
        }

        async fn notify_error(&self, notice: Notice) {
            self.errors.lock().unwrap().push(notice);
        }
    }

    #[async_trait]
    impl ErrorLogPort for RecordingSinks {
        async fn log_error(&self, location: &str, operation: &str, cause: &str) {
            self.logs.lock().unwrap().push((
                location.to_string(),
                operation.to_string(),
                cause.to_string(),
            ));
        }
    }

    pub fn device(id: &str, name: &str) -> RegisteredDevice {
        RegisteredDevice {
            device_id: DeviceId::from(id),
            device_type: DeviceClass::Ledger,
            device_name: name.to_string(),
            accounts: AccountsMetadata::default(),
            show_balances: true,
            paired_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }
}
