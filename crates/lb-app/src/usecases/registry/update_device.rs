use std::sync::Arc;

use lb_core::ports::{ErrorLogPort, Notice, NotificationPort};
use lb_core::{DeviceId, RegisteredDevice};
use tracing::{info_span, Instrument};

use super::{report_outcome, DeviceRegistry, RegistryUseCaseError};

/// Rename a registered lockbox.
pub struct UpdateDeviceName {
    registry: Arc<DeviceRegistry>,
    notifier: Arc<dyn NotificationPort>,
    error_log: Arc<dyn ErrorLogPort>,
}

impl UpdateDeviceName {
    pub fn new(
        registry: Arc<DeviceRegistry>,
        notifier: Arc<dyn NotificationPort>,
        error_log: Arc<dyn ErrorLogPort>,
    ) -> Self {
        Self {
            registry,
            notifier,
            error_log,
        }
    }

    pub async fn execute(
        &self,
        device_id: &DeviceId,
        device_name: &str,
    ) -> Result<RegisteredDevice, RegistryUseCaseError> {
        let span = info_span!("usecase.update_device_name.execute", %device_id);
        async {
            let result = self.registry.rename(device_id, device_name).await;
            report_outcome(
                &result,
                self.notifier.as_ref(),
                self.error_log.as_ref(),
                "update_device_name",
                Notice::LockboxUpdateSuccess,
                Notice::LockboxUpdateError,
            )
            .await;
            result
        }
        .instrument(span)
        .await
    }
}

/// Toggle whether balances of a lockbox are shown.
pub struct UpdateDeviceBalanceDisplay {
    registry: Arc<DeviceRegistry>,
    notifier: Arc<dyn NotificationPort>,
    error_log: Arc<dyn ErrorLogPort>,
}

impl UpdateDeviceBalanceDisplay {
    pub fn new(
        registry: Arc<DeviceRegistry>,
        notifier: Arc<dyn NotificationPort>,
        error_log: Arc<dyn ErrorLogPort>,
    ) -> Self {
        Self {
            registry,
            notifier,
            error_log,
        }
    }

    pub async fn execute(
        &self,
        device_id: &DeviceId,
        show_balances: bool,
    ) -> Result<RegisteredDevice, RegistryUseCaseError> {
        let span = info_span!(
            "usecase.update_device_balance_display.execute",
            %device_id,
            show_balances
        );
        async {
            let result = self
                .registry
                .set_balance_display(device_id, show_balances)
                .await;
            report_outcome(
                &result,
                self.notifier.as_ref(),
                self.error_log.as_ref(),
                "update_device_balance_display",
                Notice::LockboxUpdateSuccess,
                Notice::LockboxUpdateError,
            )
            .await;
            result
        }
        .instrument(span)
        .await
    }
}
