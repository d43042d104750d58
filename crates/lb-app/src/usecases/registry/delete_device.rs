use std::sync::Arc;

use lb_core::ports::{ErrorLogPort, Notice, NotificationPort};
use lb_core::DeviceId;
use tracing::{info_span, Instrument};

use super::{report_outcome, DeviceRegistry, RegistryUseCaseError};

/// Forget a registered lockbox.
pub struct DeleteDevice {
    registry: Arc<DeviceRegistry>,
    notifier: Arc<dyn NotificationPort>,
    error_log: Arc<dyn ErrorLogPort>,
}

impl DeleteDevice {
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

    pub async fn execute(&self, device_id: &DeviceId) -> Result<(), RegistryUseCaseError> {
        let span = info_span!("usecase.delete_device.execute", %device_id);
        async {
            let result = self.registry.remove(device_id).await;
            report_outcome(
                &result,
                self.notifier.as_ref(),
                self.error_log.as_ref(),
                "delete_device",
                Notice::LockboxDeleteSuccess,
                Notice::LockboxDeleteError,
            )
            .await;
            result
        }
        .instrument(span)
        .await
    }
}
