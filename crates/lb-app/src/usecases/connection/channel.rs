use std::fmt;

use lb_core::ports::{DeviceRequest, DeviceResponse, TransportChannel, TransportError};
use lb_core::{ApplicationContext, DeviceClass};
use tracing::{debug, warn};

/// Open channel to a device, bound to one application context.
pub struct Connection {
    device_class: DeviceClass,
    context: ApplicationContext,
    channel: Box<dyn TransportChannel>,
}

impl Connection {
    pub fn new(
        device_class: DeviceClass,
        context: ApplicationContext,
        channel: Box<dyn TransportChannel>,
    ) -> Self {
        Self {
            device_class,
            context,
            channel,
        }
    }

    pub fn device_class(&self) -> DeviceClass {
        self.device_class
    }

    pub fn context(&self) -> ApplicationContext {
        self.context
    }

    pub async fn request(&self, request: DeviceRequest) -> Result<DeviceResponse, TransportError> {
        self.channel.request(request).await
    }

    /// Release the channel. Close errors are logged and swallowed.
    pub async fn close(self) {
        match self.channel.close().await {
            Ok(()) => debug!(
                device_class = %self.device_class,
                context = %self.context,
                "lockbox channel closed"
            ),
            Err(err) => warn!(
                device_class = %self.device_class,
                context = %self.context,
                error = %err,
                "failed to close lockbox channel"
            ),
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("device_class", &self.device_class)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
