//! Post-pairing sessions.
//!
//! Signing and account flows reconnect to a device that is already in the
//! registry. The device class is known, so there is no race: the poller
//! runs a single candidate against the requested context.

use std::sync::Arc;
use std::time::Duration;

use lb_core::ports::{
    DeviceRegistryPort, ErrorLogPort, RegistryError, SessionEvent, SessionEventPort,
};
use lb_core::{ApplicationContext, DeviceId, FailureKind};
use thiserror::Error;
use tracing::{info, info_span, warn, Instrument};

use crate::usecases::connection::{CancelSignal, Connection, ConnectionError, ConnectionPoller};

pub const LOG_LOCATION: &str = "components/lockbox/session";
const OPERATION_CONNECT: &str = "connect_device";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("device {0} is not registered")]
    UnknownDevice(DeviceId),

    #[error(transparent)]
    RegistryUnavailable(#[from] RegistryError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl SessionError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            SessionError::UnknownDevice(_) => FailureKind::UnknownDevice,
            SessionError::RegistryUnavailable(_) => FailureKind::RegistryUnavailable,
            SessionError::Connection(err) => err.failure_kind(),
        }
    }
}

pub struct SessionManager {
    poller: Arc<ConnectionPoller>,
    registry: Arc<dyn DeviceRegistryPort>,
    error_log: Arc<dyn ErrorLogPort>,
    events: Arc<dyn SessionEventPort>,
    reconnect_timeout: Duration,
}

impl SessionManager {
    pub fn new(
        poller: Arc<ConnectionPoller>,
        registry: Arc<dyn DeviceRegistryPort>,
        error_log: Arc<dyn ErrorLogPort>,
        events: Arc<dyn SessionEventPort>,
        reconnect_timeout: Duration,
    ) -> Self {
        Self {
            poller,
            registry,
            error_log,
            events,
            reconnect_timeout,
        }
    }

    /// Open a channel to a registered device running `context`.
    ///
    /// `timeout` defaults to the configured reconnect timeout. Failures are
    /// logged and returned; they never affect a pairing wizard.
    pub async fn reconnect(
        &self,
        device_id: &DeviceId,
        context: ApplicationContext,
        timeout: Option<Duration>,
        cancel: &CancelSignal,
    ) -> Result<Connection, SessionError> {
        let span = info_span!("usecase.session_manager.reconnect", %device_id, %context);
        async {
            let result = self.connect(device_id, context, timeout, cancel).await;
            match &result {
                Ok(connection) => {
                    info!(device_class = %connection.device_class(), "lockbox session established");
                    self.events
                        .emit(SessionEvent::DeviceConnected {
                            device_id: device_id.clone(),
                            device_class: connection.device_class(),
                            context,
                        })
                        .await;
                }
                Err(err) => {
                    warn!(error = %err, kind = %err.failure_kind(), "lockbox reconnect failed");
                    self.error_log
                        .log_error(LOG_LOCATION, OPERATION_CONNECT, &err.to_string())
                        .await;
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn connect(
        &self,
        device_id: &DeviceId,
        context: ApplicationContext,
        timeout: Option<Duration>,
        cancel: &CancelSignal,
    ) -> Result<Connection, SessionError> {
        let device = self
            .registry
            .get(device_id)
            .await?
            .ok_or_else(|| SessionError::UnknownDevice(device_id.clone()))?;

        let connection = self
            .poller
            .await_connection(
                &[device.device_type],
                context,
                timeout.unwrap_or(self.reconnect_timeout),
                cancel,
            )
            .await?;
        Ok(connection)
    }
}
