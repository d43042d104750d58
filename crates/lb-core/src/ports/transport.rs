use async_trait::async_trait;
use thiserror::Error;

use crate::device::{ApplicationContext, DeviceClass, ExtendedPublicKey};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("no device connected")]
    NotConnected,

    #[error("device is not running the {expected} application")]
    WrongContext { expected: ApplicationContext },

    #[error("device is busy")]
    Busy,

    #[error("device rejected the request: {0}")]
    Rejected(String),

    #[error("channel closed")]
    Closed,

    #[error("transport failure: {0}")]
    Io(String),
}

impl TransportError {
    /// Errors that mean "not yet": the poller sleeps and tries again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::NotConnected | TransportError::WrongContext { .. } | TransportError::Busy
        )
    }
}

/// Request sent over an open channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceRequest {
    /// BIP32 path such as `44'/0'/0'`.
    GetExtendedPublicKey { path: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceResponse {
    ExtendedPublicKey(ExtendedPublicKey),
    /// Bare status word, returned when the app has nothing else to say.
    Status(u16),
}

/// One open channel to a device, valid for a single application context.
#[async_trait]
pub trait TransportChannel: Send + Sync {
    async fn request(&self, request: DeviceRequest) -> Result<DeviceResponse, TransportError>;

    /// Idempotent.
    async fn close(&self) -> Result<(), TransportError>;
}

/// Hardware transport library.
#[async_trait]
pub trait TransportPort: Send + Sync {
    /// Try once to open a channel to `class` running `context`.
    async fn open(
        &self,
        class: DeviceClass,
        context: ApplicationContext,
    ) -> Result<Box<dyn TransportChannel>, TransportError>;
}
