//! Port interfaces for the lockbox use cases
//!
//! Ports are the contract between the pairing logic and whatever hosts it:
//! the hardware transport library, the persistent device registry, the
//! notification and error log sinks, UI listeners and the wallet data
//! fetchers. Adapters live in `lb-infra` or in the host application.

pub mod data_fetch;
pub mod device_registry;
pub mod error_log;
pub mod events;
pub mod notification;
pub mod transport;

pub use data_fetch::DataFetchPort;
pub use device_registry::{DeviceRegistryPort, RegistryError};
pub use error_log::ErrorLogPort;
pub use events::{PairingEventPort, PairingWorkflowEvent, SessionEvent, SessionEventPort};
pub use notification::{Notice, NoticeLevel, NotificationPort};
pub use transport::{DeviceRequest, DeviceResponse, TransportChannel, TransportError, TransportPort};
