//! # lb-app
//!
//! Use cases for lockbox pairing: connection polling, the setup wizard
//! orchestrator, post-pairing sessions, registry maintenance and the
//! wallet data refresh that follows a new device.

pub mod usecases;

pub use usecases::connection::{
    cancel_signal, CancelHandle, CancelSignal, Connection, ConnectionError, ConnectionPoller,
    DeviceInfoError, DeviceInfoReader,
};
pub use usecases::pairing::{PairingDeps, PairingOrchestrator, PairingOrchestratorError};
pub use usecases::refresh::RefreshDeviceData;
pub use usecases::registry::{
    DeleteDevice, DeviceRegistry, RegistryUseCaseError, UpdateDeviceBalanceDisplay,
    UpdateDeviceName,
};
pub use usecases::session::{SessionError, SessionManager};
