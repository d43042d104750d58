//! Opening channels to lockbox devices.

mod cancel;
mod channel;
mod device_info_reader;
mod poller;

pub use cancel::{cancel_signal, CancelHandle, CancelSignal};
pub use channel::Connection;
pub use device_info_reader::{DeviceInfoError, DeviceInfoReader};
pub use poller::{ConnectionError, ConnectionPoller};
