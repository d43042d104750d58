pub mod defaults;
pub mod model;

pub use model::{LockboxSettings, LoggingSettings, PairingSettings, RegistrySettings};
