//! # lb-core
//!
//! Core domain models and pairing logic for lockbox hardware signers.
//!
//! This crate contains pure business logic without any infrastructure dependencies:
//! device and key-material models, the device identity deriver, the pairing
//! state machine and the ports that adapters implement.

// Public module exports
pub mod device;
pub mod identity;
pub mod ids;
pub mod pairing;
pub mod ports;
pub mod settings;

// Re-export commonly used types at the crate root
pub use device::{
    AccountEntry, AccountsMetadata, ApplicationContext, Asset, DeviceClass, DeviceInfo,
    ExtendedPublicKey, RegisteredDevice,
};
pub use identity::{derive_device_id, IdentityError};
pub use ids::DeviceId;
pub use pairing::{
    FailureKind, PairingAction, PairingEvent, PairingFailure, PairingPolicy, PairingStage,
    PairingStateMachine, PairingStep,
};
pub use settings::{LockboxSettings, LoggingSettings, PairingSettings, RegistrySettings};
