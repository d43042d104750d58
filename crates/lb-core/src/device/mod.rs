//! Lockbox device domain models.

mod class;
mod key_material;
mod registered;

pub use class::{ApplicationContext, Asset, DeviceClass};
pub use key_material::{DeviceInfo, ExtendedPublicKey};
pub use registered::{AccountEntry, AccountsMetadata, RegisteredDevice};
