//! Device identity derivation.
//!
//! A lockbox is identified by a digest of its reference account key, so the
//! same physical device always maps to the same registry entry.

mod deriver;

pub use deriver::{derive_device_id, IdentityError};
