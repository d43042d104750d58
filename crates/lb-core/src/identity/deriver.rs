//! Identity deriver
//!
//! ```text
//! reference ExtendedPublicKey (BTC account)
//!   └── SHA-256("lockbox-device-id-v1" || public_key || chain_code)
//!         └── lowercase hex -> DeviceId (64 chars)
//! ```

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::device::ExtendedPublicKey;
use crate::ids::DeviceId;

/// Domain separator so the digest never collides with other key hashes.
const DEVICE_ID_DOMAIN: &[u8] = b"lockbox-device-id-v1";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),
}

/// Derive the stable device identity from an account extended public key.
///
/// Pure and deterministic. Malformed material is rejected rather than hashed.
pub fn derive_device_id(key: &ExtendedPublicKey) -> Result<DeviceId, IdentityError> {
    key.validate()?;

    let mut hasher = Sha256::new();
    hasher.update(DEVICE_ID_DOMAIN);
    hasher.update(&key.public_key);
    hasher.update(&key.chain_code);
    let digest = hasher.finalize();

    Ok(DeviceId::new(hex::encode(digest)))
}
