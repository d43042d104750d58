use serde::{Deserialize, Serialize};

use crate::device::Asset;
use crate::identity::{derive_device_id, IdentityError};
use crate::ids::DeviceId;

/// Account-level extended public key read from a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedPublicKey {
    #[serde(with = "hex::serde")]
    pub public_key: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub chain_code: Vec<u8>,
}

impl ExtendedPublicKey {
    pub const COMPRESSED_KEY_LEN: usize = 33;
    pub const UNCOMPRESSED_KEY_LEN: usize = 65;
    pub const CHAIN_CODE_LEN: usize = 32;

    pub fn new(public_key: Vec<u8>, chain_code: Vec<u8>) -> Self {
        Self {
            public_key,
            chain_code,
        }
    }

    /// Check the SEC1 encoding of the key and the chain code length.
    pub fn validate(&self) -> Result<(), IdentityError> {
        let key_ok = match self.public_key.first() {
            Some(0x02 | 0x03) => self.public_key.len() == Self::COMPRESSED_KEY_LEN,
            Some(0x04) => self.public_key.len() == Self::UNCOMPRESSED_KEY_LEN,
            _ => false,
        };
        if !key_ok {
            return Err(IdentityError::InvalidKeyMaterial(format!(
                "public key must be a SEC1 point (33 or 65 bytes), got {} bytes",
                self.public_key.len()
            )));
        }
        if self.chain_code.len() != Self::CHAIN_CODE_LEN {
            return Err(IdentityError::InvalidKeyMaterial(format!(
                "chain code must be {} bytes, got {}",
                Self::CHAIN_CODE_LEN,
                self.chain_code.len()
            )));
        }
        Ok(())
    }

    /// Account context string used by wallet data fetchers.
    ///
    /// Lowercase hex of `chain_code || public_key`.
    pub fn xpub(&self) -> String {
        let mut bytes = Vec::with_capacity(self.chain_code.len() + self.public_key.len());
        bytes.extend_from_slice(&self.chain_code);
        bytes.extend_from_slice(&self.public_key);
        hex::encode(bytes)
    }
}

/// Key-derivation output gathered during first pairing.
///
/// Held only in pairing-session memory until the device is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub btc: ExtendedPublicKey,
    pub bch: ExtendedPublicKey,
    pub eth: ExtendedPublicKey,
}

impl DeviceInfo {
    pub fn key_for(&self, asset: Asset) -> &ExtendedPublicKey {
        match asset {
            Asset::Btc => &self.btc,
            Asset::Bch => &self.bch,
            Asset::Eth => &self.eth,
        }
    }

    /// Identity of the device, derived from the reference asset's key.
    pub fn device_id(&self) -> Result<DeviceId, IdentityError> {
        derive_device_id(self.key_for(Asset::REFERENCE))
    }
}
