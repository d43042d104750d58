use lb_core::ports::{DeviceRequest, DeviceResponse, TransportError};
use lb_core::{Asset, DeviceInfo, ExtendedPublicKey, FailureKind, IdentityError};
use thiserror::Error;
use tracing::debug;

use super::Connection;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceInfoError {
    #[error("reading {asset} key failed: {source}")]
    TransportRequestFailed {
        asset: Asset,
        #[source]
        source: TransportError,
    },

    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),
}

impl DeviceInfoError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            DeviceInfoError::TransportRequestFailed { .. } => FailureKind::TransportRequestFailed,
            DeviceInfoError::InvalidKeyMaterial(_) => FailureKind::InvalidKeyMaterial,
        }
    }
}

impl From<IdentityError> for DeviceInfoError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidKeyMaterial(reason) => DeviceInfoError::InvalidKeyMaterial(reason),
        }
    }
}

/// Reads the per-asset extended public keys over an open connection.
pub struct DeviceInfoReader;

impl DeviceInfoReader {
    pub async fn read(connection: &Connection) -> Result<DeviceInfo, DeviceInfoError> {
        let btc = Self::read_key(connection, Asset::Btc).await?;
        let bch = Self::read_key(connection, Asset::Bch).await?;
        let eth = Self::read_key(connection, Asset::Eth).await?;
        Ok(DeviceInfo { btc, bch, eth })
    }

    async fn read_key(
        connection: &Connection,
        asset: Asset,
    ) -> Result<ExtendedPublicKey, DeviceInfoError> {
        let path = asset.account_path().to_string();
        let response = connection
            .request(DeviceRequest::GetExtendedPublicKey { path: path.clone() })
            .await
            .map_err(|source| DeviceInfoError::TransportRequestFailed { asset, source })?;

        match response {
            DeviceResponse::ExtendedPublicKey(key) => {
                key.validate()?;
                debug!(%asset, %path, "extended public key read");
                Ok(key)
            }
            DeviceResponse::Status(code) => Err(DeviceInfoError::InvalidKeyMaterial(format!(
                "expected {asset} extended public key, device answered status {code:#06x}"
            ))),
        }
    }
}
