use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::device::{Asset, DeviceClass, DeviceInfo};
use crate::ids::DeviceId;

/// Wallet account derived from a lockbox, stored with the device record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountEntry {
    pub label: String,
    pub archived: bool,
    pub xpub: String,
}

/// Per-asset account lists of a registered device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountsMetadata {
    #[serde(default)]
    pub btc: Vec<AccountEntry>,
    #[serde(default)]
    pub bch: Vec<AccountEntry>,
    #[serde(default)]
    pub eth: Vec<AccountEntry>,
}

impl AccountsMetadata {
    /// One default account per asset, labelled after the device.
    pub fn from_device_info(info: &DeviceInfo, device_name: &str) -> Self {
        let entry = |asset: Asset| {
            vec![AccountEntry {
                label: format!("{} - {} Wallet", device_name, asset.ticker()),
                archived: false,
                xpub: info.key_for(asset).xpub(),
            }]
        };
        Self {
            btc: entry(Asset::Btc),
            bch: entry(Asset::Bch),
            eth: entry(Asset::Eth),
        }
    }

    pub fn accounts(&self, asset: Asset) -> &[AccountEntry] {
        match asset {
            Asset::Btc => &self.btc,
            Asset::Bch => &self.bch,
            Asset::Eth => &self.eth,
        }
    }

    /// Xpubs of the non-archived accounts for `asset`.
    pub fn active_contexts(&self, asset: Asset) -> Vec<String> {
        self.accounts(asset)
            .iter()
            .filter(|account| !account.archived)
            .map(|account| account.xpub.clone())
            .collect()
    }
}

/// Persisted record of a paired lockbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredDevice {
    pub device_id: DeviceId,
    pub device_type: DeviceClass,
    pub device_name: String,
    #[serde(default)]
    pub accounts: AccountsMetadata,
    #[serde(default = "default_show_balances")]
    pub show_balances: bool,
    pub paired_at: DateTime<Utc>,
}

fn default_show_balances() -> bool {
    true
}

impl RegisteredDevice {
    /// Build the record written at the end of a successful pairing.
    pub fn from_pairing(
        device_id: DeviceId,
        device_type: DeviceClass,
        device_name: String,
        info: &DeviceInfo,
        paired_at: DateTime<Utc>,
    ) -> Self {
        let accounts = AccountsMetadata::from_device_info(info, &device_name);
        Self {
            device_id,
            device_type,
            device_name,
            accounts,
            show_balances: default_show_balances(),
            paired_at,
        }
    }
}
