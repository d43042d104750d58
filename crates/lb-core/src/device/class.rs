use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Physical device family, fixed at discovery time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Ledger,
    Blockchain,
}

impl DeviceClass {
    /// Every supported family, in discovery race order.
    pub const ALL: [DeviceClass; 2] = [DeviceClass::Ledger, DeviceClass::Blockchain];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Ledger => "ledger",
            DeviceClass::Blockchain => "blockchain",
        }
    }
}

impl Display for DeviceClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// On-device application that must be open for a channel to be usable.
///
/// A channel is bound to exactly one context. Switching the app on the
/// device invalidates any channel opened for the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationContext {
    Dashboard,
    Btc,
    Bch,
    Eth,
}

impl ApplicationContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationContext::Dashboard => "dashboard",
            ApplicationContext::Btc => "btc",
            ApplicationContext::Bch => "bch",
            ApplicationContext::Eth => "eth",
        }
    }
}

impl Display for ApplicationContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Currencies whose accounts are derived from a lockbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Asset {
    Btc,
    Bch,
    Eth,
}

impl Asset {
    pub const ALL: [Asset; 3] = [Asset::Btc, Asset::Bch, Asset::Eth];

    /// Asset whose key material identifies the device.
    pub const REFERENCE: Asset = Asset::Btc;

    /// BIP44 account derivation path.
    pub fn account_path(&self) -> &'static str {
        match self {
            Asset::Btc => "44'/0'/0'",
            Asset::Bch => "44'/145'/0'",
            Asset::Eth => "44'/60'/0'/0/0",
        }
    }

    /// Signing application for this asset.
    pub fn signing_context(&self) -> ApplicationContext {
        match self {
            Asset::Btc => ApplicationContext::Btc,
            Asset::Bch => ApplicationContext::Bch,
            Asset::Eth => ApplicationContext::Eth,
        }
    }

    pub fn ticker(&self) -> &'static str {
        match self {
            Asset::Btc => "BTC",
            Asset::Bch => "BCH",
            Asset::Eth => "ETH",
        }
    }
}

impl Display for Asset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.ticker())
    }
}
