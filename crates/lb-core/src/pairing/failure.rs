use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::pairing::PairingStage;

/// Error kinds a pairing step or session call can end with.
///
/// Finding an already registered device is not a failure: it is the
/// `DuplicateDevice` step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    TransportOpenFailed,
    TransportRequestFailed,
    Timeout,
    Cancelled,
    InvalidKeyMaterial,
    RegistryUnavailable,
    UnknownDevice,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::TransportOpenFailed => "transport_open_failed",
            FailureKind::TransportRequestFailed => "transport_request_failed",
            FailureKind::Timeout => "timeout",
            FailureKind::Cancelled => "cancelled",
            FailureKind::InvalidKeyMaterial => "invalid_key_material",
            FailureKind::RegistryUnavailable => "registry_unavailable",
            FailureKind::UnknownDevice => "unknown_device",
        }
    }
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cause captured by the `Failed` step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingFailure {
    /// Step that was active when the failure happened.
    pub stage: PairingStage,
    pub kind: FailureKind,
    pub message: String,
}

impl Display for PairingFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} during {}: {}", self.kind, self.stage, self.message)
    }
}
