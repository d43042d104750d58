//! Lockbox pairing state machine
//!
//! Drives the new-device setup wizard. The machine is pure: it never talks
//! to the transport, the registry or the sinks. Every side effect is
//! returned as a [`PairingAction`] for the orchestrator to execute, and the
//! outcome of that action comes back as the next [`PairingEvent`].
//!
//! ```text
//! Idle
//!   └─Start─> AwaitingDashboardContext          (race all device classes)
//!               └─DashboardConnected─> AwaitingSigningContext
//!                    └─SigningConnected─> DerivingIdentity
//!                         └─IdentityDerived─> CheckingDuplicate
//!                              ├─exists──> DuplicateDevice
//!                              └─absent──> NamingDevice
//!                                            └─NameProvided─> Saving
//!                                                  └─Saved─> Done
//!
//! any active step ──StepFailed / Cancel──> Failed
//! ```
//!
//! `Done` and `Failed` are terminal for a run; only an explicit `Start`
//! begins a new one.

use std::fmt::{Display, Formatter};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::device::{ApplicationContext, Asset, DeviceClass};
use crate::ids::DeviceId;
use crate::pairing::{FailureKind, PairingFailure};
use crate::ports::notification::{Notice, NoticeLevel};
use crate::settings::PairingSettings;

/// Wizard step, as shown to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum PairingStep {
    /// No setup in progress.
    Idle,
    /// Waiting for any supported device to show its dashboard.
    AwaitingDashboardContext,
    /// Device found; waiting for the signing app to be opened.
    AwaitingSigningContext { device_class: DeviceClass },
    /// Reading key material and computing the identity.
    DerivingIdentity { device_class: DeviceClass },
    /// Looking the identity up in the registry.
    CheckingDuplicate {
        device_class: DeviceClass,
        device_id: DeviceId,
    },
    /// The device is already registered. The user aborts or views it.
    DuplicateDevice {
        device_class: DeviceClass,
        device_id: DeviceId,
    },
    /// Waiting for the user to name the new device.
    NamingDevice {
        device_class: DeviceClass,
        device_id: DeviceId,
    },
    /// Writing the record through the registry.
    Saving {
        device_class: DeviceClass,
        device_id: DeviceId,
        device_name: String,
    },
    /// Device registered (terminal).
    Done { device_id: DeviceId },
    /// Run failed (terminal).
    Failed { failure: PairingFailure },
}

/// Field-less tag of a [`PairingStep`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingStage {
    Idle,
    AwaitingDashboardContext,
    AwaitingSigningContext,
    DerivingIdentity,
    CheckingDuplicate,
    DuplicateDevice,
    NamingDevice,
    Saving,
    Done,
    Failed,
}

impl PairingStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PairingStage::Idle => "idle",
            PairingStage::AwaitingDashboardContext => "awaiting_dashboard_context",
            PairingStage::AwaitingSigningContext => "awaiting_signing_context",
            PairingStage::DerivingIdentity => "deriving_identity",
            PairingStage::CheckingDuplicate => "checking_duplicate",
            PairingStage::DuplicateDevice => "duplicate_device",
            PairingStage::NamingDevice => "naming_device",
            PairingStage::Saving => "saving",
            PairingStage::Done => "done",
            PairingStage::Failed => "failed",
        }
    }
}

impl Display for PairingStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PairingStep {
    pub fn stage(&self) -> PairingStage {
        match self {
            PairingStep::Idle => PairingStage::Idle,
            PairingStep::AwaitingDashboardContext => PairingStage::AwaitingDashboardContext,
            PairingStep::AwaitingSigningContext { .. } => PairingStage::AwaitingSigningContext,
            PairingStep::DerivingIdentity { .. } => PairingStage::DerivingIdentity,
            PairingStep::CheckingDuplicate { .. } => PairingStage::CheckingDuplicate,
            PairingStep::DuplicateDevice { .. } => PairingStage::DuplicateDevice,
            PairingStep::NamingDevice { .. } => PairingStage::NamingDevice,
            PairingStep::Saving { .. } => PairingStage::Saving,
            PairingStep::Done { .. } => PairingStage::Done,
            PairingStep::Failed { .. } => PairingStage::Failed,
        }
    }

    /// `Done` or `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PairingStep::Done { .. } | PairingStep::Failed { .. })
    }

    /// A run is in progress and can still fail or be cancelled.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
            && !matches!(self, PairingStep::Idle | PairingStep::DuplicateDevice { .. })
    }
}

/// Events that drive the pairing wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairingEvent {
    /// User starts (or restarts) the setup wizard.
    Start,
    /// A device class answered in the dashboard context.
    DashboardConnected { device_class: DeviceClass },
    /// The signing app answered on the discovered device.
    SigningConnected,
    /// Key material was read and hashed.
    IdentityDerived { device_id: DeviceId },
    /// Registry lookup for the candidate identity finished.
    DuplicateChecked { exists: bool },
    /// User entered a display name.
    NameProvided { device_name: String },
    /// Registry write succeeded.
    Saved,
    /// The action of the current step failed.
    StepFailed { kind: FailureKind, message: String },
    /// User abandoned the wizard.
    Cancel,
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairingAction {
    /// Race every candidate class until one opens `context`.
    AwaitDashboard {
        candidates: Vec<DeviceClass>,
        context: ApplicationContext,
        timeout: Duration,
    },
    /// Close the dashboard channel and poll the known class for `context`.
    AwaitSigning {
        device_class: DeviceClass,
        context: ApplicationContext,
        timeout: Duration,
    },
    /// Read key material over the signing channel and derive the identity.
    DeriveIdentity,
    /// Close the session's channel, if any.
    ReleaseChannel,
    /// Look `device_id` up in the registry.
    CheckDuplicate { device_id: DeviceId },
    /// Re-check and write the new device record.
    SaveDevice {
        device_id: DeviceId,
        device_class: DeviceClass,
        device_name: String,
    },
    /// Ask data fetchers to load balances and transactions.
    RefreshDeviceData,
    /// Close the channel and drop captured key material.
    DiscardSession,
    /// Surface a message to the user.
    Notify { level: NoticeLevel, notice: Notice },
    /// Report a failure to the error log sink.
    LogError { operation: String, cause: String },
}

/// Timeouts and contexts used by the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingPolicy {
    /// Bound for discovering the device in dashboard mode.
    pub setup_timeout: Duration,
    /// Bound for the signing app to be opened once the device is known.
    pub signing_timeout: Duration,
    /// Bound for reading key material once the signing app is open.
    pub request_timeout: Duration,
    /// Asset whose app provides the key material.
    pub reference_asset: Asset,
}

impl Default for PairingPolicy {
    fn default() -> Self {
        Self::from_settings(&PairingSettings::default())
    }
}

impl PairingPolicy {
    pub fn from_settings(settings: &PairingSettings) -> Self {
        Self {
            setup_timeout: settings.setup_timeout(),
            signing_timeout: settings.signing_timeout(),
            request_timeout: settings.request_timeout(),
            reference_asset: Asset::REFERENCE,
        }
    }
}

const OPERATION_SETUP: &str = "initialize_new_device_setup";
const OPERATION_SAVE: &str = "save_new_device";

/// Pure pairing state machine.
#[derive(Debug, Clone)]
pub struct PairingStateMachine {
    policy: PairingPolicy,
}

impl Default for PairingStateMachine {
    fn default() -> Self {
        Self::new(PairingPolicy::default())
    }
}

impl PairingStateMachine {
    pub fn new(policy: PairingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PairingPolicy {
        &self.policy
    }

    pub fn transition(
        &self,
        step: PairingStep,
        event: PairingEvent,
    ) -> (PairingStep, Vec<PairingAction>) {
        match (step, event) {
            // ===== Start / restart =====
            (
                PairingStep::Idle
                | PairingStep::DuplicateDevice { .. }
                | PairingStep::Done { .. }
                | PairingStep::Failed { .. },
                PairingEvent::Start,
            ) => (
                PairingStep::AwaitingDashboardContext,
                vec![
                    PairingAction::DiscardSession,
                    PairingAction::AwaitDashboard {
                        candidates: DeviceClass::ALL.to_vec(),
                        context: ApplicationContext::Dashboard,
                        timeout: self.policy.setup_timeout,
                    },
                ],
            ),

            // ===== Discovery =====
            (
                PairingStep::AwaitingDashboardContext,
                PairingEvent::DashboardConnected { device_class },
            ) => (
                PairingStep::AwaitingSigningContext { device_class },
                vec![PairingAction::AwaitSigning {
                    device_class,
                    context: self.policy.reference_asset.signing_context(),
                    timeout: self.policy.signing_timeout,
                }],
            ),
            (PairingStep::AwaitingSigningContext { device_class }, PairingEvent::SigningConnected) => (
                PairingStep::DerivingIdentity { device_class },
                vec![PairingAction::DeriveIdentity],
            ),

            // ===== Identity and duplicate check =====
            (
                PairingStep::DerivingIdentity { device_class },
                PairingEvent::IdentityDerived { device_id },
            ) => (
                PairingStep::CheckingDuplicate {
                    device_class,
                    device_id: device_id.clone(),
                },
                vec![
                    PairingAction::ReleaseChannel,
                    PairingAction::CheckDuplicate { device_id },
                ],
            ),
            (
                PairingStep::CheckingDuplicate {
                    device_class,
                    device_id,
                },
                PairingEvent::DuplicateChecked { exists },
            ) => {
                if exists {
                    (
                        PairingStep::DuplicateDevice {
                            device_class,
                            device_id,
                        },
                        vec![PairingAction::DiscardSession],
                    )
                } else {
                    (
                        PairingStep::NamingDevice {
                            device_class,
                            device_id,
                        },
                        Vec::new(),
                    )
                }
            }
            (PairingStep::DuplicateDevice { .. }, PairingEvent::Cancel) => {
                (PairingStep::Idle, vec![PairingAction::DiscardSession])
            }

            // ===== Naming and persistence =====
            (
                PairingStep::NamingDevice {
                    device_class,
                    device_id,
                },
                PairingEvent::NameProvided { device_name },
            ) => (
                PairingStep::Saving {
                    device_class,
                    device_id: device_id.clone(),
                    device_name: device_name.clone(),
                },
                vec![PairingAction::SaveDevice {
                    device_id,
                    device_class,
                    device_name,
                }],
            ),
            (PairingStep::Saving { device_id, .. }, PairingEvent::Saved) => (
                PairingStep::Done { device_id },
                vec![
                    PairingAction::DiscardSession,
                    PairingAction::RefreshDeviceData,
                    PairingAction::Notify {
                        level: NoticeLevel::Success,
                        notice: Notice::LockboxSetupSuccess,
                    },
                ],
            ),
            (
                PairingStep::Saving {
                    device_class,
                    device_id,
                    ..
                },
                PairingEvent::DuplicateChecked { exists: true },
            ) => (
                PairingStep::DuplicateDevice {
                    device_class,
                    device_id,
                },
                vec![PairingAction::DiscardSession],
            ),

            // ===== Failure / cancellation =====
            (step, PairingEvent::StepFailed { kind, message }) if step.is_active() => {
                Self::fail(step.stage(), kind, message)
            }
            (step, PairingEvent::Cancel) if step.is_active() => Self::fail(
                step.stage(),
                FailureKind::Cancelled,
                "pairing cancelled by user".to_string(),
            ),

            // ===== Terminal / nothing to cancel =====
            (PairingStep::Idle, PairingEvent::Cancel) => (PairingStep::Idle, Vec::new()),
            (step @ PairingStep::Done { .. }, _) => (step, Vec::new()),
            (step @ PairingStep::Failed { .. }, _) => (step, Vec::new()),

            // ===== Invalid =====
            (step, event) => {
                warn!(?step, ?event, "invalid pairing transition");
                (step, Vec::new())
            }
        }
    }

    fn fail(
        stage: PairingStage,
        kind: FailureKind,
        message: String,
    ) -> (PairingStep, Vec<PairingAction>) {
        let notice = match (stage, kind) {
            (_, FailureKind::Timeout) => Notice::LockboxSetupTimeout,
            (_, FailureKind::Cancelled) => Notice::LockboxSetupCancelled,
            // The device is paired but not stored: do not ask for a new pairing.
            (PairingStage::Saving, FailureKind::RegistryUnavailable) => Notice::LockboxSaveError,
            _ => Notice::LockboxSetupError,
        };
        let operation = if stage == PairingStage::Saving {
            OPERATION_SAVE
        } else {
            OPERATION_SETUP
        };
        let failure = PairingFailure {
            stage,
            kind,
            message,
        };
        let cause = failure.to_string();

        (
            PairingStep::Failed { failure },
            vec![
                PairingAction::DiscardSession,
                PairingAction::Notify {
                    level: NoticeLevel::Error,
                    notice,
                },
                PairingAction::LogError {
                    operation: operation.to_string(),
                    cause,
                },
            ],
        )
    }
}
