//! Lockbox pairing domain.
//!
//! The pairing wizard is an explicit state machine: a pure transition
//! function `(step, event) -> (step, actions)` that the application layer
//! drives and whose actions it executes.

mod failure;
pub mod state_machine;

pub use failure::{FailureKind, PairingFailure};
pub use state_machine::{
    PairingAction, PairingEvent, PairingPolicy, PairingStage, PairingStateMachine, PairingStep,
};

/// Location reported to the error log sink for pairing failures.
pub const LOG_LOCATION: &str = "components/lockbox/pairing";
