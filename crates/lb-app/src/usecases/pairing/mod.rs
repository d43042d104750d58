//! Lockbox setup wizard.

mod context;
mod orchestrator;

pub use context::PairingContext;
pub use orchestrator::{PairingDeps, PairingOrchestrator, PairingOrchestratorError};
