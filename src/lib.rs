//! # lockbox
//!
//! Host-facing entry point: loads `lockbox.toml`, installs the tracing
//! subscriber and assembles the pairing runtime from `lb-app` use cases and
//! `lb-infra` adapters.

pub mod bootstrap;

pub use bootstrap::config::{default_config_path, load_config};
pub use bootstrap::wiring::{LockboxDeps, LockboxRuntime, WiringError};
