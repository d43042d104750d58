//! Default sink adapters that forward to `tracing`.
//!
//! Hosts with a UI replace these with their own toast and event bridges.

use async_trait::async_trait;
use lb_core::ports::{
    ErrorLogPort, Notice, NotificationPort, PairingEventPort, PairingWorkflowEvent, SessionEvent,
    SessionEventPort,
};
use tracing::{error, info};

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl NotificationPort for TracingNotifier {
    async fn notify_success(&self, notice: Notice) {
        info!(notice = %notice, "lockbox notification");
    }

    async fn notify_error(&self, notice: Notice) {
        error!(notice = %notice, "lockbox notification");
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorLog;

#[async_trait]
impl ErrorLogPort for TracingErrorLog {
    async fn log_error(&self, location: &str, operation: &str, cause: &str) {
        error!(location, operation, cause, "lockbox operation failed");
    }
}

/// Logs workflow and session events; used when no listener is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventLog;

#[async_trait]
impl PairingEventPort for TracingEventLog {
    async fn emit(&self, event: PairingWorkflowEvent) {
        match event {
            PairingWorkflowEvent::StepChanged { step } => {
                info!(step = %step.stage(), "lockbox pairing step changed")
            }
        }
    }
}

#[async_trait]
impl SessionEventPort for TracingEventLog {
    async fn emit(&self, event: SessionEvent) {
        match event {
            SessionEvent::DeviceConnected {
                device_id,
                device_class,
                context,
            } => info!(%device_id, %device_class, %context, "lockbox device connected"),
        }
    }
}
