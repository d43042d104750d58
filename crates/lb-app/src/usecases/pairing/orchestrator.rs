//! Pairing orchestrator.
//!
//! Drives [`PairingStateMachine`] and executes the actions it returns. An
//! action's outcome is fed back as the next event, so a single `start`
//! call runs discovery, identity derivation and the duplicate check back
//! to back, stopping at the first step that needs the user.

use std::sync::Arc;

use chrono::Utc;
use lb_core::pairing::LOG_LOCATION;
use lb_core::ports::{
    DeviceRegistryPort, ErrorLogPort, NoticeLevel, NotificationPort, PairingEventPort,
    PairingWorkflowEvent,
};
use lb_core::{
    DeviceClass, DeviceId, DeviceInfo, FailureKind, PairingAction, PairingEvent, PairingStage,
    PairingStateMachine, PairingStep, RegisteredDevice,
};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::usecases::connection::{
    cancel_signal, CancelHandle, CancelSignal, Connection, ConnectionPoller, DeviceInfoReader,
};
use crate::usecases::pairing::context::PairingContext;
use crate::usecases::refresh::RefreshDeviceData;

/// Misuse of the wizard API. Workflow failures are reported through the
/// `Failed` step instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PairingOrchestratorError {
    #[error("cannot {operation} while pairing is in step {actual}")]
    UnexpectedStep {
        operation: &'static str,
        actual: PairingStage,
    },
    #[error("device name must not be empty")]
    EmptyDeviceName,
}

/// Collaborators of the orchestrator.
pub struct PairingDeps {
    pub poller: Arc<ConnectionPoller>,
    pub registry: Arc<dyn DeviceRegistryPort>,
    pub refresh: Arc<RefreshDeviceData>,
    pub notifier: Arc<dyn NotificationPort>,
    pub error_log: Arc<dyn ErrorLogPort>,
    pub event_port: Arc<dyn PairingEventPort>,
}

/// Per-run state. Dropped on done, failure, cancellation or restart.
#[derive(Default)]
struct PairingSession {
    run_id: Option<Uuid>,
    connection: Option<Connection>,
    device_info: Option<DeviceInfo>,
}

struct RunControl {
    handle: CancelHandle,
    signal: CancelSignal,
}

impl RunControl {
    fn fresh() -> Self {
        let (handle, signal) = cancel_signal();
        Self { handle, signal }
    }
}

pub struct PairingOrchestrator {
    context: Arc<PairingContext>,
    machine: PairingStateMachine,
    session: Mutex<PairingSession>,
    run: Mutex<RunControl>,
    deps: PairingDeps,
    event_senders: Arc<Mutex<Vec<mpsc::Sender<PairingWorkflowEvent>>>>,
}

const CANCELLED_MESSAGE: &str = "pairing cancelled by user";

impl PairingOrchestrator {
    pub fn new(machine: PairingStateMachine, deps: PairingDeps) -> Self {
        Self {
            context: PairingContext::default().arc(),
            machine,
            session: Mutex::new(PairingSession::default()),
            run: Mutex::new(RunControl::fresh()),
            deps,
            event_senders: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Start (or restart) the wizard. Runs until the device is named,
    /// found to be a duplicate, or the run fails.
    pub async fn start(&self) -> Result<PairingStep, PairingOrchestratorError> {
        let _dispatch_guard = self.context.acquire_dispatch_lock().await;
        let current = self.context.get_step().await;
        if current.is_active() {
            return Err(PairingOrchestratorError::UnexpectedStep {
                operation: "start pairing",
                actual: current.stage(),
            });
        }

        *self.run.lock().await = RunControl::fresh();
        let run_id = Uuid::new_v4();
        self.session.lock().await.run_id = Some(run_id);
        info!(%run_id, "starting lockbox setup");

        Ok(self.run_events(PairingEvent::Start).await)
    }

    /// Name the discovered device and save it.
    pub async fn provide_device_name(
        &self,
        device_name: &str,
    ) -> Result<PairingStep, PairingOrchestratorError> {
        let device_name = device_name.trim();
        if device_name.is_empty() {
            return Err(PairingOrchestratorError::EmptyDeviceName);
        }
        let _dispatch_guard = self.context.acquire_dispatch_lock().await;
        let current = self.context.get_step().await;
        if current.stage() != PairingStage::NamingDevice {
            return Err(PairingOrchestratorError::UnexpectedStep {
                operation: "name the device",
                actual: current.stage(),
            });
        }

        Ok(self
            .run_events(PairingEvent::NameProvided {
                device_name: device_name.to_string(),
            })
            .await)
    }

    /// Abandon the run. In-flight device work is aborted first, then the
    /// cancellation is applied once that dispatch has finished.
    pub async fn cancel(&self) -> PairingStep {
        self.run.lock().await.handle.cancel();
        self.dispatch(PairingEvent::Cancel).await
    }

    pub async fn current_step(&self) -> PairingStep {
        self.context.get_step().await
    }

    /// Workflow events for a listener. A listener that stops reading misses
    /// events once its buffer is full; the wizard never waits for it.
    pub async fn subscribe(&self) -> mpsc::Receiver<PairingWorkflowEvent> {
        let (event_tx, event_rx) = mpsc::channel(100);
        self.event_senders.lock().await.push(event_tx);
        event_rx
    }

    async fn dispatch(&self, event: PairingEvent) -> PairingStep {
        let _dispatch_guard = self.context.acquire_dispatch_lock().await;
        self.run_events(event).await
    }

    /// Caller holds the dispatch lock.
    async fn run_events(&self, event: PairingEvent) -> PairingStep {
        let span = info_span!("usecase.pairing_orchestrator.dispatch", event = ?event);
        async {
            let mut current = self.context.get_step().await;
            let mut pending_events = vec![event];

            while let Some(event) = pending_events.pop() {
                let from = current.clone();
                let event_name = format!("{:?}", event);
                let (next, actions) = self.machine.transition(current, event);
                info!(
                    from = %from.stage(),
                    to = %next.stage(),
                    event = %event_name,
                    "pairing step transition"
                );
                if next != from {
                    self.set_step_and_emit(next.clone()).await;
                }
                let follow_up_events = self.execute_actions(actions).await;
                current = next;
                pending_events.extend(follow_up_events);
            }

            current
        }
        .instrument(span)
        .await
    }

    async fn execute_actions(&self, actions: Vec<PairingAction>) -> Vec<PairingEvent> {
        let mut follow_up_events = Vec::new();
        for action in actions {
            debug!(?action, "pairing executing action");
            if Self::is_device_work(&action) && self.run_signal().await.is_cancelled() {
                follow_up_events.push(Self::cancelled());
                break;
            }

            match action {
                PairingAction::AwaitDashboard {
                    candidates,
                    context,
                    timeout,
                } => {
                    let signal = self.run_signal().await;
                    match self
                        .deps
                        .poller
                        .await_connection(&candidates, context, timeout, &signal)
                        .await
                    {
                        Ok(connection) => {
                            let device_class = connection.device_class();
                            self.hold_connection(connection).await;
                            follow_up_events.push(PairingEvent::DashboardConnected { device_class });
                        }
                        Err(err) => follow_up_events.push(Self::failed(err.failure_kind(), &err)),
                    }
                }
                PairingAction::AwaitSigning {
                    device_class,
                    context,
                    timeout,
                } => {
                    // A channel is valid for one context only.
                    self.release_connection().await;
                    let signal = self.run_signal().await;
                    match self
                        .deps
                        .poller
                        .await_connection(&[device_class], context, timeout, &signal)
                        .await
                    {
                        Ok(connection) => {
                            self.hold_connection(connection).await;
                            follow_up_events.push(PairingEvent::SigningConnected);
                        }
                        Err(err) => follow_up_events.push(Self::failed(err.failure_kind(), &err)),
                    }
                }
                PairingAction::DeriveIdentity => {
                    follow_up_events.push(self.derive_identity().await);
                }
                PairingAction::ReleaseChannel => {
                    self.release_connection().await;
                }
                PairingAction::CheckDuplicate { device_id } => {
                    follow_up_events.push(match self.deps.registry.get(&device_id).await {
                        Ok(existing) => {
                            if existing.is_some() {
                                info!(%device_id, "lockbox already registered");
                            }
                            PairingEvent::DuplicateChecked {
                                exists: existing.is_some(),
                            }
                        }
                        Err(err) => Self::failed(FailureKind::RegistryUnavailable, &err),
                    });
                }
                PairingAction::SaveDevice {
                    device_id,
                    device_class,
                    device_name,
                } => {
                    follow_up_events.push(
                        self.save_device(device_id, device_class, device_name)
                            .await,
                    );
                }
                PairingAction::RefreshDeviceData => {
                    self.deps.refresh.after_device_added().await;
                }
                PairingAction::DiscardSession => {
                    self.discard_session().await;
                }
                PairingAction::Notify { level, notice } => match level {
                    NoticeLevel::Success => self.deps.notifier.notify_success(notice).await,
                    NoticeLevel::Error => self.deps.notifier.notify_error(notice).await,
                },
                PairingAction::LogError { operation, cause } => {
                    warn!(%operation, %cause, "lockbox setup failed");
                    self.deps
                        .error_log
                        .log_error(LOG_LOCATION, &operation, &cause)
                        .await;
                }
            }
        }

        follow_up_events
    }

    /// Actions that talk to the device or the registry for the current run.
    fn is_device_work(action: &PairingAction) -> bool {
        matches!(
            action,
            PairingAction::AwaitDashboard { .. }
                | PairingAction::AwaitSigning { .. }
                | PairingAction::DeriveIdentity
                | PairingAction::CheckDuplicate { .. }
                | PairingAction::SaveDevice { .. }
        )
    }

    /// Reads the key material, bounded by the request timeout and the run's
    /// cancel signal.
    async fn derive_identity(&self) -> PairingEvent {
        let signal = self.run_signal().await;
        let request_timeout = self.machine.policy().request_timeout;
        let mut session = self.session.lock().await;
        let Some(connection) = session.connection.as_ref() else {
            return PairingEvent::StepFailed {
                kind: FailureKind::TransportRequestFailed,
                message: "no open channel to read key material from".to_string(),
            };
        };

        let read = tokio::select! {
            biased;
            _ = signal.cancelled() => return Self::cancelled(),
            _ = tokio::time::sleep(request_timeout) => {
                return PairingEvent::StepFailed {
                    kind: FailureKind::Timeout,
                    message: format!(
                        "device did not return key material within {}ms",
                        request_timeout.as_millis()
                    ),
                };
            }
            read = DeviceInfoReader::read(connection) => read,
        };
        let info = match read {
            Ok(info) => info,
            Err(err) => return Self::failed(err.failure_kind(), &err),
        };
        match info.device_id() {
            Ok(device_id) => {
                info!(%device_id, "lockbox identity derived");
                session.device_info = Some(info);
                PairingEvent::IdentityDerived { device_id }
            }
            Err(err) => Self::failed(FailureKind::InvalidKeyMaterial, &err),
        }
    }

    async fn save_device(
        &self,
        device_id: DeviceId,
        device_class: DeviceClass,
        device_name: String,
    ) -> PairingEvent {
        // Another wizard may have stored the same device since the check.
        match self.deps.registry.get(&device_id).await {
            Ok(Some(_)) => {
                warn!(%device_id, "lockbox registered by another run before save");
                return PairingEvent::DuplicateChecked { exists: true };
            }
            Ok(None) => {}
            Err(err) => return Self::failed(FailureKind::RegistryUnavailable, &err),
        }

        let record = {
            let session = self.session.lock().await;
            match session.device_info.as_ref() {
                Some(info) => RegisteredDevice::from_pairing(
                    device_id.clone(),
                    device_class,
                    device_name,
                    info,
                    Utc::now(),
                ),
                None => {
                    return PairingEvent::StepFailed {
                        kind: FailureKind::InvalidKeyMaterial,
                        message: "key material is no longer held by the pairing session"
                            .to_string(),
                    }
                }
            }
        };

        match self.deps.registry.put(record).await {
            Ok(()) => {
                info!(%device_id, %device_class, "lockbox registered");
                PairingEvent::Saved
            }
            Err(err) => Self::failed(FailureKind::RegistryUnavailable, &err),
        }
    }

    fn cancelled() -> PairingEvent {
        PairingEvent::StepFailed {
            kind: FailureKind::Cancelled,
            message: CANCELLED_MESSAGE.to_string(),
        }
    }

    fn failed(kind: FailureKind, err: &dyn std::fmt::Display) -> PairingEvent {
        PairingEvent::StepFailed {
            kind,
            message: err.to_string(),
        }
    }

    async fn run_signal(&self) -> CancelSignal {
        self.run.lock().await.signal.clone()
    }

    async fn hold_connection(&self, connection: Connection) {
        let previous = self.session.lock().await.connection.replace(connection);
        if let Some(previous) = previous {
            previous.close().await;
        }
    }

    async fn release_connection(&self) {
        let connection = self.session.lock().await.connection.take();
        if let Some(connection) = connection {
            connection.close().await;
        }
    }

    async fn discard_session(&self) {
        let (connection, run_id) = {
            let mut session = self.session.lock().await;
            session.device_info = None;
            (session.connection.take(), session.run_id)
        };
        if let Some(connection) = connection {
            connection.close().await;
        }
        debug!(run_id = ?run_id, "pairing session discarded");
    }

    async fn set_step_and_emit(&self, step: PairingStep) {
        self.context.set_step(step.clone()).await;
        let event = PairingWorkflowEvent::StepChanged { step };
        self.deps.event_port.emit(event.clone()).await;

        // Never await a listener while the dispatch lock is held.
        self.event_senders
            .lock()
            .await
            .retain(|sender| match sender.try_send(event.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    warn!("pairing workflow listener is not reading, event dropped");
                    true
                }
                Err(TrySendError::Closed(_)) => {
                    debug!("pairing workflow event receiver dropped");
                    false
                }
            });
    }
}
