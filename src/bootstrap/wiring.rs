//! # Dependency wiring
//!
//! Assembles the lockbox use cases from host-supplied ports and the
//! configured registry adapter. No decisions are made here: everything the
//! runtime does is driven by the use cases in `lb-app`.
//!
//! This is the only place that depends on `lb-app` and `lb-infra` at once.

use std::sync::Arc;

use lb_app::{
    ConnectionPoller, DeleteDevice, DeviceRegistry, PairingDeps, PairingOrchestrator,
    RefreshDeviceData, SessionManager, UpdateDeviceBalanceDisplay, UpdateDeviceName,
};
use lb_core::ports::{
    DataFetchPort, DeviceRegistryPort, ErrorLogPort, NotificationPort, PairingEventPort,
    SessionEventPort, TransportPort,
};
use lb_core::{LockboxSettings, PairingPolicy, PairingStateMachine};
use lb_infra::{JsonFileDeviceRegistry, TracingErrorLog, TracingEventLog, TracingNotifier};
use tracing::info;

pub type WiringResult<T> = Result<T, WiringError>;

/// Errors while assembling the runtime.
#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    #[error("Registry initialization failed: {0}")]
    RegistryInit(String),
}

/// Ports the host provides.
///
/// Only the transport and the wallet data fetcher are mandatory. Sinks
/// default to the `tracing` adapters from `lb-infra`; the registry defaults
/// to the JSON file at the configured path.
pub struct LockboxDeps {
    pub transport: Arc<dyn TransportPort>,
    pub data_fetcher: Arc<dyn DataFetchPort>,
    pub notifier: Option<Arc<dyn NotificationPort>>,
    pub error_log: Option<Arc<dyn ErrorLogPort>>,
    pub pairing_events: Option<Arc<dyn PairingEventPort>>,
    pub session_events: Option<Arc<dyn SessionEventPort>>,
    pub registry: Option<Arc<dyn DeviceRegistryPort>>,
}

impl LockboxDeps {
    pub fn new(transport: Arc<dyn TransportPort>, data_fetcher: Arc<dyn DataFetchPort>) -> Self {
        Self {
            transport,
            data_fetcher,
            notifier: None,
            error_log: None,
            pairing_events: None,
            session_events: None,
            registry: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationPort>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_error_log(mut self, error_log: Arc<dyn ErrorLogPort>) -> Self {
        self.error_log = Some(error_log);
        self
    }

    pub fn with_pairing_events(mut self, events: Arc<dyn PairingEventPort>) -> Self {
        self.pairing_events = Some(events);
        self
    }

    pub fn with_session_events(mut self, events: Arc<dyn SessionEventPort>) -> Self {
        self.session_events = Some(events);
        self
    }

    pub fn with_registry(mut self, registry: Arc<dyn DeviceRegistryPort>) -> Self {
        self.registry = Some(registry);
        self
    }
}

/// Everything a host calls into after startup.
pub struct LockboxRuntime {
    pub poller: Arc<ConnectionPoller>,
    pub pairing: Arc<PairingOrchestrator>,
    pub sessions: Arc<SessionManager>,
    pub devices: Arc<DeviceRegistry>,
    pub update_device_name: Arc<UpdateDeviceName>,
    pub update_balance_display: Arc<UpdateDeviceBalanceDisplay>,
    pub delete_device: Arc<DeleteDevice>,
    pub refresh: Arc<RefreshDeviceData>,
}

fn create_registry(
    settings: &LockboxSettings,
    registry: Option<Arc<dyn DeviceRegistryPort>>,
) -> WiringResult<Arc<dyn DeviceRegistryPort>> {
    if let Some(registry) = registry {
        return Ok(registry);
    }

    let path = lb_infra::settings::resolve_registry_path(&settings.registry)
        .map_err(|e| WiringError::RegistryInit(format!("{e:#}")))?;
    info!(path = %path.display(), "using json device registry");
    Ok(Arc::new(JsonFileDeviceRegistry::new(path)))
}

impl LockboxRuntime {
    pub fn build(settings: &LockboxSettings, deps: LockboxDeps) -> WiringResult<Self> {
        let LockboxDeps {
            transport,
            data_fetcher,
            notifier,
            error_log,
            pairing_events,
            session_events,
            registry,
        } = deps;

        let registry_port = create_registry(settings, registry)?;
        let notifier: Arc<dyn NotificationPort> =
            notifier.unwrap_or_else(|| Arc::new(TracingNotifier));
        let error_log: Arc<dyn ErrorLogPort> =
            error_log.unwrap_or_else(|| Arc::new(TracingErrorLog));
        let pairing_events: Arc<dyn PairingEventPort> =
            pairing_events.unwrap_or_else(|| Arc::new(TracingEventLog));
        let session_events: Arc<dyn SessionEventPort> =
            session_events.unwrap_or_else(|| Arc::new(TracingEventLog));

        let poller = Arc::new(ConnectionPoller::new(
            transport,
            settings.pairing.retry_interval(),
        ));
        let refresh = Arc::new(RefreshDeviceData::new(
            registry_port.clone(),
            data_fetcher,
        ));

        let machine = PairingStateMachine::new(PairingPolicy::from_settings(&settings.pairing));
        let pairing = Arc::new(PairingOrchestrator::new(
            machine,
            PairingDeps {
                poller: poller.clone(),
                registry: registry_port.clone(),
                refresh: refresh.clone(),
                notifier: notifier.clone(),
                error_log: error_log.clone(),
                event_port: pairing_events,
            },
        ));

        let sessions = Arc::new(SessionManager::new(
            poller.clone(),
            registry_port.clone(),
            error_log.clone(),
            session_events,
            settings.pairing.reconnect_timeout(),
        ));

        let devices = Arc::new(DeviceRegistry::new(registry_port));
        let update_device_name = Arc::new(UpdateDeviceName::new(
            devices.clone(),
            notifier.clone(),
            error_log.clone(),
        ));
        let update_balance_display = Arc::new(UpdateDeviceBalanceDisplay::new(
            devices.clone(),
            notifier.clone(),
            error_log.clone(),
        ));
        let delete_device = Arc::new(DeleteDevice::new(devices.clone(), notifier, error_log));

        Ok(Self {
            poller,
            pairing,
            sessions,
            devices,
            update_device_name,
            update_balance_display,
            delete_device,
            refresh,
        })
    }
}
