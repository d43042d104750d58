#![allow(dead_code)]

//! Scripted collaborators shared by the integration tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use lb_app::{
    ConnectionPoller, DeviceRegistry, PairingDeps, PairingOrchestrator, RefreshDeviceData,
    SessionManager,
};
use lb_core::ports::{
    DataFetchPort, DeviceRegistryPort, DeviceRequest, DeviceResponse, ErrorLogPort, Notice,
    NotificationPort, PairingEventPort, PairingWorkflowEvent, RegistryError, SessionEvent,
    SessionEventPort, TransportChannel, TransportError, TransportPort,
};
use lb_core::{
    AccountsMetadata, ApplicationContext, Asset, DeviceClass, DeviceId, DeviceInfo,
    ExtendedPublicKey, PairingPolicy, PairingStateMachine, RegisteredDevice,
};
use tokio::time::Instant;

pub const RETRY_INTERVAL: Duration = Duration::from_millis(500);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

// ===== Key material =====

pub fn key(seed: u8) -> ExtendedPublicKey {
    let mut public_key = vec![0x03];
    public_key.extend(std::iter::repeat(seed).take(32));
    ExtendedPublicKey::new(public_key, vec![seed.wrapping_add(1); 32])
}

pub fn device_info(seed: u8) -> DeviceInfo {
    DeviceInfo {
        btc: key(seed),
        bch: key(seed.wrapping_add(10)),
        eth: key(seed.wrapping_add(20)),
    }
}

pub fn registered(device_id: DeviceId, device_type: DeviceClass, name: &str) -> RegisteredDevice {
    RegisteredDevice {
        device_id,
        device_type,
        device_name: name.to_string(),
        accounts: AccountsMetadata::default(),
        show_balances: true,
        paired_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

// ===== Transport =====

/// How a simulated device behaves.
#[derive(Clone)]
pub struct ScriptedDevice {
    pub info: DeviceInfo,
    /// When each application context becomes reachable, measured from the
    /// moment the transport was created. Missing contexts never open.
    pub contexts: HashMap<ApplicationContext, Duration>,
    /// Time an `open` call spends before answering.
    pub open_latency: Duration,
    /// Non-retryable error returned by every `open` call.
    pub hard_failure: Option<TransportError>,
    /// Requests on open channels never answer.
    pub unresponsive: bool,
}

impl ScriptedDevice {
    pub fn new(info: DeviceInfo) -> Self {
        Self {
            info,
            contexts: HashMap::new(),
            open_latency: Duration::ZERO,
            hard_failure: None,
            unresponsive: false,
        }
    }

    pub fn with_context(mut self, context: ApplicationContext, after: Duration) -> Self {
        self.contexts.insert(context, after);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.open_latency = latency;
        self
    }

    pub fn failing_with(mut self, err: TransportError) -> Self {
        self.hard_failure = Some(err);
        self
    }

    /// Opens channels normally, then goes silent on every request.
    pub fn unresponsive(mut self) -> Self {
        self.unresponsive = true;
        self
    }
}

pub struct ScriptedTransport {
    started: Instant,
    devices: Mutex<HashMap<DeviceClass, ScriptedDevice>>,
    open_channels: Arc<AtomicUsize>,
    opened: Mutex<HashMap<DeviceClass, usize>>,
    attempts: Mutex<Vec<(DeviceClass, ApplicationContext)>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            started: Instant::now(),
            devices: Mutex::new(HashMap::new()),
            open_channels: Arc::new(AtomicUsize::new(0)),
            opened: Mutex::new(HashMap::new()),
            attempts: Mutex::new(Vec::new()),
        })
    }

    pub fn attach(&self, class: DeviceClass, device: ScriptedDevice) {
        self.devices.lock().unwrap().insert(class, device);
    }

    /// Channels opened and not closed yet.
    pub fn open_channels(&self) -> usize {
        self.open_channels.load(Ordering::SeqCst)
    }

    /// Channels ever opened for `class`.
    pub fn opened(&self, class: DeviceClass) -> usize {
        self.opened.lock().unwrap().get(&class).copied().unwrap_or(0)
    }

    pub fn attempts(&self, class: DeviceClass) -> usize {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| *c == class)
            .count()
    }
}

#[async_trait]
impl TransportPort for ScriptedTransport {
    async fn open(
        &self,
        class: DeviceClass,
        context: ApplicationContext,
    ) -> Result<Box<dyn TransportChannel>, TransportError> {
        self.attempts.lock().unwrap().push((class, context));
        let device = self.devices.lock().unwrap().get(&class).cloned();
        let Some(device) = device else {
            return Err(TransportError::NotConnected);
        };

        if !device.open_latency.is_zero() {
            tokio::time::sleep(device.open_latency).await;
        }
        if let Some(err) = device.hard_failure {
            return Err(err);
        }

        let elapsed = self.started.elapsed();
        let reachable = |ctx: &ApplicationContext| {
            device
                .contexts
                .get(ctx)
                .map(|after| elapsed >= *after)
                .unwrap_or(false)
        };

        if reachable(&context) {
            self.open_channels.fetch_add(1, Ordering::SeqCst);
            *self.opened.lock().unwrap().entry(class).or_insert(0) += 1;
            return Ok(Box::new(ScriptedChannel {
                info: device.info.clone(),
                unresponsive: device.unresponsive,
                open_channels: self.open_channels.clone(),
                closed: AtomicBool::new(false),
            }));
        }

        if device.contexts.keys().any(|ctx| reachable(ctx)) {
            Err(TransportError::WrongContext { expected: context })
        } else {
            Err(TransportError::NotConnected)
        }
    }
}

struct ScriptedChannel {
    info: DeviceInfo,
    unresponsive: bool,
    open_channels: Arc<AtomicUsize>,
    closed: AtomicBool,
}

#[async_trait]
impl TransportChannel for ScriptedChannel {
    async fn request(&self, request: DeviceRequest) -> Result<DeviceResponse, TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        if self.unresponsive {
            return std::future::pending().await;
        }
        let DeviceRequest::GetExtendedPublicKey { path } = request;
        match Asset::ALL.iter().find(|asset| asset.account_path() == path) {
            Some(asset) => Ok(DeviceResponse::ExtendedPublicKey(
                self.info.key_for(*asset).clone(),
            )),
            None => Ok(DeviceResponse::Status(0x6a82)),
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.open_channels.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

// ===== Registry =====

#[derive(Default)]
pub struct FakeRegistry {
    records: Mutex<BTreeMap<DeviceId, RegisteredDevice>>,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl FakeRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Insert directly, bypassing the write counter.
    pub fn seed(&self, device: RegisteredDevice) {
        self.records
            .lock()
            .unwrap()
            .insert(device.device_id.clone(), device);
    }

    pub fn record(&self, device_id: &DeviceId) -> Option<RegisteredDevice> {
        self.records.lock().unwrap().get(device_id).cloned()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn unavailable() -> RegistryError {
        RegistryError::Unavailable("kv store offline".to_string())
    }
}

#[async_trait]
impl DeviceRegistryPort for FakeRegistry {
    async fn get(&self, device_id: &DeviceId) -> Result<Option<RegisteredDevice>, RegistryError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        Ok(self.record(device_id))
    }

    async fn list(&self) -> Result<Vec<RegisteredDevice>, RegistryError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        Ok(self.records.lock().unwrap().values().cloned().collect())
    }

    async fn put(&self, device: RegisteredDevice) -> Result<(), RegistryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.seed(device);
        Ok(())
    }

    async fn delete(&self, device_id: &DeviceId) -> Result<bool, RegistryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        Ok(self.records.lock().unwrap().remove(device_id).is_some())
    }
}

// ===== Sinks =====

#[derive(Default)]
pub struct Recorder {
    pub successes: Mutex<Vec<Notice>>,
    pub errors: Mutex<Vec<Notice>>,
    pub logs: Mutex<Vec<(String, String, String)>>,
    pub workflow: Mutex<Vec<PairingWorkflowEvent>>,
    pub sessions: Mutex<Vec<SessionEvent>>,
    pub balances: Mutex<Vec<Asset>>,
    pub transactions: Mutex<Vec<(Asset, Vec<String>, bool)>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn errors(&self) -> Vec<Notice> {
        self.errors.lock().unwrap().clone()
    }

    pub fn successes(&self) -> Vec<Notice> {
        self.successes.lock().unwrap().clone()
    }

    pub fn logs(&self) -> Vec<(String, String, String)> {
        self.logs.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationPort for Recorder {
    async fn notify_success(&self, notice: Notice) {
        self.successes.lock().unwrap().push(notice);
    }

    async fn notify_error(&self, notice: Notice) {
        self.errors.lock().unwrap().push(notice);
    }
}

#[async_trait]
impl ErrorLogPort for Recorder {
    async fn log_error(&self, location: &str, operation: &str, cause: &str) {
        self.logs.lock().unwrap().push((
            location.to_string(),
            operation.to_string(),
            cause.to_string(),
        ));
    }
}

#[async_trait]
impl PairingEventPort for Recorder {
    async fn emit(&self, event: PairingWorkflowEvent) {
        self.workflow.lock().unwrap().push(event);
    }
}

#[async_trait]
impl SessionEventPort for Recorder {
    async fn emit(&self, event: SessionEvent) {
        self.sessions.lock().unwrap().push(event);
    }
}

#[async_trait]
impl DataFetchPort for Recorder {
    async fn fetch_balances(&self, asset: Asset) -> anyhow::Result<()> {
        self.balances.lock().unwrap().push(asset);
        Ok(())
    }

    async fn fetch_transactions(
        &self,
        asset: Asset,
        contexts: Vec<String>,
        reset: bool,
    ) -> anyhow::Result<()> {
        self.transactions
            .lock()
            .unwrap()
            .push((asset, contexts, reset));
        Ok(())
    }
}

// ===== Wiring =====

pub struct Harness {
    pub transport: Arc<ScriptedTransport>,
    pub registry: Arc<FakeRegistry>,
    pub recorder: Arc<Recorder>,
    pub poller: Arc<ConnectionPoller>,
    pub orchestrator: Arc<PairingOrchestrator>,
    pub sessions: SessionManager,
    pub devices: DeviceRegistry,
}

impl Harness {
    pub fn new(setup_timeout: Duration, signing_timeout: Duration) -> Self {
        let transport = ScriptedTransport::new();
        let registry = FakeRegistry::new();
        let recorder = Recorder::new();
        let poller = Arc::new(ConnectionPoller::new(transport.clone(), RETRY_INTERVAL));

        let refresh = Arc::new(RefreshDeviceData::new(registry.clone(), recorder.clone()));
        let machine = PairingStateMachine::new(PairingPolicy {
            setup_timeout,
            signing_timeout,
            request_timeout: REQUEST_TIMEOUT,
            reference_asset: Asset::Btc,
        });
        let orchestrator = Arc::new(PairingOrchestrator::new(
            machine,
            PairingDeps {
                poller: poller.clone(),
                registry: registry.clone(),
                refresh,
                notifier: recorder.clone(),
                error_log: recorder.clone(),
                event_port: recorder.clone(),
            },
        ));
        let sessions = SessionManager::new(
            poller.clone(),
            registry.clone(),
            recorder.clone(),
            recorder.clone(),
            Duration::from_secs(60),
        );
        let devices = DeviceRegistry::new(registry.clone());

        Self {
            transport,
            registry,
            recorder,
            poller,
            orchestrator,
            sessions,
            devices,
        }
    }
}
