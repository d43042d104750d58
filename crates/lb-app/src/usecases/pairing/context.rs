use std::sync::Arc;

use lb_core::PairingStep;
use tokio::sync::Mutex;

/// Shared wizard context: current step plus the dispatch lock.
///
/// ## Lock Ordering
/// When acquiring both locks, acquire `dispatch_lock` first, then `step`.
/// - `dispatch_lock`: held for a whole dispatch, including the actions it runs.
/// - `step`: short reads and writes only.
#[derive(Clone)]
pub struct PairingContext {
    step: Arc<Mutex<PairingStep>>,
    dispatch_lock: Arc<Mutex<()>>,
}

impl Default for PairingContext {
    fn default() -> Self {
        Self::new(PairingStep::Idle)
    }
}

impl PairingContext {
    pub fn new(initial: PairingStep) -> Self {
        Self {
            step: Arc::new(Mutex::new(initial)),
            dispatch_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Does not wait for an in-flight dispatch.
    pub async fn get_step(&self) -> PairingStep {
        self.step.lock().await.clone()
    }

    pub async fn acquire_dispatch_lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.dispatch_lock.lock().await
    }

    /// Only call while holding the dispatch lock.
    pub async fn set_step(&self, step: PairingStep) {
        *self.step.lock().await = step;
    }
}
