use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::device::{ApplicationContext, DeviceClass};
use crate::ids::DeviceId;
use crate::pairing::PairingStep;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PairingWorkflowEvent {
    StepChanged { step: PairingStep },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    DeviceConnected {
        device_id: DeviceId,
        device_class: DeviceClass,
        context: ApplicationContext,
    },
}

#[async_trait]
pub trait PairingEventPort: Send + Sync {
    async fn emit(&self, event: PairingWorkflowEvent);
}

#[async_trait]
pub trait SessionEventPort: Send + Sync {
    async fn emit(&self, event: SessionEvent);
}
