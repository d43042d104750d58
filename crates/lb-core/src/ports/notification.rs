use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// User-facing message keys. The host resolves them to localized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Notice {
    LockboxSetupSuccess,
    LockboxSetupError,
    LockboxSetupTimeout,
    LockboxSetupCancelled,
    /// Device paired but the record could not be stored.
    LockboxSaveError,
    LockboxUpdateSuccess,
    LockboxUpdateError,
    LockboxDeleteSuccess,
    LockboxDeleteError,
}

impl Notice {
    pub fn key(&self) -> &'static str {
        match self {
            Notice::LockboxSetupSuccess => "lockboxSetupSuccess",
            Notice::LockboxSetupError => "lockboxSetupError",
            Notice::LockboxSetupTimeout => "lockboxSetupTimeout",
            Notice::LockboxSetupCancelled => "lockboxSetupCancelled",
            Notice::LockboxSaveError => "lockboxSaveError",
            Notice::LockboxUpdateSuccess => "lockboxUpdateSuccess",
            Notice::LockboxUpdateError => "lockboxUpdateError",
            Notice::LockboxDeleteSuccess => "lockboxDeleteSuccess",
            Notice::LockboxDeleteError => "lockboxDeleteError",
        }
    }
}

impl Display for Notice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Fire-and-forget notification sink.
#[async_trait]
pub trait NotificationPort: Send + Sync {
    async fn notify_success(&self, notice: Notice);
    async fn notify_error(&self, notice: Notice);
}
