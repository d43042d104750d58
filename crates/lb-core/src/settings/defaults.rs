use super::model::*;

pub const DEFAULT_SETUP_TIMEOUT_MS: u64 = 1_500_000; // 25 minutes
pub const DEFAULT_SIGNING_TIMEOUT_MS: u64 = 300_000; // 5 minutes
pub const DEFAULT_RECONNECT_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 500;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

impl Default for PairingSettings {
    fn default() -> Self {
        Self {
            setup_timeout_ms: DEFAULT_SETUP_TIMEOUT_MS,
            signing_timeout_ms: DEFAULT_SIGNING_TIMEOUT_MS,
            reconnect_timeout_ms: DEFAULT_RECONNECT_TIMEOUT_MS,
            retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file_logging: true,
            directory: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let settings: LockboxSettings =
            serde_json::from_str(r#"{ "pairing": { "retry_interval_ms": 250 } }"#).unwrap();

        assert_eq!(settings.pairing.retry_interval(), Duration::from_millis(250));
        assert_eq!(
            settings.pairing.setup_timeout(),
            Duration::from_millis(DEFAULT_SETUP_TIMEOUT_MS)
        );
        assert!(settings.logging.file_logging);
        assert!(settings.registry.path.is_none());
    }

    #[test]
    fn zero_durations_are_clamped() {
        let settings = PairingSettings {
            setup_timeout_ms: 0,
            signing_timeout_ms: 0,
            reconnect_timeout_ms: 0,
            retry_interval_ms: 0,
            request_timeout_ms: 0,
        };

        assert_eq!(settings.setup_timeout(), Duration::from_millis(1));
        assert_eq!(settings.signing_timeout(), Duration::from_millis(1));
        assert_eq!(settings.reconnect_timeout(), Duration::from_millis(1));
        assert_eq!(settings.retry_interval(), Duration::from_millis(1));
        assert_eq!(settings.request_timeout(), Duration::from_millis(1));
    }
}
