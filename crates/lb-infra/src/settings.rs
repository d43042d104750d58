//! Platform locations for lockbox data.

use std::path::PathBuf;

use anyhow::{Context, Result};
use lb_core::settings::{LoggingSettings, RegistrySettings};

const APP_DIR: &str = "lockbox";
const REGISTRY_FILE: &str = "devices.json";
const LOG_DIR: &str = "logs";

fn data_dir() -> Result<PathBuf> {
    let base = dirs::data_local_dir().context("platform has no local data directory")?;
    Ok(base.join(APP_DIR))
}

/// `<data_local_dir>/lockbox/devices.json`
pub fn default_registry_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(REGISTRY_FILE))
}

/// `<data_local_dir>/lockbox/logs`
pub fn default_log_dir() -> Result<PathBuf> {
    Ok(data_dir()?.join(LOG_DIR))
}

pub fn resolve_registry_path(settings: &RegistrySettings) -> Result<PathBuf> {
    match &settings.path {
        Some(path) => Ok(path.clone()),
        None => default_registry_path(),
    }
}

pub fn resolve_log_dir(settings: &LoggingSettings) -> Result<PathBuf> {
    match &settings.directory {
        Some(dir) => Ok(dir.clone()),
        None => default_log_dir(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_paths_win_over_platform_defaults() {
        let registry = RegistrySettings {
            path: Some(PathBuf::from("/srv/lockbox/devices.json")),
        };
        let logging = LoggingSettings {
            file_logging: true,
            directory: Some(PathBuf::from("/var/log/lockbox")),
        };

        assert_eq!(
            resolve_registry_path(&registry).unwrap(),
            PathBuf::from("/srv/lockbox/devices.json")
        );
        assert_eq!(
            resolve_log_dir(&logging).unwrap(),
            PathBuf::from("/var/log/lockbox")
        );
    }

    #[test]
    fn default_registry_lives_under_the_app_dir() {
        if let Ok(path) = default_registry_path() {
            assert!(path.ends_with("lockbox/devices.json"));
        }
    }
}
