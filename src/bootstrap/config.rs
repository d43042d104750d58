//! # Configuration loader
//!
//! Reads `lockbox.toml` into [`LockboxSettings`]. Every section and field is
//! optional; anything left out keeps its default. Range clamping happens in
//! `lb-core` when durations are read, not here.

use std::path::{Path, PathBuf};

use anyhow::Context;
use lb_core::LockboxSettings;

const CONFIG_FILE: &str = "lockbox.toml";

/// `<config_dir>/lockbox/lockbox.toml`
pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let base = dirs::config_dir().context("platform has no config directory")?;
    Ok(base.join("lockbox").join(CONFIG_FILE))
}

/// Load configuration from a TOML file.
///
/// A missing file is not an error and yields [`LockboxSettings::default`].
///
/// # Errors
///
/// - the file exists but cannot be read
/// - the content is not valid TOML or has fields of the wrong type
pub fn load_config(config_path: impl AsRef<Path>) -> anyhow::Result<LockboxSettings> {
    let config_path = config_path.as_ref();
    let content = match std::fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %config_path.display(), "config file not found, using defaults");
            return Ok(LockboxSettings::default());
        }
        Err(err) => {
            return Err(err)
                .with_context(|| format!("Failed to read config file: {}", config_path.display()))
        }
    };

    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config as TOML: {}", config_path.display()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_load_config_reads_valid_toml() {
        let toml_content = r#"
            [pairing]
            setup_timeout_ms = 2000
            retry_interval_ms = 250

            [registry]
            path = "/srv/lockbox/devices.json"

            [logging]
            file_logging = false
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let settings = load_config(temp_file.path()).unwrap();

        assert_eq!(settings.pairing.setup_timeout(), Duration::from_millis(2000));
        assert_eq!(settings.pairing.retry_interval(), Duration::from_millis(250));
        // untouched fields keep their defaults
        assert_eq!(
            settings.pairing.signing_timeout_ms,
            LockboxSettings::default().pairing.signing_timeout_ms
        );
        assert_eq!(
            settings.registry.path,
            Some(PathBuf::from("/srv/lockbox/devices.json"))
        );
        assert!(!settings.logging.file_logging);
        assert_eq!(settings.logging.directory, None);
    }

    #[test]
    fn test_load_config_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();

        let settings = load_config(dir.path().join("absent.toml")).unwrap();

        assert_eq!(settings, LockboxSettings::default());
    }

    #[test]
    fn test_load_config_empty_file_yields_defaults() {
        let temp_file = NamedTempFile::new().unwrap();

        let settings = load_config(temp_file.path()).unwrap();

        assert_eq!(settings, LockboxSettings::default());
    }

    #[test]
    fn test_load_config_rejects_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[pairing\nsetup_timeout_ms = ").unwrap();

        let err = load_config(temp_file.path()).unwrap_err();

        assert!(format!("{err:#}").contains("Failed to parse config as TOML"));
    }

    #[test]
    fn test_load_config_rejects_wrong_field_type() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[pairing]\nsetup_timeout_ms = \"soon\"\n")
            .unwrap();

        assert!(load_config(temp_file.path()).is_err());
    }

    #[test]
    fn test_zero_durations_are_clamped() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[pairing]\nretry_interval_ms = 0\n")
            .unwrap();

        let settings = load_config(temp_file.path()).unwrap();

        assert_eq!(settings.pairing.retry_interval(), Duration::from_millis(1));
    }
}
