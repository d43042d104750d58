//! Tracing subscriber setup.
//!
//! Stdout always receives events. A plain-text file under the lockbox log
//! directory is added when `logging.file_logging` is on; if that directory
//! cannot be prepared the subscriber falls back to stdout only.

use std::{fs, io, path::Path, sync::OnceLock};

use lb_core::LoggingSettings;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, fmt::writer::BoxMakeWriter, prelude::*, registry, EnvFilter};

const LOG_FILE: &str = "lockbox.log";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn is_development() -> bool {
    cfg!(debug_assertions)
}

/// Default directives when `RUST_LOG` is not set.
fn build_filter_directives(is_dev: bool) -> Vec<String> {
    let level = if is_dev { "debug" } else { "info" };
    vec![
        level.to_string(),
        format!("lb_core={level}"),
        format!("lb_app={level}"),
        format!("lb_infra={level}"),
        "lockbox_lib=info".to_string(),
    ]
}

fn build_env_filter(is_dev: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(build_filter_directives(is_dev).join(",")))
}

/// Install the global subscriber.
///
/// Call once, early, before the runtime is built:
///
/// ```ignore
/// let settings = lockbox_lib::load_config(lockbox_lib::default_config_path()?)?;
/// lockbox_lib::bootstrap::tracing::init_tracing_subscriber(&settings.logging)?;
/// ```
///
/// # Errors
///
/// Fails if a global subscriber is already registered.
pub fn init_tracing_subscriber(settings: &LoggingSettings) -> anyhow::Result<()> {
    let env_filter = build_env_filter(is_development());

    let stdout_writer: BoxMakeWriter = BoxMakeWriter::new(io::stdout);
    let file_writer = if settings.file_logging {
        match lb_infra::settings::resolve_log_dir(settings).and_then(|dir| build_file_writer(&dir))
        {
            Ok(writer) => Some(writer),
            Err(err) => {
                eprintln!("Failed to initialize file logging, falling back to stdout: {err:#}");
                None
            }
        }
    } else {
        None
    };

    // "2025-01-15 10:30:45.123 INFO lb_app::usecases::pairing: file.rs:42: message"
    let stdout_layer = fmt::layer()
        .with_timer(fmt::time::ChronoUtc::new(TIMESTAMP_FORMAT.to_string()))
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_ansi(cfg!(not(test)))
        .with_writer(stdout_writer);

    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .with_timer(fmt::time::ChronoUtc::new(TIMESTAMP_FORMAT.to_string()))
            .with_level(true)
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_ansi(false)
            .with_writer(writer)
    });

    registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

fn build_file_writer(dir: &Path) -> anyhow::Result<NonBlocking> {
    fs::create_dir_all(dir)?;

    let file_appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    LOG_GUARD
        .set(guard)
        .map_err(|_| anyhow::anyhow!("Tracing log guard already initialized"))?;

    Ok(non_blocking)
}
