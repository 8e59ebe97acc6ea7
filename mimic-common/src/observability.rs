//! Logging setup for the `mimic` binary and test harnesses.
//!
//! Events go to a daily-rolling file under the configured log directory,
//! optionally mirrored to stderr, as plain text or JSON lines. Only the
//! first [`init_logging`] call installs a subscriber; later calls return
//! the same file path.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::LoggingConfig;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

const LOG_DIR_ENV: &str = "MIMIC_LOG_DIR";

/// Encoding of each log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Resolved logging settings for one process.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Base name of the log file, e.g. `mimic` for `mimic.log.2024-06-12`.
    pub app_name: &'static str,
    /// Log directory. Falls back to `MIMIC_LOG_DIR`, then
    /// `~/.local/share/<app_name>`.
    pub log_dir: Option<PathBuf>,
    pub emit_stderr: bool,
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is unset, e.g. `info,behavior.pointer=debug`.
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: "mimic",
            log_dir: None,
            emit_stderr: false,
            format: LogFormat::Text,
            default_filter: "info".to_string(),
        }
    }
}

impl LogConfig {
    /// Build the initializer settings from the `logging` section of the
    /// YAML configuration.
    pub fn from_settings(app_name: &'static str, settings: &LoggingConfig) -> Self {
        Self {
            app_name,
            log_dir: settings.directory.as_deref().map(PathBuf::from),
            emit_stderr: settings.stderr,
            format: settings.format,
            default_filter: settings.level.clone(),
        }
    }
}

/// Install the global subscriber and return today's log file.
pub fn init_logging(config: LogConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = LOG_PATH.get() {
        return Ok(path.clone());
    }

    let dir = resolve_log_dir(config.app_name, config.log_dir.as_deref());
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory: {}", dir.display()))?;

    let file_name = format!("{}.log", config.app_name);
    let today_path = daily_log_path(&dir, &file_name, Local::now().date_naive());

    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(&dir, &file_name));
    let _ = LOG_GUARD.set(guard);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let file_layer = match config.format {
        LogFormat::Text => fmt::layer().with_writer(writer).with_ansi(false).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
    };
    let stderr_layer = config.emit_stderr.then(|| match config.format {
        LogFormat::Text => fmt::layer().with_writer(std::io::stderr).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;

    let _ = LOG_PATH.set(today_path.clone());
    Ok(today_path)
}

/// File the daily roller writes to on `date`.
fn daily_log_path(dir: &Path, file_name: &str, date: NaiveDate) -> PathBuf {
    dir.join(format!("{file_name}.{}", date.format("%Y-%m-%d")))
}

fn resolve_log_dir(app_name: &str, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(dir) => expand_home(dir),
        None => std::env::var_os(LOG_DIR_ENV)
            .map(|dir| expand_home(Path::new(&dir)))
            .unwrap_or_else(|| default_data_dir(app_name)),
    }
}

/// `~/x` becomes `$HOME/x`; anything else is returned unchanged.
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), std::env::var_os("HOME")) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}

fn default_data_dir(app_name: &str) -> PathBuf {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".local/share"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(app_name)
}
