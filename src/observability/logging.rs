//! Structured logging setup.
//!
//! # Responsibilities
//! - Initialize the process-wide `tracing` subscriber exactly once
//! - Write JSON lines to a rotating file next to the executable
//! - Optionally mirror to stdout for development
//!
//! # Design Decisions
//! - Initialization is an explicit startup step; a second call fails with
//!   [`LogError::AlreadyInitialized`] instead of racing
//! - The active file is `<app_name>.log`; it rotates daily or when it
//!   reaches `max_size_mb`, keeping `max_files` numbered backups
//!   (`<app_name>.log.1`, ...). Backups older than `max_age_days` are
//!   removed at startup. No compression.
//! - `RUST_LOG` overrides the configured level; an invalid value is
//!   reported and the configured level is used

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use rolling_file::{BasicRollingFileAppender, RollingConditionBasic};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogConfig;
use crate::observability::format::JsonLines;

/// Directory name, relative to the executable, used when no log directory
/// is configured.
pub const DEFAULT_LOG_DIR: &str = ".log";

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("log file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("a global logger is already installed")]
    AlreadyInitialized,
}

/// Keeps the background log writer alive; dropping it flushes pending lines.
#[must_use = "dropping the guard stops the log writer"]
pub struct LogGuard {
    _file: WorkerGuard,
    path: PathBuf,
}

impl LogGuard {
    /// Path of the active log file.
    pub fn file(&self) -> &Path {
        &self.path
    }
}

/// Directory containing the running executable.
pub fn app_run_path() -> std::io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// Resolve where log files go for `config`.
pub fn log_directory(config: &LogConfig) -> std::io::Result<PathBuf> {
    match &config.directory {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => Ok(app_run_path()?.join(DEFAULT_LOG_DIR)),
    }
}

/// Path of the active log file for `app_name` inside `dir`.
pub fn log_file(dir: &Path, app_name: &str) -> PathBuf {
    dir.join(format!("{app_name}.log"))
}

fn file_appender(config: &LogConfig, path: &Path) -> std::io::Result<BasicRollingFileAppender> {
    let condition = RollingConditionBasic::new()
        .daily()
        .max_size(config.max_size_mb.saturating_mul(1024 * 1024));
    BasicRollingFileAppender::new(path, condition, config.max_files)
}

/// Remove rotated backups of `active` last modified more than `max_age` ago.
/// Returns how many were removed.
fn prune_backups(active: &Path, max_age: Duration) -> std::io::Result<usize> {
    let (Some(dir), Some(name)) = (active.parent(), active.file_name().and_then(|n| n.to_str())) else {
        return Ok(0);
    };
    let backup_prefix = format!("{name}.");
    let now = SystemTime::now();

    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let is_backup = entry
            .file_name()
            .to_str()
            .is_some_and(|n| n.starts_with(&backup_prefix));
        if !is_backup {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        let expired = now.duration_since(modified).is_ok_and(|age| age > max_age);
        if expired {
            std::fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// The configured filter, unless `RUST_LOG` holds a valid one. An invalid
/// `RUST_LOG` is returned alongside so it can be reported once logging works.
fn env_filter(config: &LogConfig) -> Result<(EnvFilter, Option<(String, String)>), LogError> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(value) if !value.trim().is_empty() => match EnvFilter::try_new(&value) {
            Ok(filter) => Ok((filter, None)),
            Err(e) => Ok((EnvFilter::try_new(&config.level)?, Some((value, e.to_string())))),
        },
        _ => Ok((EnvFilter::try_new(&config.level)?, None)),
    }
}

/// Install the global subscriber.
///
/// Must be called once at startup, before the first request is served.
pub fn init(config: &LogConfig, app_name: &str) -> Result<LogGuard, LogError> {
    let (filter, rejected) = env_filter(config)?;

    let dir = log_directory(config)?;
    std::fs::create_dir_all(&dir)?;
    let path = log_file(&dir, app_name);
    let pruned = prune_backups(&path, Duration::from_secs(config.max_age_days.saturating_mul(SECONDS_PER_DAY)))?;
    let (writer, guard) = tracing_appender::non_blocking(file_appender(config, &path)?);

    let file_layer = fmt::layer()
        .event_format(JsonLines::default())
        .with_ansi(false)
        .with_writer(writer);

    let stdout_layer = config
        .stdout
        .then(|| fmt::layer().with_target(false));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|_| LogError::AlreadyInitialized)?;

    if let Some((value, error)) = rejected {
        tracing::warn!(rust_log = %value, %error, "ignoring invalid RUST_LOG, using configured level");
    }
    tracing::debug!(file = %path.display(), pruned, "logging initialized");

    Ok(LogGuard {
        _file: guard,
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_configured_directory_is_used() {
        let config = LogConfig {
            directory: Some("/var/log/orders".into()),
            ..LogConfig::default()
        };
        assert_eq!(log_directory(&config).unwrap(), PathBuf::from("/var/log/orders"));
    }

    #[test]
    fn test_default_directory_sits_next_to_executable() {
        let dir = log_directory(&LogConfig::default()).unwrap();
        assert!(dir.ends_with(DEFAULT_LOG_DIR));
        assert_eq!(dir.parent().unwrap(), app_run_path().unwrap());
    }

    #[test]
    fn test_appender_writes_active_file() {
        use std::io::Write;

        let tmp = tempfile::tempdir().unwrap();
        let path = log_file(tmp.path(), "orders");
        let mut appender = file_appender(&LogConfig::default(), &path).unwrap();
        appender.write_all(b"{}\n").unwrap();
        appender.flush().unwrap();
        assert_eq!(path.file_name().unwrap(), "orders.log");
        assert!(path.is_file());
    }

    #[test]
    fn test_appender_rotates_by_size() {
        use std::io::Write;

        let tmp = tempfile::tempdir().unwrap();
        let path = log_file(tmp.path(), "orders");
        let config = LogConfig {
            max_size_mb: 1,
            max_files: 2,
            ..LogConfig::default()
        };
        let mut appender = file_appender(&config, &path).unwrap();
        let chunk = vec![b'x'; 256 * 1024];
        for _ in 0..12 {
            appender.write_all(&chunk).unwrap();
        }
        appender.flush().unwrap();

        assert!(tmp.path().join("orders.log.1").is_file());
        assert!(!tmp.path().join("orders.log.3").exists());
    }

    #[test]
    fn test_prune_removes_only_expired_backups() {
        let tmp = tempfile::tempdir().unwrap();
        let active = log_file(tmp.path(), "orders");
        let old = SystemTime::now() - Duration::from_secs(100 * SECONDS_PER_DAY);

        for name in ["orders.log", "orders.log.1", "orders.log.2", "billing.log.1"] {
            File::create(tmp.path().join(name)).unwrap();
        }
        for name in ["orders.log", "orders.log.2", "billing.log.1"] {
            File::options()
                .write(true)
                .open(tmp.path().join(name))
                .unwrap()
                .set_modified(old)
                .unwrap();
        }

        let removed = prune_backups(&active, Duration::from_secs(90 * SECONDS_PER_DAY)).unwrap();
        assert_eq!(removed, 1);
        assert!(active.exists());
        assert!(tmp.path().join("orders.log.1").exists());
        assert!(!tmp.path().join("orders.log.2").exists());
        assert!(tmp.path().join("billing.log.1").exists());
    }
}
