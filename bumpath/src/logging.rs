//! Tracing subscriber setup.
//!
//! Logs always go to `bumpath.log` in the configured directory. With
//! `verbose` they are mirrored to stderr. The filter defaults to
//! [`DEFAULT_FILTER`] and can be overridden with `RUST_LOG`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "bumpath=info";

/// Log file name inside the log directory.
pub const LOG_FILE_NAME: &str = "bumpath.log";

/// Where and how to log.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub directory: PathBuf,

    /// Mirror logs to stderr.
    pub verbose: bool,
}

impl LoggingConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Full path of the log file.
    pub fn log_file(&self) -> PathBuf {
        self.directory.join(LOG_FILE_NAME)
    }
}

/// Keeps the background log writer alive; logs are flushed on drop.
#[must_use = "logs are lost if the guard is dropped immediately"]
pub struct LoggingGuard {
    _file: WorkerGuard,
    log_file: PathBuf,
    installed: bool,
}

impl LoggingGuard {
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    /// False when another global subscriber was already set.
    pub fn installed(&self) -> bool {
        self.installed
    }
}

/// Install the global subscriber.
///
/// Fails if the log directory cannot be created. Calling it twice leaves the
/// first subscriber in place and the returned guard reports it was not
/// installed.
pub fn init_logging(config: &LoggingConfig) -> io::Result<LoggingGuard> {
    fs::create_dir_all(&config.directory)?;

    let appender = tracing_appender::rolling::never(&config.directory, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);
    let stderr_layer = config.verbose.then(|| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .compact()
    });

    let installed = match tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
    {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(error = %e, "Global subscriber already set, keeping it");
            false
        }
    };

    Ok(LoggingGuard {
        _file: guard,
        log_file: config.log_file(),
        installed,
    })
}
