//! Tagged log lines and the sinks that receive them.
//!
//! The dispatch core never reaches for a global logger. A [`Logger`] is handed
//! to the [`Router`](crate::Router) and every [`Context`](crate::Context)
//! carries a clone, so middleware writes through `c.logger()`.
//!
//! ```rust,no_run
//! use kelp::logging::{FileSink, LogConfig, Logger};
//! use kelp::Router;
//!
//! // Process-wide tracing subscriber, once at startup.
//! let _guard = LogConfig::new().init().unwrap();
//!
//! // Default sink forwards to tracing; swap it for a file per router.
//! let app = Router::new().with_logger(Logger::new(FileSink::open("kelp.log").unwrap()));
//! ```

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::error::Error;

/// Severity tag of a log line. `Req` marks the per-request access line.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LogTag {
    Info,
    Warn,
    Error,
    Debug,
    Req,
}

impl LogTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info  => "INFO",
            Self::Warn  => "WARN",
            Self::Error => "ERROR",
            Self::Debug => "DEBUG",
            Self::Req   => "REQ",
        }
    }
}

impl fmt::Display for LogTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives tagged, variadic log lines.
pub trait LogSink: Send + Sync {
    fn log(&self, tag: LogTag, values: &[&dyn fmt::Display]);
}

/// Joins values with single spaces.
pub fn join(values: &[&dyn fmt::Display]) -> String {
    let mut line = String::new();
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            line.push(' ');
        }
        line.push_str(&v.to_string());
    }
    line
}

// ── Sinks ─────────────────────────────────────────────────────────────────────

/// Forwards every line to `tracing` at the level matching its tag.
/// Access lines go to the `kelp::access` target at INFO.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, tag: LogTag, values: &[&dyn fmt::Display]) {
        let line = join(values);
        match tag {
            LogTag::Info  => tracing::info!("{line}"),
            LogTag::Warn  => tracing::warn!("{line}"),
            LogTag::Error => tracing::error!("{line}"),
            LogTag::Debug => tracing::debug!("{line}"),
            LogTag::Req   => tracing::info!(target: "kelp::access", "{line}"),
        }
    }
}

/// Appends `YYYY/MM/DD HH:MM:SS TAG v1 v2 ...` lines to a file.
#[derive(Debug)]
pub struct FileSink {
    file: Mutex<File>,
}

impl FileSink {
    /// Opens `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file: Mutex::new(file) })
    }
}

impl LogSink for FileSink {
    fn log(&self, tag: LogTag, values: &[&dyn fmt::Display]) {
        let now = chrono::Local::now().format("%Y/%m/%d %H:%M:%S");
        let line = join(values);
        let mut file = self.file.lock();
        if let Err(e) = writeln!(file, "{now} {tag} {line}") {
            tracing::warn!("log file write failed: {e}");
        }
    }
}

// ── Logger ────────────────────────────────────────────────────────────────────

/// Cheap, clonable handle to a [`LogSink`].
#[derive(Clone)]
pub struct Logger(Arc<dyn LogSink>);

impl Logger {
    pub fn new(sink: impl LogSink + 'static) -> Self {
        Self(Arc::new(sink))
    }

    pub fn from_arc(sink: Arc<dyn LogSink>) -> Self {
        Self(sink)
    }

    pub fn log(&self, tag: LogTag, values: &[&dyn fmt::Display]) {
        self.0.log(tag, values);
    }

    pub fn info(&self, values: &[&dyn fmt::Display])  { self.log(LogTag::Info, values) }
    pub fn warn(&self, values: &[&dyn fmt::Display])  { self.log(LogTag::Warn, values) }
    pub fn error(&self, values: &[&dyn fmt::Display]) { self.log(LogTag::Error, values) }
    pub fn debug(&self, values: &[&dyn fmt::Display]) { self.log(LogTag::Debug, values) }
    pub fn req(&self, values: &[&dyn fmt::Display])   { self.log(LogTag::Req, values) }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(TracingSink)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Logger")
    }
}

// ── Subscriber setup ──────────────────────────────────────────────────────────

/// Output format of the process-wide subscriber.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

/// Where the process-wide subscriber writes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Daily-rotated files `<directory>/<prefix>.YYYY-MM-DD`.
    DailyFile { directory: String, prefix: String },
}

/// Configuration of the process-wide `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over [`LogConfig::level`] when set.
#[derive(Clone, Debug)]
pub struct LogConfig {
    level: Level,
    format: LogFormat,
    output: LogOutput,
}

impl LogConfig {
    pub fn new() -> Self {
        Self { level: Level::INFO, format: LogFormat::Plain, output: LogOutput::Stdout }
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    /// Installs the global subscriber. Keep the returned guard alive for as
    /// long as logs should be flushed.
    ///
    /// Fails if a global subscriber is already installed.
    pub fn init(self) -> Result<WorkerGuard, Error> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.to_string()));

        let ansi = !matches!(self.output, LogOutput::DailyFile { .. });
        let (writer, guard) = match self.output {
            LogOutput::Stdout => tracing_appender::non_blocking(std::io::stdout()),
            LogOutput::Stderr => tracing_appender::non_blocking(std::io::stderr()),
            LogOutput::DailyFile { directory, prefix } => {
                tracing_appender::non_blocking(tracing_appender::rolling::daily(directory, prefix))
            }
        };

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(ansi);

        let installed = match self.format {
            LogFormat::Plain => builder.try_init(),
            LogFormat::Json => builder.json().try_init(),
        };
        installed.map_err(|e| Error::Logging(e.to_string()))?;
        Ok(guard)
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}
