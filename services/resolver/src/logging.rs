use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::{fmt as ts_fmt, prelude::*, reload, EnvFilter, Registry};

/// Verbosity levels exposed to operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Error => "error",
        }
    }

    /// Filter directives for this level
    fn directives(&self) -> String {
        format!("{},hyper=warn,reqwest=warn", self.as_str())
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::new(self.directives())
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = LogLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "error" => Ok(LogLevel::Error),
            other => Err(LogLevelError::Unknown(other.to_string())),
        }
    }
}

/// Errors from changing the log level.
#[derive(Debug, Error)]
pub enum LogLevelError {
    #[error("Unknown log level '{0}', expected debug | info | error")]
    Unknown(String),

    #[error("Failed to reload log filter: {0}")]
    Reload(String),
}

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Holds the current level and the handle used to swap the active filter
pub struct LogLevelControl {
    current: RwLock<LogLevel>,
    handle: FilterHandle,
}

impl LogLevelControl {
    pub fn new(level: LogLevel, handle: FilterHandle) -> Self {
        Self {
            current: RwLock::new(level),
            handle,
        }
    }

    /// Current level
    pub fn level(&self) -> LogLevel {
        *self.current.read()
    }

    /// Swap the active filter.
    pub fn set(&self, level: LogLevel) -> Result<(), LogLevelError> {
        let mut current = self.current.write();
        self.handle
            .reload(level.filter())
            .map_err(|e| LogLevelError::Reload(e.to_string()))?;
        *current = level;

        info!(log_level = %level, "Log level changed");
        Ok(())
    }
}

/// Install the global subscriber and return the level control.
pub fn init_tracing(level: LogLevel, format: &str) -> LogLevelControl {
    let (filter, handle) = reload::Layer::new(level.filter());
    let subscriber = tracing_subscriber::registry().with(filter);

    if format == "pretty" {
        subscriber.with(ts_fmt::layer().pretty()).init();
    } else {
        subscriber.with(ts_fmt::layer().json()).init();
    }

    LogLevelControl::new(level, handle)
}
