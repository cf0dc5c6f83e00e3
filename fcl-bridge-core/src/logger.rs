//! Forwards the crate's `log` records to a logger implemented by the host app.
//!
//! ```rust
//! use fcl_bridge_core::logger::{LogLevel, Logger};
//!
//! struct StdoutLogger;
//!
//! impl Logger for StdoutLogger {
//!     fn log(&self, level: LogLevel, message: String) {
//!         println!("[{level:?}] {message}");
//!     }
//! }
//! ```
//!
//! On iOS the host typically wraps its own logging facility:
//!
//! ```swift
//! final class WalletLogger: FclBridge.Logger {
//!     func log(level: FclBridge.LogLevel, message: String) {
//!         os_log("%{public}@", type: level.osLogType, message)
//!     }
//! }
//!
//! FclBridge.setLogger(logger: WalletLogger())
//! ```

use std::sync::{Arc, OnceLock};

/// Receives every log line emitted by the bridge.
#[uniffi::export(with_foreign)]
pub trait Logger: Sync + Send {
    /// Records `message` at `level`.
    fn log(&self, level: LogLevel, message: String);
}

/// Severity of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum LogLevel {
    /// Step-by-step protocol detail, including raw page messages.
    Trace,
    /// Decisions taken while handling a message.
    Debug,
    /// Phase boundaries.
    Info,
    /// Dropped or declined messages.
    Warn,
    /// Failed phases.
    Error,
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warn,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Trace,
        }
    }
}

static HOST_LOGGER: OnceLock<Arc<dyn Logger>> = OnceLock::new();

/// Only the bridge's own debug output is forwarded. HTTP and runtime crates are limited to
/// info and above.
fn should_forward(module_path: Option<&str>, level: log::Level) -> bool {
    level <= log::Level::Info || module_path.is_some_and(|path| path.starts_with("fcl_bridge"))
}

struct HostLogger;

impl log::Log for HostLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        HOST_LOGGER.get().is_some()
    }

    fn log(&self, record: &log::Record) {
        if !should_forward(record.module_path(), record.level()) {
            return;
        }
        if let Some(logger) = HOST_LOGGER.get() {
            logger.log(record.level().into(), record.args().to_string());
        }
    }

    fn flush(&self) {}
}

/// Installs the host logger. Only the first call has an effect.
#[uniffi::export]
pub fn set_logger(logger: Arc<dyn Logger>) {
    static BACKEND: HostLogger = HostLogger;

    if HOST_LOGGER.set(logger).is_err() {
        eprintln!("fcl-bridge: logger already installed");
        return;
    }
    match log::set_logger(&BACKEND) {
        Ok(()) => log::set_max_level(log::LevelFilter::Trace),
        Err(e) => eprintln!("fcl-bridge: another log backend is active: {e}"),
    }
}
