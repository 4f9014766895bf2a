//! Injected diagnostic sink.
//!
//! Pages and the storage manager report events such as compaction, page-full
//! and file creation through a `Logger` handed to them at construction. The
//! sink is fire-and-forget: nothing it does may influence the caller.

use std::fmt;
use std::sync::Arc;

/// Severity of a diagnostic message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
        }
    }
}

/// A leveled diagnostic sink.
pub trait Logger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }
}

/// Forwards messages to the `tracing` ecosystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!(target: "slotdb", "{}", message),
            LogLevel::Info => tracing::info!(target: "slotdb", "{}", message),
        }
    }
}

/// Discards every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _level: LogLevel, _message: &str) {}
}

/// Returns the logger used when none is injected.
pub fn default_logger() -> Arc<dyn Logger> {
    Arc::new(TracingLogger)
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingLogger;
    use super::*;

    #[test]
    fn test_helpers_forward_level() {
        let logger = RecordingLogger::default();
        logger.info("opened");
        logger.debug("compacting");

        let entries = logger.entries();
        assert_eq!(entries[0], (LogLevel::Info, "opened".to_string()));
        assert_eq!(entries[1], (LogLevel::Debug, "compacting".to_string()));
    }

    #[test]
    fn test_null_and_tracing_loggers_are_silent_noops() {
        NullLogger.info("ignored");
        TracingLogger.debug("no subscriber installed");
        default_logger().info("still fine");
    }
}
