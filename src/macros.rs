//! Logging macros for ergonomic log message formatting.
//!
//! Each macro formats its arguments like `format!` and emits the result
//! through a [`Logger`](crate::Logger) handle.
//!
//! # Examples
//!
//! ```
//! use log_fanout::prelude::*;
//! use log_fanout::info;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(LoggerRegistry::new());
//! let logger = registry.logger(["app", "http"]);
//!
//! info!(logger, "Server started");
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! ```

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use log_fanout::prelude::*;
/// # let logger = std::sync::Arc::new(LoggerRegistry::new()).logger("app");
/// use log_fanout::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+))
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use log_fanout::prelude::*;
/// # let logger = std::sync::Arc::new(LoggerRegistry::new()).logger("app");
/// use log_fanout::info;
/// info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warning, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use log_fanout::prelude::*;
/// # let logger = std::sync::Arc::new(LoggerRegistry::new()).logger("app");
/// use log_fanout::error;
/// error!(logger, "Error code: {}, message: {}", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{LogLevel, LogRecord, LoggerRegistry, RegistryEntry, Result, Sink, SinkMap};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct LineSink {
        lines: Mutex<Vec<(LogLevel, String)>>,
    }

    #[async_trait]
    impl Sink for LineSink {
        fn write(&self, record: &LogRecord) -> Result<()> {
            self.lines.lock().push((record.level, record.render_message()));
            Ok(())
        }

        fn name(&self) -> &str {
            "lines"
        }
    }

    fn logger() -> (crate::core::Logger, Arc<LineSink>) {
        let sink = Arc::new(LineSink::default());
        let registry = Arc::new(LoggerRegistry::new());
        let mut sinks = SinkMap::new();
        sinks.insert("lines".to_string(), sink.clone() as Arc<dyn Sink>);
        registry
            .configure(sinks, vec![RegistryEntry::new("app", LogLevel::Debug).sink("lines")])
            .unwrap();
        (registry.logger("app.macros"), sink)
    }

    #[test]
    fn test_level_macros() {
        let (logger, sink) = logger();

        debug!(logger, "Count: {}", 5);
        info!(logger, "Items: {}", 100);
        warn!(logger, "Retry {} of {}", 1, 3);
        error!(logger, "Code: {}", 500);
        fatal!(logger, "Critical failure: {}", "system");

        let lines = sink.lines.lock();
        assert_eq!(
            *lines,
            vec![
                (LogLevel::Debug, "Count: 5".to_string()),
                (LogLevel::Info, "Items: 100".to_string()),
                (LogLevel::Warning, "Retry 1 of 3".to_string()),
                (LogLevel::Error, "Code: 500".to_string()),
                (LogLevel::Fatal, "Critical failure: system".to_string()),
            ]
        );
    }

    #[test]
    fn test_log_macro() {
        let (logger, sink) = logger();
        log!(logger, LogLevel::Info, "Formatted: {}", 42);

        assert_eq!(sink.lines.lock()[0].1, "Formatted: 42");
    }
}
