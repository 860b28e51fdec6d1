//! Per-category logger handle

use super::{
    category::Category,
    log_level::LogLevel,
    log_record::{LogRecord, Message},
    properties::{FieldValue, Properties},
    registry::LoggerRegistry,
};
use std::sync::Arc;

/// Category used when a handle is requested for the empty path
pub const DEFAULT_CATEGORY: &str = "app";

/// A cheap, cloneable facade that builds records for one category and
/// hands them to the registry.
///
/// Emitting never fails and never blocks on network I/O.
///
/// # Example
///
/// ```
/// use log_fanout::prelude::*;
/// use std::sync::Arc;
///
/// let registry = Arc::new(LoggerRegistry::new());
/// let logger = registry
///     .logger(["app", "billing"])
///     .with_property("service", "checkout");
///
/// logger.info("invoice created");
/// logger.error_with(
///     "charge failed",
///     Properties::new().with("invoice_id", 1042),
/// );
/// ```
#[derive(Clone)]
pub struct Logger {
    registry: Arc<LoggerRegistry>,
    category: Category,
    context: Properties,
}

impl Logger {
    pub fn new(registry: Arc<LoggerRegistry>, category: Category) -> Self {
        let category = if category.is_empty() {
            Category::from(DEFAULT_CATEGORY)
        } else {
            category
        };
        Self {
            registry,
            category,
            context: Properties::new(),
        }
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    /// Derive a handle one category level below this one, keeping context
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            category: self.category.child(segment),
            context: self.context.clone(),
        }
    }

    /// Attach a property to every record emitted through this handle.
    ///
    /// Record-level properties win over contextual ones with the same key.
    #[must_use]
    pub fn with_property<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.context.insert(key, value);
        self
    }

    /// Build a record stamped with the current time and dispatch it
    pub fn emit(&self, level: LogLevel, message: impl Into<Message>, properties: Option<Properties>) {
        let mut properties = properties.unwrap_or_default();
        properties.merge_defaults(&self.context);

        let record =
            LogRecord::new(self.category.clone(), level, message).with_properties(properties);
        self.registry.dispatch(&record);
    }

    pub fn log(&self, level: LogLevel, message: impl Into<Message>) {
        self.emit(level, message, None);
    }

    #[inline]
    pub fn debug(&self, message: impl Into<Message>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<Message>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    pub fn warning(&self, message: impl Into<Message>) {
        self.log(LogLevel::Warning, message);
    }

    #[inline]
    pub fn error(&self, message: impl Into<Message>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    pub fn fatal(&self, message: impl Into<Message>) {
        self.log(LogLevel::Fatal, message);
    }

    /// Log with structured properties
    pub fn log_with(&self, level: LogLevel, message: impl Into<Message>, properties: Properties) {
        self.emit(level, message, Some(properties));
    }

    pub fn debug_with(&self, message: impl Into<Message>, properties: Properties) {
        self.log_with(LogLevel::Debug, message, properties);
    }

    pub fn info_with(&self, message: impl Into<Message>, properties: Properties) {
        self.log_with(LogLevel::Info, message, properties);
    }

    pub fn warning_with(&self, message: impl Into<Message>, properties: Properties) {
        self.log_with(LogLevel::Warning, message, properties);
    }

    pub fn error_with(&self, message: impl Into<Message>, properties: Properties) {
        self.log_with(LogLevel::Error, message, properties);
    }

    pub fn fatal_with(&self, message: impl Into<Message>, properties: Properties) {
        self.log_with(LogLevel::Fatal, message, properties);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RegistryEntry, Result, Sink, SinkMap};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct CapturingSink {
        records: Mutex<Vec<LogRecord>>,
    }

    #[async_trait]
    impl Sink for CapturingSink {
        fn write(&self, record: &LogRecord) -> Result<()> {
            self.records.lock().push(record.clone());
            Ok(())
        }

        fn name(&self) -> &str {
            "capturing"
        }
    }

    fn configured(min: LogLevel) -> (Arc<LoggerRegistry>, Arc<CapturingSink>) {
        let sink = Arc::new(CapturingSink::default());
        let registry = Arc::new(LoggerRegistry::new());
        let mut sinks = SinkMap::new();
        sinks.insert("capture".to_string(), sink.clone() as Arc<dyn Sink>);
        registry
            .configure(sinks, vec![RegistryEntry::new(["app"], min).sink("capture")])
            .unwrap();
        (registry, sink)
    }

    #[test]
    fn test_level_methods_build_records() {
        let (registry, sink) = configured(LogLevel::Debug);
        let logger = registry.logger(["app", "auth"]);

        logger.debug("d");
        logger.info("i");
        logger.warning("w");
        logger.error("e");
        logger.fatal("f");

        let records = sink.records.lock();
        let levels: Vec<_> = records.iter().map(|r| r.level).collect();
        assert_eq!(levels, LogLevel::ALL.to_vec());
        assert!(records.iter().all(|r| r.category.dotted() == "app.auth"));
    }

    #[test]
    fn test_empty_message_accepted() {
        let (registry, sink) = configured(LogLevel::Debug);
        registry.logger("app").emit(LogLevel::Info, Message::empty(), None);

        let records = sink.records.lock();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].render_message(), "");
    }

    #[test]
    fn test_context_merged_record_wins() {
        let (registry, sink) = configured(LogLevel::Debug);
        let logger = registry
            .logger("app")
            .with_property("request_id", "ctx")
            .with_property("service", "api");

        logger.info_with("hello", Properties::new().with("request_id", "explicit"));

        let records = sink.records.lock();
        let props = &records[0].properties;
        assert_eq!(props.get("request_id"), Some(&FieldValue::from("explicit")));
        assert_eq!(props.get("service"), Some(&FieldValue::from("api")));
    }

    #[test]
    fn test_child_extends_category() {
        let (registry, sink) = configured(LogLevel::Debug);
        registry.logger("app").child("jobs").child("mailer").info("sent");

        assert_eq!(sink.records.lock()[0].category.dotted(), "app.jobs.mailer");
    }

    #[test]
    fn test_empty_category_defaults() {
        let registry = Arc::new(LoggerRegistry::new());
        let logger = registry.logger(Category::root());
        assert_eq!(logger.category().dotted(), DEFAULT_CATEGORY);
    }
}
