//! Category-routed logger registry
//!
//! The registry owns the category → sink configuration and routes each
//! record to the sinks of its longest matching category prefix.

use super::{
    category::Category,
    error::{LoggerError, Result},
    log_level::LogLevel,
    log_record::LogRecord,
    logger::Logger,
    metrics::RegistryMetrics,
    sink::Sink,
};
use futures_util::FutureExt;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Named sinks handed to [`LoggerRegistry::configure`]
pub type SinkMap = HashMap<String, Arc<dyn Sink>>;

const UNCONFIGURED: u8 = 0;
const CONFIGURING: u8 = 1;
const CONFIGURED: u8 = 2;

/// Routing rule for one category prefix
///
/// # Example
///
/// ```
/// use log_fanout::{LogLevel, RegistryEntry};
///
/// let entry = RegistryEntry::new(["app", "auth"], LogLevel::Error)
///     .sink("console")
///     .sink("alert");
/// assert_eq!(entry.sinks.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub category: Category,
    pub minimum_level: LogLevel,
    pub sinks: BTreeSet<String>,
}

impl RegistryEntry {
    pub fn new(category: impl Into<Category>, minimum_level: LogLevel) -> Self {
        Self {
            category: category.into(),
            minimum_level,
            sinks: BTreeSet::new(),
        }
    }

    /// Route to the sink registered under `name`
    #[must_use]
    pub fn sink(mut self, name: impl Into<String>) -> Self {
        self.sinks.insert(name.into());
        self
    }

    #[must_use]
    pub fn sinks<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sinks.extend(names.into_iter().map(Into::into));
        self
    }
}

struct Route {
    minimum_level: LogLevel,
    sinks: Vec<Arc<dyn Sink>>,
}

/// Immutable routing table built by a successful `configure`
struct Routes {
    by_prefix: HashMap<Vec<String>, Route>,
    sinks: Vec<Arc<dyn Sink>>,
}

impl Routes {
    fn build(sinks: SinkMap, entries: Vec<RegistryEntry>) -> Result<Self> {
        let mut by_prefix = HashMap::with_capacity(entries.len());

        for entry in entries {
            let mut resolved = Vec::with_capacity(entry.sinks.len());
            for name in &entry.sinks {
                let sink = sinks
                    .get(name)
                    .ok_or_else(|| LoggerError::unknown_sink(entry.category.dotted(), name))?;
                resolved.push(Arc::clone(sink));
            }

            let key = entry.category.segments().to_vec();
            if by_prefix.contains_key(&key) {
                return Err(LoggerError::duplicate_entry(entry.category.dotted()));
            }
            by_prefix.insert(
                key,
                Route {
                    minimum_level: entry.minimum_level,
                    sinks: resolved,
                },
            );
        }

        let mut names: Vec<_> = sinks.keys().cloned().collect();
        names.sort();
        for name in &names {
            let routed = by_prefix
                .values()
                .any(|route| route.sinks.iter().any(|s| Arc::ptr_eq(s, &sinks[name])));
            if !routed {
                eprintln!(
                    "[LOGGER WARNING] Sink '{}' is registered but no category routes to it",
                    name
                );
            }
        }

        Ok(Self {
            by_prefix,
            sinks: names.iter().map(|n| Arc::clone(&sinks[n])).collect(),
        })
    }

    /// Longest matching prefix: the full path first, then each ancestor, then the root
    fn resolve(&self, category: &Category) -> Option<&Route> {
        category
            .ancestors()
            .find_map(|prefix| self.by_prefix.get(prefix))
    }
}

/// Process-wide routing state
///
/// Built empty, configured once, then shared by every [`Logger`] handle.
///
/// # Example
///
/// ```
/// use log_fanout::prelude::*;
/// use std::collections::HashMap;
/// use std::sync::Arc;
///
/// let registry = Arc::new(LoggerRegistry::new());
///
/// let mut sinks: SinkMap = HashMap::new();
/// sinks.insert("console".into(), Arc::new(ConsoleSink::new()));
///
/// registry
///     .configure(sinks, vec![RegistryEntry::new(["app"], LogLevel::Info).sink("console")])
///     .expect("valid configuration");
///
/// let logger = registry.logger(["app", "auth"]);
/// logger.info("user signed in");
/// ```
pub struct LoggerRegistry {
    state: AtomicU8,
    routes: RwLock<Option<Arc<Routes>>>,
    metrics: RegistryMetrics,
}

impl LoggerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(UNCONFIGURED),
            routes: RwLock::new(None),
            metrics: RegistryMetrics::new(),
        }
    }

    /// One-time setup.
    ///
    /// Once a call has succeeded, later calls return `Ok(())` without
    /// touching the routing table. A call that fails leaves the registry
    /// unconfigured so a corrected retry can succeed. A call made while
    /// another is in progress fails with
    /// [`LoggerError::ConcurrentConfiguration`].
    pub fn configure(&self, sinks: SinkMap, entries: Vec<RegistryEntry>) -> Result<()> {
        match self
            .state
            .compare_exchange(UNCONFIGURED, CONFIGURING, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {}
            Err(CONFIGURED) => return Ok(()),
            Err(_) => return Err(LoggerError::ConcurrentConfiguration),
        }

        match Routes::build(sinks, entries) {
            Ok(routes) => {
                *self.routes.write() = Some(Arc::new(routes));
                self.state.store(CONFIGURED, Ordering::Release);
                Ok(())
            }
            Err(e) => {
                self.state.store(UNCONFIGURED, Ordering::Release);
                Err(e)
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.state.load(Ordering::Acquire) == CONFIGURED
    }

    /// Get a handle that emits records under `category`
    pub fn logger(self: &Arc<Self>, category: impl Into<Category>) -> Logger {
        Logger::new(Arc::clone(self), category.into())
    }

    fn current_routes(&self) -> Option<Arc<Routes>> {
        self.routes.read().clone()
    }

    /// Route `record` to the sinks of its longest matching category prefix.
    ///
    /// Never fails: unmatched and below-threshold records are dropped, and
    /// sink errors or panics are contained at the sink boundary.
    pub fn dispatch(&self, record: &LogRecord) {
        let Some(routes) = self.current_routes() else {
            self.metrics.record_unrouted();
            return;
        };

        let Some(route) = routes.resolve(&record.category) else {
            self.metrics.record_unrouted();
            return;
        };

        if record.level < route.minimum_level {
            self.metrics.record_filtered();
            return;
        }

        self.metrics.record_dispatched();
        for sink in &route.sinks {
            let result = std::panic::catch_unwind(AssertUnwindSafe(|| sink.write(record)));
            if !matches!(result, Ok(Ok(()))) {
                self.metrics.record_sink_failure();
            }
        }
    }

    /// Names of the sinks `category` would reach at `level`; empty when dropped
    pub fn route(&self, category: &Category, level: LogLevel) -> Vec<String> {
        let Some(routes) = self.current_routes() else {
            return Vec::new();
        };
        match routes.resolve(category) {
            Some(route) if level >= route.minimum_level => {
                route.sinks.iter().map(|s| s.name().to_string()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Ask every sink to start delivering buffered records
    pub fn flush(&self) {
        if let Some(routes) = self.current_routes() {
            for sink in &routes.sinks {
                let result = std::panic::catch_unwind(AssertUnwindSafe(|| sink.flush()));
                if !matches!(result, Ok(Ok(()))) {
                    self.metrics.record_sink_failure();
                }
            }
        }
    }

    /// Best-effort drain of every sink, each bounded by its own timeout
    pub async fn shutdown(&self) {
        if let Some(routes) = self.current_routes() {
            for sink in &routes.sinks {
                if AssertUnwindSafe(sink.shutdown()).catch_unwind().await.is_err() {
                    self.metrics.record_sink_failure();
                }
            }
        }
    }

    /// Get the registry metrics for routing observability
    pub fn metrics(&self) -> &RegistryMetrics {
        &self.metrics
    }
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicBool;

    #[derive(Default)]
    struct RecordingSink {
        name: String,
        records: Mutex<Vec<String>>,
        drained: AtomicBool,
    }

    impl RecordingSink {
        fn named(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                ..Self::default()
            })
        }

        fn was_drained(&self) -> bool {
            self.drained.load(Ordering::SeqCst)
        }

        fn messages(&self) -> Vec<String> {
            self.records.lock().clone()
        }
    }

    #[async_trait]
    impl Sink for RecordingSink {
        fn write(&self, record: &LogRecord) -> Result<()> {
            self.records.lock().push(record.render_message());
            Ok(())
        }

        async fn shutdown(&self) {
            self.drained.store(true, Ordering::SeqCst);
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    struct PanickingSink;

    #[async_trait]
    impl Sink for PanickingSink {
        fn write(&self, _record: &LogRecord) -> Result<()> {
            panic!("sink exploded");
        }

        fn flush(&self) -> Result<()> {
            Err(LoggerError::sink("flush refused"))
        }

        async fn shutdown(&self) {
            panic!("drain exploded");
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    fn sink_map<const N: usize>(sinks: [(&str, Arc<dyn Sink>); N]) -> SinkMap {
        sinks
            .into_iter()
            .map(|(name, sink)| (name.to_string(), sink))
            .collect()
    }

    fn dyn_sink(sink: &Arc<RecordingSink>) -> Arc<dyn Sink> {
        Arc::clone(sink) as Arc<dyn Sink>
    }

    fn record(category: &[&str], level: LogLevel, message: &str) -> LogRecord {
        LogRecord::new(Category::from(category), level, message)
    }

    #[test]
    fn test_unknown_sink_leaves_registry_unconfigured() {
        let registry = LoggerRegistry::new();
        let result = registry.configure(
            SinkMap::new(),
            vec![RegistryEntry::new(["app"], LogLevel::Info).sink("missing")],
        );

        assert!(matches!(result, Err(LoggerError::UnknownSink { .. })));
        assert!(!registry.is_configured());

        let sink = RecordingSink::named("console");
        let retry = registry.configure(
            sink_map([("console", dyn_sink(&sink))]),
            vec![RegistryEntry::new(["app"], LogLevel::Info).sink("console")],
        );
        assert!(retry.is_ok());
        assert!(registry.is_configured());
    }

    #[test]
    fn test_second_configure_is_noop() {
        let first = RecordingSink::named("first");
        let second = RecordingSink::named("second");
        let registry = LoggerRegistry::new();

        registry
            .configure(
                sink_map([("first", dyn_sink(&first))]),
                vec![RegistryEntry::new(["app"], LogLevel::Debug).sink("first")],
            )
            .unwrap();
        registry
            .configure(
                sink_map([("second", dyn_sink(&second))]),
                vec![RegistryEntry::new(["app"], LogLevel::Debug).sink("second")],
            )
            .unwrap();

        registry.dispatch(&record(&["app"], LogLevel::Info, "hello"));
        assert_eq!(first.messages(), vec!["hello"]);
        assert!(second.messages().is_empty());
    }

    #[test]
    fn test_concurrent_configure_rejected() {
        let registry = LoggerRegistry::new();
        registry.state.store(CONFIGURING, Ordering::Release);

        let result = registry.configure(SinkMap::new(), Vec::new());
        assert!(matches!(result, Err(LoggerError::ConcurrentConfiguration)));
    }

    #[test]
    fn test_duplicate_entry_rejected() {
        let sink = RecordingSink::named("console");
        let registry = LoggerRegistry::new();
        let result = registry.configure(
            sink_map([("console", dyn_sink(&sink))]),
            vec![
                RegistryEntry::new(["app"], LogLevel::Info).sink("console"),
                RegistryEntry::new("app", LogLevel::Error).sink("console"),
            ],
        );
        assert!(matches!(result, Err(LoggerError::DuplicateEntry { .. })));
        assert!(!registry.is_configured());
    }

    #[test]
    fn test_longest_prefix_resolution() {
        let sink = RecordingSink::named("console");
        let registry = LoggerRegistry::new();
        registry
            .configure(
                sink_map([("console", dyn_sink(&sink))]),
                vec![
                    RegistryEntry::new(["app"], LogLevel::Info).sink("console"),
                    RegistryEntry::new(["app", "auth"], LogLevel::Error).sink("console"),
                ],
            )
            .unwrap();

        registry.dispatch(&record(&["app", "auth", "oauth"], LogLevel::Warning, "dropped"));
        registry.dispatch(&record(&["app", "billing"], LogLevel::Warning, "delivered"));

        assert_eq!(sink.messages(), vec!["delivered"]);
        assert_eq!(registry.metrics().filtered(), 1);
        assert_eq!(registry.metrics().dispatched(), 1);
    }

    #[test]
    fn test_unmatched_category_dropped() {
        let sink = RecordingSink::named("console");
        let registry = LoggerRegistry::new();
        registry
            .configure(
                sink_map([("console", dyn_sink(&sink))]),
                vec![RegistryEntry::new(["app"], LogLevel::Debug).sink("console")],
            )
            .unwrap();

        registry.dispatch(&record(&["worker"], LogLevel::Fatal, "nobody hears"));

        assert!(sink.messages().is_empty());
        assert_eq!(registry.metrics().unrouted(), 1);
    }

    #[test]
    fn test_root_entry_catches_everything_else() {
        let app = RecordingSink::named("app");
        let root = RecordingSink::named("root");
        let registry = LoggerRegistry::new();
        registry
            .configure(
                sink_map([("app", dyn_sink(&app)), ("root", dyn_sink(&root))]),
                vec![
                    RegistryEntry::new(["app"], LogLevel::Debug).sink("app"),
                    RegistryEntry::new(Category::root(), LogLevel::Warning).sink("root"),
                ],
            )
            .unwrap();

        registry.dispatch(&record(&["app", "db"], LogLevel::Debug, "to app"));
        registry.dispatch(&record(&["worker"], LogLevel::Warning, "to root"));
        registry.dispatch(&record(&["worker"], LogLevel::Info, "filtered"));

        assert_eq!(app.messages(), vec!["to app"]);
        assert_eq!(root.messages(), vec!["to root"]);
    }

    #[test]
    fn test_dispatch_before_configure_is_dropped() {
        let registry = LoggerRegistry::new();
        registry.dispatch(&record(&["app"], LogLevel::Error, "early"));
        assert_eq!(registry.metrics().unrouted(), 1);
    }

    #[test]
    fn test_panicking_sink_isolated() {
        let good = RecordingSink::named("good");
        let registry = LoggerRegistry::new();
        registry
            .configure(
                sink_map([
                    ("bad", Arc::new(PanickingSink) as Arc<dyn Sink>),
                    ("good", dyn_sink(&good)),
                ]),
                vec![RegistryEntry::new(["app"], LogLevel::Debug).sinks(["bad", "good"])],
            )
            .unwrap();

        registry.dispatch(&record(&["app"], LogLevel::Info, "survives"));

        assert_eq!(good.messages(), vec!["survives"]);
        assert_eq!(registry.metrics().sink_failures(), 1);
    }

    #[test]
    fn test_route_reports_sink_names() {
        let registry = LoggerRegistry::new();
        registry
            .configure(
                sink_map([("console", dyn_sink(&RecordingSink::named("console")))]),
                vec![RegistryEntry::new(["app"], LogLevel::Info).sink("console")],
            )
            .unwrap();

        assert_eq!(
            registry.route(&Category::from(["app", "x"]), LogLevel::Info),
            vec!["console".to_string()]
        );
        assert!(registry.route(&Category::from(["app"]), LogLevel::Debug).is_empty());
    }

    fn broken_then_good() -> (LoggerRegistry, Arc<RecordingSink>) {
        let good = RecordingSink::named("good");
        let registry = LoggerRegistry::new();
        registry
            .configure(
                sink_map([
                    ("bad", Arc::new(PanickingSink) as Arc<dyn Sink>),
                    ("good", dyn_sink(&good)),
                ]),
                vec![RegistryEntry::new(["app"], LogLevel::Debug).sinks(["bad", "good"])],
            )
            .unwrap();
        (registry, good)
    }

    #[test]
    fn test_flush_counts_failing_sinks() {
        let (registry, _good) = broken_then_good();
        registry.flush();
        assert_eq!(registry.metrics().sink_failures(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_survives_panicking_sink() {
        let (registry, good) = broken_then_good();
        registry.shutdown().await;

        assert!(good.was_drained());
        assert_eq!(registry.metrics().sink_failures(), 1);
    }
}
