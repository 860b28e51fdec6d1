//! Startup wiring from [`Settings`] to a configured registry
//!
//! Backends whose URL or DSN is missing are not registered, and no entry
//! routes to them. The resulting table is:
//!
//! - `app` at the configured minimum level, routed to every registered sink
//! - the root category at `warning`, routed to the console

use crate::core::{
    Category, HttpTransport, LogLevel, Logger, LoggerRegistry, RegistryEntry, Result, Settings,
    SinkMap,
};
#[cfg(feature = "console")]
use crate::sinks::ConsoleSink;
use crate::sinks::{
    AggregatorConfig, AlertConfig, BatchingNetworkSink, FilteringForwardSink, RateLimitedAlertSink,
};
use crate::tracker::{TrackerClient, TrackerConfig};
use std::sync::{Arc, OnceLock};

pub const CONSOLE_SINK: &str = "console";
pub const AGGREGATOR_SINK: &str = "aggregator";
pub const ALERT_SINK: &str = "alert";
pub const TRACKER_SINK: &str = "tracker";

/// Category prefix that receives every registered sink
pub const APP_CATEGORY: &str = "app";

static GLOBAL: OnceLock<Arc<LoggerRegistry>> = OnceLock::new();

fn aggregator_config(settings: &Settings, url: &str) -> AggregatorConfig {
    let mut config = AggregatorConfig::new(url, &settings.service_name, &settings.environment)
        .with_batch_size(settings.batch_size)
        .with_flush_interval(settings.flush_interval())
        .with_request_timeout(settings.request_timeout())
        .with_compression(settings.compress);
    if let Some(ref job) = settings.job {
        config = config.with_label("job", job);
    }
    if let Some(ref key) = settings.aggregator_api_key {
        config = config.with_api_key(key);
    }
    config
}

fn tracker_config(settings: &Settings, dsn: &str) -> TrackerConfig {
    let mut config = TrackerConfig::new(dsn, &settings.environment)
        .with_environment_capture(settings.capture_environment)
        .with_request_timeout(settings.request_timeout());
    if let Some(ref release) = settings.release {
        config = config.with_release(release);
    }
    config
}

/// Build the sink map and registry entries described by `settings`.
///
/// Network sinks are bound to the current tokio runtime and share `transport`.
///
/// # Errors
///
/// Returns a configuration error for an invalid URL or DSN, a zero batch
/// size, or when a network sink is requested outside a tokio runtime.
pub fn build_sinks(
    settings: &Settings,
    transport: Arc<dyn HttpTransport>,
) -> Result<(SinkMap, Vec<RegistryEntry>)> {
    let mut sinks = SinkMap::new();

    #[cfg(feature = "console")]
    if settings.console {
        sinks.insert(CONSOLE_SINK.to_string(), Arc::new(ConsoleSink::new()));
    }

    if let Some(ref url) = settings.aggregator_url {
        let sink = BatchingNetworkSink::new(aggregator_config(settings, url), Arc::clone(&transport))?;
        sinks.insert(AGGREGATOR_SINK.to_string(), Arc::new(sink));
    }

    if let Some(ref url) = settings.alert_webhook_url {
        let config = AlertConfig::new(url)
            .with_username(&settings.alert_username)
            .with_rate_limit(settings.rate_limit())
            .with_request_timeout(settings.request_timeout());
        let sink = RateLimitedAlertSink::new(config, Arc::clone(&transport))?;
        sinks.insert(ALERT_SINK.to_string(), Arc::new(sink));
    }

    if let Some(ref dsn) = settings.error_tracker_dsn {
        let client = TrackerClient::new(tracker_config(settings, dsn), Arc::clone(&transport))?;
        sinks.insert(
            TRACKER_SINK.to_string(),
            Arc::new(FilteringForwardSink::new(Arc::new(client))),
        );
    }

    let mut entries = vec![RegistryEntry::new(APP_CATEGORY, settings.minimum_level())
        .sinks(sinks.keys().cloned())];
    if sinks.contains_key(CONSOLE_SINK) {
        entries.push(RegistryEntry::new(Category::root(), LogLevel::Warning).sink(CONSOLE_SINK));
    }

    Ok((sinks, entries))
}

/// Configure `registry` from `settings`, sending requests through `transport`
pub fn init_with_transport(
    registry: &LoggerRegistry,
    settings: &Settings,
    transport: Arc<dyn HttpTransport>,
) -> Result<()> {
    if registry.is_configured() {
        return Ok(());
    }
    let (sinks, entries) = build_sinks(settings, transport)?;
    registry.configure(sinks, entries)
}

/// Configure `registry` from `settings` with an HTTP client transport
#[cfg(feature = "http")]
pub fn init(registry: &LoggerRegistry, settings: &Settings) -> Result<()> {
    let transport = crate::core::ReqwestTransport::new(settings.request_timeout())?;
    init_with_transport(registry, settings, Arc::new(transport))
}

/// The process-wide registry; unconfigured until [`init_global`] succeeds
pub fn global() -> &'static Arc<LoggerRegistry> {
    GLOBAL.get_or_init(|| Arc::new(LoggerRegistry::new()))
}

/// Configure the process-wide registry once
///
/// # Example
///
/// ```no_run
/// use log_fanout::{pipeline, Settings};
///
/// #[tokio::main]
/// async fn main() -> log_fanout::Result<()> {
///     pipeline::init_global(&Settings::load()?)?;
///
///     pipeline::logger(["app", "startup"]).info("ready");
///     pipeline::shutdown().await;
///     Ok(())
/// }
/// ```
#[cfg(feature = "http")]
pub fn init_global(settings: &Settings) -> Result<&'static Arc<LoggerRegistry>> {
    let registry = global();
    init(registry, settings)?;
    Ok(registry)
}

/// Handle on the process-wide registry
pub fn logger(category: impl Into<Category>) -> Logger {
    global().logger(category)
}

/// Drain every sink of the process-wide registry
pub async fn shutdown() {
    global().shutdown().await;
}
