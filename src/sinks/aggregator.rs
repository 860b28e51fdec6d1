//! Batching sink for a log-aggregation push API
//!
//! Records are buffered and pushed as a single stream either when the batch
//! reaches `batch_size` or when the flush interval elapses after the first
//! buffered record, whichever comes first.

use crate::core::transport::deliver;
use crate::core::{
    DeliveryMetrics, HttpRequest, HttpTransport, LogRecord, LoggerError, Result, Sink,
    DEFAULT_REQUEST_TIMEOUT,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(5_000);

/// Aggregator endpoint and batching policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Full push URL, e.g. `http://loki:3100/loki/api/v1/push`
    pub endpoint: String,
    /// Sent as `X-API-Key` when present
    pub api_key: Option<String>,
    /// Static stream labels
    pub labels: BTreeMap<String, String>,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub request_timeout: Duration,
    /// Gzip request bodies
    pub compress: bool,
}

impl AggregatorConfig {
    /// Config with `job`, `service` and `environment` labels and default batching
    pub fn new(
        endpoint: impl Into<String>,
        service: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        let service = service.into();
        let mut labels = BTreeMap::new();
        labels.insert("job".to_string(), service.clone());
        labels.insert("service".to_string(), service);
        labels.insert("environment".to_string(), environment.into());

        Self {
            endpoint: endpoint.into(),
            api_key: None,
            labels,
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            compress: false,
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Add or replace a static label
    #[must_use]
    pub fn with_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_flush_interval(mut self, flush_interval: Duration) -> Self {
        self.flush_interval = flush_interval;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    fn validate(&self) -> Result<()> {
        url::Url::parse(&self.endpoint).map_err(|e| {
            LoggerError::config("aggregator", format!("invalid endpoint '{}': {}", self.endpoint, e))
        })?;
        if self.batch_size == 0 {
            return Err(LoggerError::config("aggregator", "batch_size must be at least 1"));
        }
        if self.flush_interval.is_zero() {
            return Err(LoggerError::config("aggregator", "flush_interval must be positive"));
        }
        Ok(())
    }
}

/// One pushed value: nanosecond timestamp string and the JSON line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushEntry(pub String, pub String);

impl PushEntry {
    pub fn from_record(record: &LogRecord) -> Self {
        Self(record.timestamp_nanos(), record.to_line())
    }
}

#[derive(Serialize)]
struct PushPayload<'a> {
    streams: [PushStream<'a>; 1],
}

#[derive(Serialize)]
struct PushStream<'a> {
    stream: &'a BTreeMap<String, String>,
    values: &'a [PushEntry],
}

struct PendingTimer {
    id: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct BatchState {
    pending: Vec<PushEntry>,
    timer: Option<PendingTimer>,
    next_timer_id: u64,
}

impl BatchState {
    /// Swap out the batch and cancel the timer that would have flushed it
    fn take(&mut self) -> Vec<PushEntry> {
        if let Some(timer) = self.timer.take() {
            timer.handle.abort();
        }
        std::mem::take(&mut self.pending)
    }
}

struct Shared {
    config: AggregatorConfig,
    transport: Arc<dyn HttpTransport>,
    state: Mutex<BatchState>,
    runtime: Handle,
    metrics: Arc<DeliveryMetrics>,
}

impl Shared {
    fn push(self: &Arc<Self>, entry: PushEntry) {
        let ready = {
            let mut state = self.state.lock();
            state.pending.push(entry);
            if state.pending.len() >= self.config.batch_size {
                Some(state.take())
            } else {
                if state.timer.is_none() {
                    self.schedule(&mut state);
                }
                None
            }
        };

        if let Some(batch) = ready {
            self.dispatch(batch);
        }
    }

    fn schedule(self: &Arc<Self>, state: &mut BatchState) {
        let id = state.next_timer_id;
        state.next_timer_id = state.next_timer_id.wrapping_add(1);

        let shared: Weak<Self> = Arc::downgrade(self);
        let interval = self.config.flush_interval;
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(interval).await;
            if let Some(shared) = shared.upgrade() {
                shared.on_timer(id);
            }
        });

        state.timer = Some(PendingTimer { id, handle });
    }

    fn on_timer(&self, id: u64) {
        let batch = {
            let mut state = self.state.lock();
            if state.timer.as_ref().map(|t| t.id) != Some(id) {
                return;
            }
            state.timer = None;
            std::mem::take(&mut state.pending)
        };
        self.dispatch(batch);
    }

    fn build_request(&self, batch: &[PushEntry]) -> Result<HttpRequest> {
        let payload = PushPayload {
            streams: [PushStream {
                stream: &self.config.labels,
                values: batch,
            }],
        };

        let mut request = HttpRequest::json(&self.config.endpoint, &payload)?;
        if let Some(ref key) = self.config.api_key {
            request = request.header("X-API-Key", key);
        }
        if self.config.compress {
            request = request.gzip()?;
        }
        Ok(request)
    }

    /// Hand `batch` to a detached delivery task
    fn dispatch(&self, batch: Vec<PushEntry>) {
        if batch.is_empty() {
            return;
        }

        match self.build_request(&batch) {
            Ok(request) => {
                self.runtime.spawn(deliver(
                    Arc::clone(&self.transport),
                    request,
                    self.config.request_timeout,
                    batch.len(),
                    Arc::clone(&self.metrics),
                ));
            }
            Err(_) => self.metrics.record_failed(batch.len()),
        }
    }

    async fn drain(&self) {
        let batch = self.state.lock().take();
        if batch.is_empty() {
            return;
        }

        match self.build_request(&batch) {
            Ok(request) => {
                deliver(
                    Arc::clone(&self.transport),
                    request,
                    self.config.request_timeout,
                    batch.len(),
                    Arc::clone(&self.metrics),
                )
                .await;
            }
            Err(_) => self.metrics.record_failed(batch.len()),
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let batch = self.state.get_mut().take();
        self.dispatch(batch);
    }
}

/// Sink pushing batches of records to a log-aggregation endpoint
///
/// Writes never block on the network: a full batch or an expired timer hands
/// the taken entries to a task on the captured tokio runtime. Failed pushes
/// are counted in [`DeliveryMetrics`] and otherwise forgotten.
///
/// # Example
///
/// ```no_run
/// use log_fanout::sinks::{AggregatorConfig, BatchingNetworkSink};
/// use log_fanout::ReqwestTransport;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # async fn run() -> log_fanout::Result<()> {
/// let config = AggregatorConfig::new("http://loki:3100/loki/api/v1/push", "storefront", "production")
///     .with_batch_size(50)
///     .with_flush_interval(Duration::from_secs(2));
/// let transport = Arc::new(ReqwestTransport::new(config.request_timeout)?);
/// let sink = BatchingNetworkSink::new(config, transport)?;
/// # Ok(())
/// # }
/// ```
pub struct BatchingNetworkSink {
    shared: Arc<Shared>,
}

impl BatchingNetworkSink {
    /// Create a sink bound to the current tokio runtime
    ///
    /// # Errors
    ///
    /// Returns an error when called outside a runtime or when the config is invalid
    pub fn new(config: AggregatorConfig, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        let runtime =
            Handle::try_current().map_err(|_| LoggerError::missing_runtime("aggregator"))?;
        Self::with_runtime(config, transport, runtime)
    }

    /// Create a sink whose timers and deliveries run on `runtime`
    pub fn with_runtime(
        config: AggregatorConfig,
        transport: Arc<dyn HttpTransport>,
        runtime: Handle,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                transport,
                state: Mutex::new(BatchState::default()),
                runtime,
                metrics: Arc::new(DeliveryMetrics::new()),
            }),
        })
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.shared.config
    }

    /// Number of records waiting for the next flush
    pub fn pending(&self) -> usize {
        self.shared.state.lock().pending.len()
    }

    pub fn has_pending_timer(&self) -> bool {
        self.shared.state.lock().timer.is_some()
    }

    pub fn metrics(&self) -> &DeliveryMetrics {
        &self.shared.metrics
    }
}

#[async_trait]
impl Sink for BatchingNetworkSink {
    fn write(&self, record: &LogRecord) -> Result<()> {
        self.shared.push(PushEntry::from_record(record));
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let batch = self.shared.state.lock().take();
        self.shared.dispatch(batch);
        Ok(())
    }

    async fn shutdown(&self) {
        self.shared.drain().await;
    }

    fn name(&self) -> &str {
        "aggregator"
    }
}
