//! Error-tracker client

use super::dsn::Dsn;
use super::event::{EventContexts, EventLevel, TrackerEvent};
use super::scrub::scrub_event;
use crate::core::transport::deliver;
use crate::core::{
    DeliveryMetrics, ErrorValue, HttpRequest, HttpTransport, LoggerError, Result,
    DEFAULT_REQUEST_TIMEOUT,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    pub dsn: String,
    pub environment: String,
    pub release: Option<String>,
    /// Attach a scrubbed snapshot of the process environment to every event
    pub capture_environment: bool,
    pub request_timeout: Duration,
}

impl TrackerConfig {
    pub fn new(dsn: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            dsn: dsn.into(),
            environment: environment.into(),
            release: None,
            capture_environment: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_release(mut self, release: impl Into<String>) -> Self {
        self.release = Some(release.into());
        self
    }

    #[must_use]
    pub fn with_environment_capture(mut self, capture: bool) -> Self {
        self.capture_environment = capture;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Posts events to an error tracker's store endpoint
///
/// Every event goes through [`TrackerClient::prepare`], which stamps the
/// environment and release and then scrubs it, before it is sent.
pub struct TrackerClient {
    dsn: Dsn,
    config: TrackerConfig,
    runtime_env: BTreeMap<String, String>,
    transport: Arc<dyn HttpTransport>,
    runtime: Handle,
    metrics: Arc<DeliveryMetrics>,
}

impl TrackerClient {
    /// Create a client bound to the current tokio runtime
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed DSN or when called outside a runtime
    pub fn new(config: TrackerConfig, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| LoggerError::missing_runtime("tracker"))?;
        Self::with_runtime(config, transport, runtime)
    }

    pub fn with_runtime(
        config: TrackerConfig,
        transport: Arc<dyn HttpTransport>,
        runtime: Handle,
    ) -> Result<Self> {
        let dsn: Dsn = config.dsn.parse()?;
        let runtime_env = if config.capture_environment {
            std::env::vars().collect()
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            dsn,
            config,
            runtime_env,
            transport,
            runtime,
            metrics: Arc::new(DeliveryMetrics::new()),
        })
    }

    /// Replace the environment snapshot attached to events
    #[must_use]
    pub fn with_runtime_env(mut self, runtime_env: BTreeMap<String, String>) -> Self {
        self.runtime_env = runtime_env;
        self
    }

    pub fn dsn(&self) -> &Dsn {
        &self.dsn
    }

    pub fn metrics(&self) -> &DeliveryMetrics {
        &self.metrics
    }

    /// Stamp and scrub an event exactly as it will be sent
    pub fn prepare(&self, mut event: TrackerEvent) -> TrackerEvent {
        event.environment = self.config.environment.clone();
        if event.release.is_none() {
            event.release = self.config.release.clone();
        }
        if !self.runtime_env.is_empty() {
            event.contexts = Some(EventContexts {
                runtime_env: self.runtime_env.clone(),
            });
        }
        scrub_event(&mut event);
        event
    }

    /// Send an event in the background; returns its id
    pub fn capture(&self, event: TrackerEvent) -> String {
        let event = self.prepare(event);
        let event_id = event.event_id.clone();

        let request = HttpRequest::json(self.dsn.store_url(), &event)
            .map(|r| r.header("X-Sentry-Auth", self.dsn.auth_header()));
        match request {
            Ok(request) => {
                self.runtime.spawn(deliver(
                    Arc::clone(&self.transport),
                    request,
                    self.config.request_timeout,
                    1,
                    Arc::clone(&self.metrics),
                ));
            }
            Err(_) => self.metrics.record_failed(1),
        }
        event_id
    }

    pub fn capture_message(&self, level: EventLevel, message: impl Into<String>) -> String {
        self.capture(TrackerEvent::message(level, message))
    }

    pub fn capture_exception(&self, level: EventLevel, error: &ErrorValue) -> String {
        self.capture(TrackerEvent::exception(level, error))
    }
}
