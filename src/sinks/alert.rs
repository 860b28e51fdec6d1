//! Rate-limited webhook alerts
//!
//! Only error and fatal records raise an alert, and each category may alert
//! at most once per `rate_limit` window. Suppressed records are counted and
//! never queued.

use crate::core::transport::deliver;
use crate::core::{
    DeliveryMetrics, HttpRequest, HttpTransport, LogLevel, LogRecord, LoggerError, Result, Sink,
    DEFAULT_REQUEST_TIMEOUT,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::Instant;

pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(30_000);
pub const DEFAULT_USERNAME: &str = "Log Alerts";

/// Embed description limit, in characters
pub const MAX_DESCRIPTION_CHARS: usize = 2000;
pub const MAX_FIELDS: usize = 5;
pub const MAX_FIELD_NAME_CHARS: usize = 256;
pub const MAX_FIELD_VALUE_CHARS: usize = 1024;

pub const FATAL_COLOR: u32 = 0x8B_00_00;
pub const ERROR_COLOR: u32 = 0xE7_4C_3C;

/// Webhook endpoint and cooldown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertConfig {
    pub webhook_url: String,
    /// Display name of the posting bot
    pub username: String,
    /// Minimum gap between two alerts for the same category
    pub rate_limit: Duration,
    pub request_timeout: Duration,
}

impl AlertConfig {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            username: DEFAULT_USERNAME.to_string(),
            rate_limit: DEFAULT_RATE_LIMIT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    #[must_use]
    pub fn with_rate_limit(mut self, rate_limit: Duration) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    username: &'a str,
    embeds: [Embed; 1],
}

#[derive(Debug, Serialize)]
struct Embed {
    title: String,
    description: String,
    color: u32,
    timestamp: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<EmbedField>,
}

#[derive(Debug, Serialize)]
struct EmbedField {
    name: String,
    value: String,
    inline: bool,
}

/// Cut `text` to at most `max` characters, marking the cut with an ellipsis
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn embed_color(level: LogLevel) -> u32 {
    match level {
        LogLevel::Fatal => FATAL_COLOR,
        _ => ERROR_COLOR,
    }
}

fn build_embed(record: &LogRecord) -> Embed {
    let fields = record
        .properties
        .iter()
        .take(MAX_FIELDS)
        .map(|(name, value)| {
            let rendered = value.render();
            EmbedField {
                name: truncate(name, MAX_FIELD_NAME_CHARS),
                value: if rendered.is_empty() {
                    "-".to_string()
                } else {
                    truncate(&rendered, MAX_FIELD_VALUE_CHARS)
                },
                inline: true,
            }
        })
        .collect();

    Embed {
        title: format!("{} in {}", record.level.label(), record.category),
        description: truncate(&record.render_message(), MAX_DESCRIPTION_CHARS),
        color: embed_color(record.level),
        timestamp: record.timestamp_iso(),
        fields,
    }
}

/// Sink posting error and fatal records to a chat webhook
///
/// The check-and-set of a category's last alert instant happens under one
/// lock, so concurrent writers in the same category produce one alert per
/// window.
pub struct RateLimitedAlertSink {
    config: AlertConfig,
    transport: Arc<dyn HttpTransport>,
    last_sent: Mutex<HashMap<String, Instant>>,
    runtime: Handle,
    metrics: Arc<DeliveryMetrics>,
}

impl RateLimitedAlertSink {
    /// Create a sink bound to the current tokio runtime
    pub fn new(config: AlertConfig, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| LoggerError::missing_runtime("alert"))?;
        Self::with_runtime(config, transport, runtime)
    }

    pub fn with_runtime(
        config: AlertConfig,
        transport: Arc<dyn HttpTransport>,
        runtime: Handle,
    ) -> Result<Self> {
        url::Url::parse(&config.webhook_url).map_err(|e| {
            LoggerError::config("alert", format!("invalid webhook URL '{}': {}", config.webhook_url, e))
        })?;

        Ok(Self {
            config,
            transport,
            last_sent: Mutex::new(HashMap::new()),
            runtime,
            metrics: Arc::new(DeliveryMetrics::new()),
        })
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    pub fn metrics(&self) -> &DeliveryMetrics {
        &self.metrics
    }

    /// Claim the alert slot for `key`; `false` while the cooldown is running
    fn try_acquire(&self, key: String, now: Instant) -> bool {
        let mut last_sent = self.last_sent.lock();
        match last_sent.get(&key) {
            Some(last) if now.duration_since(*last) < self.config.rate_limit => false,
            _ => {
                last_sent.insert(key, now);
                true
            }
        }
    }

    fn build_request(&self, record: &LogRecord) -> Result<HttpRequest> {
        let payload = WebhookPayload {
            username: &self.config.username,
            embeds: [build_embed(record)],
        };
        HttpRequest::json(&self.config.webhook_url, &payload)
    }
}

#[async_trait]
impl Sink for RateLimitedAlertSink {
    fn write(&self, record: &LogRecord) -> Result<()> {
        if !record.level.is_severe() {
            self.metrics.record_filtered();
            return Ok(());
        }

        if !self.try_acquire(record.category.dotted(), Instant::now()) {
            self.metrics.record_suppressed();
            return Ok(());
        }

        match self.build_request(record) {
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
        Ok(())
    }

    fn name(&self) -> &str {
        "alert"
    }
}
