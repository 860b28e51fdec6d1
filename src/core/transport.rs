//! HTTP transport used by network-backed sinks
//!
//! Sinks build an [`HttpRequest`] synchronously and hand it to a detached
//! task that calls [`HttpTransport::send`]. The trait is the seam tests use
//! to observe outbound traffic without a network.

use super::error::{LoggerError, Result};
use super::metrics::DeliveryMetrics;
use async_trait::async_trait;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use parking_lot::Mutex;
use serde::Serialize;
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;

/// Default budget for a single outbound request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A fully built outbound POST
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Build a JSON POST to `url`
    pub fn json<T: Serialize + ?Sized>(url: impl Into<String>, payload: &T) -> Result<Self> {
        Ok(Self {
            url: url.into(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: serde_json::to_vec(payload)?,
        })
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Gzip the body and mark it with `Content-Encoding: gzip`
    pub fn gzip(mut self) -> Result<Self> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&self.body)?;
        self.body = encoder.finish()?;
        Ok(self.header("Content-Encoding", "gzip"))
    }

    /// Case-insensitive header lookup
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Decode the body as JSON, inflating it first when gzip-encoded
    pub fn json_body(&self) -> Result<serde_json::Value> {
        if self.header_value("Content-Encoding") == Some("gzip") {
            let mut decoded = Vec::new();
            GzDecoder::new(self.body.as_slice()).read_to_end(&mut decoded)?;
            Ok(serde_json::from_slice(&decoded)?)
        } else {
            Ok(serde_json::from_slice(&self.body)?)
        }
    }
}

/// Asynchronous HTTP POST capability
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send one request; `Ok` only for a success status
    async fn send(&self, request: HttpRequest) -> Result<()>;
}

/// Send `request` within `timeout` and account for the outcome.
///
/// Every failure ends here: the records carried by the request are counted
/// as dropped and nothing is retried or logged.
pub(crate) async fn deliver(
    transport: Arc<dyn HttpTransport>,
    request: HttpRequest,
    timeout: Duration,
    records: usize,
    metrics: Arc<DeliveryMetrics>,
) -> bool {
    match tokio::time::timeout(timeout, transport.send(request)).await {
        Ok(Ok(())) => {
            metrics.record_sent(records);
            true
        }
        Ok(Err(_)) | Err(_) => {
            metrics.record_failed(records);
            false
        }
    }
}

/// In-memory transport recording every request it is given.
///
/// Useful for tests and dry runs. Requests are recorded even when the
/// transport is set to fail, so attempts can be counted.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    requests: Mutex<Vec<HttpRequest>>,
    failure_status: Mutex<Option<u16>>,
}

impl MemoryTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A transport answering every request with `status`
    pub fn failing(status: u16) -> Arc<Self> {
        let transport = Self::default();
        *transport.failure_status.lock() = Some(status);
        Arc::new(transport)
    }

    /// Switch between failing with `status` and succeeding (`None`)
    pub fn set_failure(&self, status: Option<u16>) {
        *self.failure_status.lock() = status;
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Every recorded body decoded as JSON
    pub fn json_bodies(&self) -> Vec<serde_json::Value> {
        self.requests
            .lock()
            .iter()
            .filter_map(|r| r.json_body().ok())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.lock().is_empty()
    }
}

#[async_trait]
impl HttpTransport for MemoryTransport {
    async fn send(&self, request: HttpRequest) -> Result<()> {
        let url = request.url.clone();
        self.requests.lock().push(request);
        match *self.failure_status.lock() {
            Some(status) => Err(LoggerError::delivery(url, status)),
            None => Ok(()),
        }
    }
}

/// `reqwest`-backed transport
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl ReqwestTransport {
    /// Create a transport whose requests are bounded by `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<()> {
        let mut builder = self.client.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.body(request.body).send().await.map_err(|e| {
            if e.is_timeout() {
                LoggerError::timeout(request.url.clone())
            } else {
                LoggerError::Http(e)
            }
        })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(LoggerError::delivery(request.url, status.as_u16()))
        }
    }
}
