//! Pipeline metrics for observability
//!
//! The pipeline never logs about itself; these counters are how operators
//! see routing gaps and lost deliveries.

use std::sync::atomic::{AtomicU64, Ordering};

/// Routing counters kept by the registry
///
/// # Example
///
/// ```
/// use log_fanout::RegistryMetrics;
///
/// let metrics = RegistryMetrics::new();
/// metrics.record_dispatched();
/// metrics.record_unrouted();
///
/// assert_eq!(metrics.dispatched(), 1);
/// assert_eq!(metrics.unrouted(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RegistryMetrics {
    /// Records handed to at least one sink
    dispatched: AtomicU64,

    /// Records with no matching registry entry
    unrouted: AtomicU64,

    /// Records below their entry's minimum level
    filtered: AtomicU64,

    /// Sink writes that returned an error or panicked
    sink_failures: AtomicU64,
}

impl RegistryMetrics {
    pub const fn new() -> Self {
        Self {
            dispatched: AtomicU64::new(0),
            unrouted: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn unrouted(&self) -> u64 {
        self.unrouted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sink_failures(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dispatched(&self) -> u64 {
        self.dispatched.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_unrouted(&self) -> u64 {
        self.unrouted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sink_failure(&self) -> u64 {
        self.sink_failures.fetch_add(1, Ordering::Relaxed)
    }
}

/// Delivery counters kept by each network-backed sink
#[derive(Debug, Default)]
pub struct DeliveryMetrics {
    /// Requests acknowledged with a success status
    requests_sent: AtomicU64,

    /// Requests that failed, timed out or got a non-success status
    requests_failed: AtomicU64,

    /// Records carried by successful requests
    records_sent: AtomicU64,

    /// Records carried by failed requests
    records_dropped: AtomicU64,

    /// Records withheld by rate limiting
    suppressed: AtomicU64,

    /// Records ignored because of their level
    filtered: AtomicU64,
}

impl DeliveryMetrics {
    pub const fn new() -> Self {
        Self {
            requests_sent: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            records_sent: AtomicU64::new(0),
            records_dropped: AtomicU64::new(0),
            suppressed: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn requests_sent(&self) -> u64 {
        self.requests_sent.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn requests_failed(&self) -> u64 {
        self.requests_failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn records_sent(&self) -> u64 {
        self.records_sent.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn records_dropped(&self) -> u64 {
        self.records_dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn suppressed(&self) -> u64 {
        self.suppressed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    /// Record a successful request carrying `records` records
    pub fn record_sent(&self, records: usize) {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
        self.records_sent.fetch_add(records as u64, Ordering::Relaxed);
    }

    /// Record a failed request carrying `records` records
    pub fn record_failed(&self, records: usize) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
        self.records_dropped.fetch_add(records as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_suppressed(&self) -> u64 {
        self.suppressed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered.fetch_add(1, Ordering::Relaxed)
    }

    /// Get drop rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if no records have been delivered or dropped.
    pub fn drop_rate(&self) -> f64 {
        let sent = self.records_sent();
        let dropped = self.records_dropped();
        let total = sent + dropped;

        if total == 0 {
            0.0
        } else {
            (dropped as f64 / total as f64) * 100.0
        }
    }
}
