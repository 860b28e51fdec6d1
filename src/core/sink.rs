//! Sink trait for log delivery backends

use super::{error::Result, log_record::LogRecord};
use async_trait::async_trait;

/// A delivery backend receiving one record at a time.
///
/// `write` is called synchronously on the emitting thread and must return
/// quickly; sinks that talk to the network hand the I/O to a background
/// task and own whatever buffering they need behind interior mutability.
///
/// # Example
///
/// ```no_run
/// use log_fanout::core::{LogRecord, Result, Sink};
/// use async_trait::async_trait;
///
/// struct CountingSink(std::sync::atomic::AtomicUsize);
///
/// #[async_trait]
/// impl Sink for CountingSink {
///     fn write(&self, _record: &LogRecord) -> Result<()> {
///         self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
///         Ok(())
///     }
///
///     fn name(&self) -> &str {
///         "counting"
///     }
/// }
/// ```
#[async_trait]
pub trait Sink: Send + Sync {
    /// Accept one record
    fn write(&self, record: &LogRecord) -> Result<()>;

    /// Start delivering anything buffered, without waiting for it
    fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Deliver anything buffered and wait for it, bounded by the sink's own timeout
    async fn shutdown(&self) {}

    /// Get the sink name
    fn name(&self) -> &str;
}
