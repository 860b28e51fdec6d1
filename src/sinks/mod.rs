//! Sink implementations for log delivery

pub mod aggregator;
pub mod alert;
#[cfg(feature = "console")]
pub mod console;
pub mod forward;

pub use aggregator::{AggregatorConfig, BatchingNetworkSink, PushEntry};
pub use alert::{AlertConfig, RateLimitedAlertSink};
#[cfg(feature = "console")]
pub use console::ConsoleSink;
pub use forward::FilteringForwardSink;
