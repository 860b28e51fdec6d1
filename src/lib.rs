//! # log_fanout
//!
//! A process-wide structured logging pipeline that routes leveled,
//! categorized records to independently behaving sinks.
//!
//! ## Features
//!
//! - **Category routing**: longest-prefix match with per-entry level thresholds
//! - **Console**: synchronous text, JSON or logfmt output
//! - **Aggregator push**: batches flushed on size or time, one stream per push
//! - **Webhook alerts**: error and fatal only, rate limited per category
//! - **Error tracking**: exception or message events with email and secret scrubbing
//! - **Non-blocking**: network delivery runs on detached tokio tasks and never
//!   surfaces errors to the caller

pub mod core;
pub mod macros;
pub mod pipeline;
pub mod sinks;
pub mod tracker;

pub mod prelude {
    #[cfg(feature = "console")]
    pub use crate::sinks::ConsoleSink;
    pub use crate::sinks::{
        AggregatorConfig, AlertConfig, BatchingNetworkSink, FilteringForwardSink,
        RateLimitedAlertSink,
    };
    pub use crate::core::{
        Category, ErrorValue, FieldValue, LogLevel, LogRecord, Logger, LoggerError,
        LoggerRegistry, Properties, RegistryEntry, Result, Settings, Sink, SinkMap,
    };
}

pub use core::{
    Category, DeliveryMetrics, ErrorValue, FieldValue, HttpRequest, HttpTransport, LogLevel,
    LogRecord, Logger, LoggerError, LoggerRegistry, MemoryTransport, Message, OutputFormat,
    Properties, RegistryEntry, RegistryMetrics, Result, Settings, Sink, SinkMap, TimestampFormat,
};
#[cfg(feature = "http")]
pub use core::ReqwestTransport;
