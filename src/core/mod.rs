//! Core pipeline types and traits

pub mod category;
pub mod error;
pub mod format;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod metrics;
pub mod properties;
pub mod registry;
pub mod settings;
pub mod sink;
pub mod transport;

pub use category::Category;
pub use error::{LoggerError, Result};
pub use format::{OutputFormat, TimestampFormat};
pub use log_level::LogLevel;
pub use log_record::{LogRecord, Message};
pub use logger::{Logger, DEFAULT_CATEGORY};
pub use metrics::{DeliveryMetrics, RegistryMetrics};
pub use properties::{ErrorValue, FieldValue, Properties, ERROR_KEY, UNSERIALIZABLE};
pub use registry::{LoggerRegistry, RegistryEntry, SinkMap};
pub use settings::Settings;
pub use sink::Sink;
#[cfg(feature = "http")]
pub use transport::ReqwestTransport;
pub use transport::{HttpRequest, HttpTransport, MemoryTransport, DEFAULT_REQUEST_TIMEOUT};
