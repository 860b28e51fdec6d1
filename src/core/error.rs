//! Error types for the logging pipeline
//!
//! Only startup and configuration paths return these to callers. Delivery
//! errors are produced by transports and consumed inside the sinks.

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// A registry entry names a sink that was not supplied
    #[error("Registry entry for '{category}' references unknown sink '{sink}'")]
    UnknownSink { category: String, sink: String },

    /// Two registry entries share the same category prefix
    #[error("Duplicate registry entry for category '{category}'")]
    DuplicateEntry { category: String },

    /// `configure` was entered while another call was still running
    #[error("Logger registry is already being configured")]
    ConcurrentConfiguration,

    /// A sink needing background tasks was built outside a tokio runtime
    #[error("{component} requires a tokio runtime")]
    MissingRuntime { component: String },

    /// Settings could not be loaded
    #[error("Settings error: {0}")]
    Settings(#[from] Box<figment::Error>),

    /// HTTP client error
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote endpoint answered with a non-success status
    #[error("Delivery to '{endpoint}' failed with status {status}")]
    DeliveryFailed { endpoint: String, status: u16 },

    /// Outbound request exceeded its time budget
    #[error("Delivery to '{endpoint}' timed out")]
    Timeout { endpoint: String },

    /// Sink write error (generic)
    #[error("Sink error: {0}")]
    SinkError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<figment::Error> for LoggerError {
    fn from(err: figment::Error) -> Self {
        LoggerError::Settings(Box::new(err))
    }
}

impl LoggerError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create an unknown sink error
    pub fn unknown_sink(category: impl Into<String>, sink: impl Into<String>) -> Self {
        LoggerError::UnknownSink {
            category: category.into(),
            sink: sink.into(),
        }
    }

    /// Create a duplicate entry error
    pub fn duplicate_entry(category: impl Into<String>) -> Self {
        LoggerError::DuplicateEntry {
            category: category.into(),
        }
    }

    /// Create a missing runtime error
    pub fn missing_runtime(component: impl Into<String>) -> Self {
        LoggerError::MissingRuntime {
            component: component.into(),
        }
    }

    /// Create a delivery failure for a non-success HTTP status
    pub fn delivery(endpoint: impl Into<String>, status: u16) -> Self {
        LoggerError::DeliveryFailed {
            endpoint: endpoint.into(),
            status,
        }
    }

    /// Create a timeout error
    pub fn timeout(endpoint: impl Into<String>) -> Self {
        LoggerError::Timeout {
            endpoint: endpoint.into(),
        }
    }

    /// Create a sink error (generic)
    pub fn sink<S: Into<String>>(msg: S) -> Self {
        LoggerError::SinkError(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Whether this error belongs to the startup/configuration class
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            LoggerError::InvalidConfiguration { .. }
                | LoggerError::UnknownSink { .. }
                | LoggerError::DuplicateEntry { .. }
                | LoggerError::ConcurrentConfiguration
                | LoggerError::MissingRuntime { .. }
                | LoggerError::Settings(_)
        )
    }
}
