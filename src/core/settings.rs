//! Startup configuration
//!
//! Settings are read once at startup: built-in defaults, then an optional
//! TOML file, then `LOG_FANOUT_*` environment variables. A backend whose
//! URL or DSN is absent is simply not registered.

use super::error::Result;
use super::log_level::LogLevel;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use std::time::Duration;

/// Prefix for every environment variable read by [`Settings::load`]
pub const ENV_PREFIX: &str = "LOG_FANOUT_";

/// Keys whose environment values are taken verbatim instead of being parsed
/// as numbers or booleans, so keys like `007123` keep their leading zeros
const TEXT_KEYS: [&str; 9] = [
    "environment",
    "service_name",
    "job",
    "aggregator_url",
    "aggregator_api_key",
    "alert_webhook_url",
    "alert_username",
    "error_tracker_dsn",
    "release",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Deployment environment (`production`, `staging`, `development`, ...)
    #[serde(deserialize_with = "deserialize_text")]
    pub environment: String,
    /// Service name attached to aggregator streams
    #[serde(deserialize_with = "deserialize_text")]
    pub service_name: String,
    /// Aggregator `job` label; defaults to the service name
    #[serde(deserialize_with = "deserialize_optional_text")]
    pub job: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_text")]
    pub aggregator_url: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_text")]
    pub aggregator_api_key: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_text")]
    pub alert_webhook_url: Option<String>,
    /// Display name used for webhook alerts
    #[serde(deserialize_with = "deserialize_text")]
    pub alert_username: String,
    #[serde(deserialize_with = "deserialize_optional_text")]
    pub error_tracker_dsn: Option<String>,
    /// Release identifier attached to tracker events
    #[serde(deserialize_with = "deserialize_optional_text")]
    pub release: Option<String>,
    /// Threshold for the `app` category; derived from the environment when unset
    #[serde(deserialize_with = "deserialize_level")]
    pub min_level: Option<LogLevel>,
    pub console: bool,
    pub batch_size: usize,
    pub flush_interval_ms: u64,
    pub rate_limit_ms: u64,
    pub request_timeout_ms: u64,
    /// Gzip aggregator push bodies
    pub compress: bool,
    /// Attach a scrubbed environment snapshot to tracker events
    pub capture_environment: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: "production".to_string(),
            service_name: "app".to_string(),
            job: None,
            aggregator_url: None,
            aggregator_api_key: None,
            alert_webhook_url: None,
            alert_username: "Log Alerts".to_string(),
            error_tracker_dsn: None,
            release: None,
            min_level: None,
            console: true,
            batch_size: 100,
            flush_interval_ms: 5_000,
            rate_limit_ms: 30_000,
            request_timeout_ms: 10_000,
            compress: false,
            capture_environment: false,
        }
    }
}

fn deserialize_level<'de, D>(deserializer: D) -> std::result::Result<Option<LogLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// A scalar written where text is expected, e.g. an unquoted TOML number
#[derive(Deserialize)]
#[serde(untagged)]
enum Text {
    String(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Bool(bool),
}

impl From<Text> for String {
    fn from(text: Text) -> Self {
        match text {
            Text::String(s) => s,
            Text::Unsigned(n) => n.to_string(),
            Text::Signed(n) => n.to_string(),
            Text::Float(n) => n.to_string(),
            Text::Bool(b) => b.to_string(),
        }
    }
}

fn deserialize_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Text::deserialize(deserializer).map(String::from)
}

fn deserialize_optional_text<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Text>::deserialize(deserializer)?.map(String::from))
}

impl Settings {
    /// Defaults overridden by `LOG_FANOUT_*` environment variables
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Defaults, then the TOML file at `path` (if given), then the environment
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(path))
    }

    /// The provider stack used by [`Settings::load_from`]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&TEXT_KEYS));
        for key in TEXT_KEYS {
            let var = format!("{}{}", ENV_PREFIX, key.to_uppercase());
            if let Ok(value) = std::env::var(&var) {
                figment = figment.merge(Serialized::default(key, value));
            }
        }
        figment
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let settings: Settings = figment.extract()?;
        Ok(settings.normalized())
    }

    /// Treat blank URLs, keys and DSNs as absent
    fn normalized(mut self) -> Self {
        for field in [
            &mut self.job,
            &mut self.aggregator_url,
            &mut self.aggregator_api_key,
            &mut self.alert_webhook_url,
            &mut self.error_tracker_dsn,
            &mut self.release,
        ] {
            if field.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *field = None;
            }
        }
        self
    }

    pub fn is_development(&self) -> bool {
        matches!(
            self.environment.to_lowercase().as_str(),
            "development" | "dev" | "local"
        )
    }

    /// Effective threshold for application categories
    pub fn minimum_level(&self) -> LogLevel {
        self.min_level.unwrap_or(if self.is_development() {
            LogLevel::Debug
        } else {
            LogLevel::Info
        })
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
