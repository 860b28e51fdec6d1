//! Local rendering of log records
//!
//! Used by the console sink. Network sinks build their own payloads.

use super::log_record::LogRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp rendering for local output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,

    /// `2025-01-08T10:30:45.123456Z`
    Iso8601Micros,

    /// `1736332245123`
    UnixMillis,

    /// `1736332245123456789`, the aggregator's native resolution
    UnixNanos,

    /// Any strftime-compatible pattern
    Custom(String),
}

impl TimestampFormat {
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Iso8601 => datetime.to_rfc3339_opts(SecondsFormat::Millis, true),
            TimestampFormat::Iso8601Micros => {
                datetime.to_rfc3339_opts(SecondsFormat::Micros, true)
            }
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::UnixNanos => datetime
                .timestamp_nanos_opt()
                .map(|n| n.to_string())
                .unwrap_or_else(|| datetime.timestamp_millis().to_string()),
            TimestampFormat::Custom(pattern) => datetime.format(pattern).to_string(),
        }
    }
}

/// Output format for local rendering
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// `[2025-01-08T10:30:45.123Z] [INFO ] app.auth - user signed in user_id=7`
    #[default]
    Text,

    /// One JSON object per line
    Json,

    /// `timestamp=... level=info category=app.auth message="user signed in"`
    Logfmt,
}

impl OutputFormat {
    pub fn format(&self, record: &LogRecord, timestamp_format: &TimestampFormat) -> String {
        match self {
            OutputFormat::Text => format_text(record, timestamp_format, record.level.label()),
            OutputFormat::Json => format_json(record, timestamp_format),
            OutputFormat::Logfmt => format_logfmt(record, timestamp_format),
        }
    }
}

/// Replace line breaks and tabs so one record is always one line
pub fn sanitize(message: &str) -> String {
    message
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Text rendering with a caller-supplied (possibly colored) level label
pub(crate) fn format_text(
    record: &LogRecord,
    timestamp_format: &TimestampFormat,
    level_label: &str,
) -> String {
    let base = format!(
        "[{}] [{:5}] {} - {}",
        timestamp_format.format(&record.timestamp),
        level_label,
        record.category,
        sanitize(&record.render_message())
    );

    if record.properties.is_empty() {
        base
    } else {
        format!("{} {}", base, sanitize(&record.properties.format_fields()))
    }
}

fn format_json(record: &LogRecord, timestamp_format: &TimestampFormat) -> String {
    let mut object = serde_json::Map::new();
    object.insert(
        "timestamp".to_string(),
        serde_json::Value::String(timestamp_format.format(&record.timestamp)),
    );
    object.insert("level".to_string(), record.level.to_str().into());
    object.insert("category".to_string(), record.category.dotted().into());
    object.insert("message".to_string(), record.render_message().into());
    if !record.properties.is_empty() {
        object.insert(
            "properties".to_string(),
            serde_json::Value::Object(record.properties.to_json_map()),
        );
    }

    serde_json::to_string(&serde_json::Value::Object(object)).unwrap_or_default()
}

fn format_logfmt(record: &LogRecord, timestamp_format: &TimestampFormat) -> String {
    let mut parts = vec![
        format!(
            "timestamp={}",
            escape_logfmt_value(&timestamp_format.format(&record.timestamp))
        ),
        format!("level={}", record.level),
        format!("category={}", escape_logfmt_value(&record.category.dotted())),
        format!("message={}", quote_logfmt_value(&record.render_message())),
    ];

    for (key, value) in record.properties.iter() {
        let rendered = value.render();
        let rendered = match value.as_str() {
            Some(_) => quote_logfmt_value(&rendered),
            None => escape_logfmt_value(&rendered),
        };
        parts.push(format!("{}={}", escape_logfmt_key(key), rendered));
    }

    parts.join(" ")
}

fn escape_logfmt_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || *c == '.')
        .collect()
}

fn escape_logfmt_value(value: &str) -> String {
    if value.contains(' ') || value.contains('"') || value.contains('=') {
        quote_logfmt_value(value)
    } else {
        value.to_string()
    }
}

fn quote_logfmt_value(value: &str) -> String {
    format!(
        "\"{}\"",
        sanitize(&value.replace('\\', "\\\\").replace('"', "\\\""))
    )
}
