//! Log record structure

use super::category::Category;
use super::log_level::LogLevel;
use super::properties::{FieldValue, Properties};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Ordered message parts, concatenated when rendered.
///
/// Parts stay separate so structured sinks can serialize them differently
/// from plain-text sinks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    parts: Vec<FieldValue>,
}

impl Message {
    pub fn new(parts: Vec<FieldValue>) -> Self {
        Self { parts }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Append a part (builder style)
    #[must_use]
    pub fn part(mut self, part: impl Into<FieldValue>) -> Self {
        self.parts.push(part.into());
        self
    }

    pub fn parts(&self) -> &[FieldValue] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Concatenate all parts; string parts verbatim, others JSON-encoded
    pub fn render(&self) -> String {
        self.parts.iter().map(FieldValue::render).collect()
    }
}

impl From<&str> for Message {
    fn from(s: &str) -> Self {
        Message::new(vec![FieldValue::from(s)])
    }
}

impl From<String> for Message {
    fn from(s: String) -> Self {
        Message::new(vec![FieldValue::String(s)])
    }
}

impl From<Vec<FieldValue>> for Message {
    fn from(parts: Vec<FieldValue>) -> Self {
        Message::new(parts)
    }
}

/// A leveled, categorized, timestamped log record.
///
/// Sinks only ever receive `&LogRecord`.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub category: Category,
    pub level: LogLevel,
    pub message: Message,
    pub properties: Properties,
    pub timestamp: DateTime<Utc>,
}

/// Compact structured form shipped to the log aggregator
#[derive(Serialize)]
struct RecordLine<'a> {
    level: LogLevel,
    category: String,
    message: String,
    #[serde(skip_serializing_if = "no_properties")]
    properties: &'a Properties,
}

fn no_properties(properties: &&Properties) -> bool {
    properties.is_empty()
}

impl LogRecord {
    pub fn new(category: Category, level: LogLevel, message: impl Into<Message>) -> Self {
        Self {
            category,
            level,
            message: message.into(),
            properties: Properties::new(),
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn render_message(&self) -> String {
        self.message.render()
    }

    /// Nanoseconds since the Unix epoch as a decimal string
    pub fn timestamp_nanos(&self) -> String {
        match self.timestamp.timestamp_nanos_opt() {
            Some(nanos) => nanos.to_string(),
            // Outside the i64 nanosecond range (years before 1677 / after 2262)
            None => format!("{}000000", self.timestamp.timestamp_millis()),
        }
    }

    /// ISO-8601 timestamp with millisecond precision
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Compact single-line JSON: level, dotted category, rendered message and,
    /// when present, properties.
    pub fn to_line(&self) -> String {
        let line = RecordLine {
            level: self.level,
            category: self.category.dotted(),
            message: self.render_message(),
            properties: &self.properties,
        };
        serde_json::to_string(&line).unwrap_or_else(|_| {
            format!(
                "{{\"level\":\"{}\",\"category\":\"{}\",\"message\":\"{}\"}}",
                self.level,
                self.category.dotted(),
                super::properties::UNSERIALIZABLE
            )
        })
    }
}
