//! Error-tracker event model

use crate::core::{ErrorValue, LogLevel};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Severity of a tracker event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Error,
    Fatal,
}

impl EventLevel {
    /// Tracker severity for a log level; `None` below error
    pub fn from_log_level(level: LogLevel) -> Option<Self> {
        match level {
            LogLevel::Fatal => Some(EventLevel::Fatal),
            LogLevel::Error => Some(EventLevel::Error),
            _ => None,
        }
    }
}

/// One entry of an exception chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExceptionValue {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exception {
    /// Oldest cause first, the reported error last
    pub values: Vec<ExceptionValue>,
}

impl From<&ErrorValue> for Exception {
    fn from(error: &ErrorValue) -> Self {
        let mut values: Vec<ExceptionValue> = error
            .causes
            .iter()
            .rev()
            .map(|cause| ExceptionValue {
                kind: "Caused by".to_string(),
                value: cause.clone(),
            })
            .collect();
        values.push(ExceptionValue {
            kind: error.kind.clone(),
            value: error.message.clone(),
        });
        Self { values }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl EventUser {
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.email.is_none() && self.username.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventContexts {
    /// Snapshot of the process environment
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub runtime_env: BTreeMap<String, String>,
}

/// A single event as posted to the tracker's store endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerEvent {
    pub event_id: String,
    pub timestamp: String,
    pub level: EventLevel,
    pub platform: String,
    pub environment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<Exception>,
    pub extra: BTreeMap<String, serde_json::Value>,
    pub tags: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<EventUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contexts: Option<EventContexts>,
}

impl TrackerEvent {
    fn new(level: EventLevel) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().simple().to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level,
            platform: "other".to_string(),
            environment: String::new(),
            release: None,
            message: None,
            exception: None,
            extra: BTreeMap::new(),
            tags: BTreeMap::new(),
            user: None,
            contexts: None,
        }
    }

    /// Event carrying a plain message
    pub fn message(level: EventLevel, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(level)
        }
    }

    /// Event carrying an error and its cause chain
    pub fn exception(level: EventLevel, error: &ErrorValue) -> Self {
        Self {
            exception: Some(Exception::from(error)),
            ..Self::new(level)
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: &DateTime<Utc>) -> Self {
        self.timestamp = timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_user(mut self, user: EventUser) -> Self {
        self.user = (!user.is_empty()).then_some(user);
        self
    }
}
