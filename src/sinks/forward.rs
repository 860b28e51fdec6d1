//! Forwarding of severe records to an error tracker

use crate::core::{FieldValue, LogRecord, Properties, Result, Sink, ERROR_KEY};
use crate::tracker::{EventLevel, EventUser, TrackerClient, TrackerEvent};
use async_trait::async_trait;
use std::sync::Arc;

/// Property keys lifted into the event's user context
const USER_ID_KEY: &str = "user_id";
const USER_EMAIL_KEYS: [&str; 2] = ["user_email", "email"];
const USERNAME_KEY: &str = "username";

/// Text or integer ids are accepted; anything else leaves the field unset
fn string_property(properties: &Properties, key: &str) -> Option<String> {
    match properties.get(key)? {
        FieldValue::String(s) if !s.trim().is_empty() => Some(s.clone()),
        FieldValue::Int(id) if key == USER_ID_KEY => Some(id.to_string()),
        _ => None,
    }
}

fn user_from(properties: &Properties) -> EventUser {
    EventUser {
        id: string_property(properties, USER_ID_KEY),
        email: USER_EMAIL_KEYS
            .iter()
            .find_map(|key| string_property(properties, key)),
        username: string_property(properties, USERNAME_KEY),
    }
}

/// Build the tracker event for a severe record; `None` below error
pub fn event_for(record: &LogRecord) -> Option<TrackerEvent> {
    let level = EventLevel::from_log_level(record.level)?;

    let mut event = match record.properties.error() {
        Some(error) => TrackerEvent::exception(level, error)
            .with_extra("message", record.render_message()),
        None => TrackerEvent::message(level, record.render_message()),
    };

    event = event
        .with_timestamp(&record.timestamp)
        .with_extra("category", record.category.dotted())
        .with_extra("level", record.level.to_str())
        .with_extra("timestamp", record.timestamp_iso())
        .with_tag("category", record.category.dotted())
        .with_user(user_from(&record.properties));

    for (key, value) in record.properties.iter() {
        if key != ERROR_KEY {
            event.extra.insert(key.clone(), value.to_json_value());
        }
    }

    Some(event)
}

/// Sink sending error and fatal records to a [`TrackerClient`]
///
/// A record whose `error` property holds an error value becomes an
/// exception event; any other severe record becomes a message event.
pub struct FilteringForwardSink {
    client: Arc<TrackerClient>,
}

impl FilteringForwardSink {
    pub fn new(client: Arc<TrackerClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &TrackerClient {
        &self.client
    }
}

#[async_trait]
impl Sink for FilteringForwardSink {
    fn write(&self, record: &LogRecord) -> Result<()> {
        match event_for(record) {
            Some(event) => {
                self.client.capture(event);
            }
            None => {
                self.client.metrics().record_filtered();
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "tracker"
    }
}
