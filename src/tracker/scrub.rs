//! Redaction applied to every outbound tracker event
//!
//! Email addresses found in the user or extra context are replaced with
//! [`EMAIL_PLACEHOLDER`], and every other literal occurrence of those same
//! addresses in the event is replaced too. Secret-bearing variables are
//! removed from the runtime environment snapshot.

use super::event::TrackerEvent;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

pub const EMAIL_PLACEHOLDER: &str = "[email redacted]";

/// Environment variables never sent to the tracker
pub const SENSITIVE_ENV_VARS: &[&str] = &[
    "LOG_FANOUT_AGGREGATOR_API_KEY",
    "LOG_FANOUT_ALERT_WEBHOOK_URL",
    "LOG_FANOUT_ERROR_TRACKER_DSN",
    "SENTRY_DSN",
    "DISCORD_WEBHOOK_URL",
    "LOKI_API_KEY",
    "DATABASE_URL",
    "REDIS_URL",
    "JWT_SECRET",
    "SESSION_SECRET",
    "API_KEY",
    "SECRET_KEY",
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
    "GITHUB_TOKEN",
    "STRIPE_SECRET_KEY",
    "SMTP_PASSWORD",
];

/// Loose `local@domain.tld` check for whole values
pub fn is_email(value: &str) -> bool {
    let value = value.trim();
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    if !local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c))
    {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    let Some(tld) = labels.last() else {
        return false;
    };
    labels.len() >= 2
        && labels
            .iter()
            .all(|l| !l.is_empty() && l.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'))
        && tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
}

pub fn is_sensitive_env_var(name: &str) -> bool {
    SENSITIVE_ENV_VARS
        .iter()
        .any(|sensitive| sensitive.eq_ignore_ascii_case(name))
}

fn is_email_key(key: &str) -> bool {
    key.to_ascii_lowercase().contains("email")
}

fn redact(value: &mut String, found: &mut BTreeSet<String>) {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == EMAIL_PLACEHOLDER {
        return;
    }
    found.insert(trimmed.to_string());
    *value = EMAIL_PLACEHOLDER.to_string();
}

fn redact_json(key: &str, value: &mut Value, found: &mut BTreeSet<String>) {
    match value {
        Value::String(s) => {
            if is_email_key(key) || is_email(s) {
                redact(s, found);
            }
        }
        Value::Array(items) => {
            for item in items {
                redact_json(key, item, found);
            }
        }
        Value::Object(map) => {
            for (k, v) in map.iter_mut() {
                redact_json(k, v, found);
            }
        }
        _ => {}
    }
}

fn replace_literal(text: &mut String, emails: &BTreeSet<String>) {
    for email in emails {
        if text.contains(email.as_str()) {
            *text = text.replace(email.as_str(), EMAIL_PLACEHOLDER);
        }
    }
}

fn replace_json(value: &mut Value, emails: &BTreeSet<String>) {
    match value {
        Value::String(s) => replace_literal(s, emails),
        Value::Array(items) => items.iter_mut().for_each(|v| replace_json(v, emails)),
        Value::Object(map) => map.values_mut().for_each(|v| replace_json(v, emails)),
        _ => {}
    }
}

/// Drop secret-bearing variables from an environment snapshot
pub fn strip_sensitive_env(env: &mut BTreeMap<String, String>) {
    env.retain(|name, _| !is_sensitive_env_var(name));
}

/// Redact `event` in place
pub fn scrub_event(event: &mut TrackerEvent) {
    let mut emails = BTreeSet::new();

    if let Some(email) = event.user.as_mut().and_then(|u| u.email.as_mut()) {
        redact(email, &mut emails);
    }
    for (key, value) in event.extra.iter_mut() {
        redact_json(key, value, &mut emails);
    }

    if let Some(contexts) = event.contexts.as_mut() {
        strip_sensitive_env(&mut contexts.runtime_env);
    }

    if emails.is_empty() {
        return;
    }

    if let Some(message) = event.message.as_mut() {
        replace_literal(message, &emails);
    }
    if let Some(exception) = event.exception.as_mut() {
        for value in &mut exception.values {
            replace_literal(&mut value.value, &emails);
        }
    }
    if let Some(user) = event.user.as_mut() {
        for field in [&mut user.id, &mut user.username].into_iter().flatten() {
            replace_literal(field, &emails);
        }
    }
    event.extra.values_mut().for_each(|v| replace_json(v, &emails));
    event.tags.values_mut().for_each(|v| replace_literal(v, &emails));
    if let Some(contexts) = event.contexts.as_mut() {
        contexts
            .runtime_env
            .values_mut()
            .for_each(|v| replace_literal(v, &emails));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorValue;
    use crate::tracker::event::{EventContexts, EventLevel, EventUser};
    use serde_json::json;

    #[test]
    fn test_is_email() {
        assert!(is_email("jane.doe+billing@example.co.uk"));
        assert!(is_email("  ops@example.io "));
        assert!(!is_email("not an email"));
        assert!(!is_email("a@b"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("two@@example.com"));
        assert!(!is_email("user@example.c0m"));
    }

    #[test]
    fn test_user_email_redacted_everywhere() {
        let mut event = TrackerEvent::message(
            EventLevel::Error,
            "password reset failed for jane@example.com",
        )
        .with_user(EventUser {
            id: Some("u-17".to_string()),
            email: Some("jane@example.com".to_string()),
            username: None,
        })
        .with_tag("account", "jane@example.com");

        scrub_event(&mut event);

        let user = event.user.as_ref().unwrap();
        assert_eq!(user.email.as_deref(), Some(EMAIL_PLACEHOLDER));
        assert_eq!(user.id.as_deref(), Some("u-17"));
        assert_eq!(
            event.message.as_deref(),
            Some("password reset failed for [email redacted]")
        );
        assert_eq!(event.tags["account"], EMAIL_PLACEHOLDER);
    }

    #[test]
    fn test_extra_emails_redacted() {
        let mut event = TrackerEvent::exception(
            EventLevel::Fatal,
            &ErrorValue::with_kind("MailError", "bounce from ops@example.io"),
        )
        .with_extra("recipient", "ops@example.io")
        .with_extra("contact_email", "not-validated")
        .with_extra("order", json!({"id": 9, "buyer": {"email": "b@shop.test"}}))
        .with_extra("note", "cc b@shop.test");

        scrub_event(&mut event);

        assert_eq!(event.extra["recipient"], EMAIL_PLACEHOLDER);
        assert_eq!(event.extra["contact_email"], EMAIL_PLACEHOLDER);
        assert_eq!(event.extra["order"]["buyer"]["email"], EMAIL_PLACEHOLDER);
        assert_eq!(event.extra["order"]["id"], 9);
        assert_eq!(event.extra["note"], "cc [email redacted]");

        let exception = event.exception.as_ref().unwrap();
        assert_eq!(exception.values[0].value, "bounce from [email redacted]");
    }

    #[test]
    fn test_sensitive_env_removed() {
        let mut event = TrackerEvent::message(EventLevel::Error, "boom");
        let mut runtime_env = BTreeMap::new();
        runtime_env.insert("PATH".to_string(), "/usr/bin".to_string());
        runtime_env.insert("LOG_FANOUT_ERROR_TRACKER_DSN".to_string(), "https://k@h/1".to_string());
        runtime_env.insert("database_url".to_string(), "postgres://...".to_string());
        event.contexts = Some(EventContexts { runtime_env });

        scrub_event(&mut event);

        let env = &event.contexts.as_ref().unwrap().runtime_env;
        assert_eq!(env.len(), 1);
        assert!(env.contains_key("PATH"));
    }

    #[test]
    fn test_clean_event_untouched() {
        let mut event = TrackerEvent::message(EventLevel::Error, "disk full").with_extra("free", 0);
        let before = event.clone();

        scrub_event(&mut event);
        assert_eq!(event, before);
    }
}
