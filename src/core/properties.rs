//! Structured values carried by log records
//!
//! This module provides:
//! - `FieldValue`: a single structured value (message part or property)
//! - `ErrorValue`: a captured error with its source chain
//! - `Properties`: the key/value map attached to a record

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Property key reserved for an embedded error value
pub const ERROR_KEY: &str = "error";

/// Rendered in place of values that have no JSON representation
pub const UNSERIALIZABLE: &str = "[unserializable]";

/// An error captured at log time.
///
/// Holds the error's type name, its display message and the messages of
/// every `source()` in the chain, so that it outlives the original error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorValue {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl ErrorValue {
    /// Capture a concrete error, walking its source chain
    pub fn new<E>(error: &E) -> Self
    where
        E: std::error::Error + 'static,
    {
        let full = std::any::type_name::<E>();
        let kind = full.rsplit("::").next().unwrap_or(full).to_string();
        Self::from_dyn(kind, error)
    }

    /// Capture a type-erased error under an explicit kind
    pub fn from_dyn(kind: impl Into<String>, error: &(dyn std::error::Error + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Self {
            kind: kind.into(),
            message: error.to_string(),
            causes,
        }
    }

    /// Build an error value without an underlying Rust error
    pub fn with_kind(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            causes: Vec::new(),
        }
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Value type for message parts and properties
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    Json(serde_json::Value),
    Error(ErrorValue),
}

impl FieldValue {
    /// Capture an error as a field value
    pub fn error<E>(error: &E) -> Self
    where
        E: std::error::Error + 'static,
    {
        FieldValue::Error(ErrorValue::new(error))
    }

    /// Convert to serde_json::Value for JSON serialization
    ///
    /// Non-finite floats have no JSON form and become the
    /// [`UNSERIALIZABLE`] placeholder.
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
            FieldValue::Int(i) => serde_json::Value::Number((*i).into()),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(UNSERIALIZABLE.to_string())),
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Json(v) => v.clone(),
            FieldValue::Error(e) => serde_json::to_value(e)
                .unwrap_or_else(|_| serde_json::Value::String(UNSERIALIZABLE.to_string())),
        }
    }

    /// Render for plain-text output: strings verbatim, everything else as JSON
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            FieldValue::String(s) => s.clone(),
            other => serde_json::to_string(&other.to_json_value())
                .unwrap_or_else(|_| UNSERIALIZABLE.to_string()),
        }
    }

    pub fn as_error(&self) -> Option<&ErrorValue> {
        match self {
            FieldValue::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json_value().serialize(serializer)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Error(e) => write!(f, "{}", e),
            other => write!(f, "{}", other.render()),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<u32> for FieldValue {
    fn from(i: u32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(v: serde_json::Value) -> Self {
        FieldValue::Json(v)
    }
}

impl From<ErrorValue> for FieldValue {
    fn from(e: ErrorValue) -> Self {
        FieldValue::Error(e)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Key/value properties attached to a log record
///
/// Keys are kept sorted so every sink sees the same field order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Properties {
    fields: BTreeMap<String, FieldValue>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field (builder style)
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Attach an error under the reserved `error` key
    pub fn with_error<E>(self, error: &E) -> Self
    where
        E: std::error::Error + 'static,
    {
        self.with(ERROR_KEY, FieldValue::error(error))
    }

    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// The embedded error, if the reserved key holds an actual error value
    pub fn error(&self) -> Option<&ErrorValue> {
        self.fields.get(ERROR_KEY).and_then(FieldValue::as_error)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Fill in keys from `defaults` that are not already present
    pub fn merge_defaults(&mut self, defaults: &Properties) {
        for (key, value) in defaults.iter() {
            self.fields
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }

    pub fn to_json_map(&self) -> serde_json::Map<String, serde_json::Value> {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json_value()))
            .collect()
    }

    /// Format fields as key=value pairs
    pub fn format_fields(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v.render()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_fields())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("connection refused")]
    struct ConnectError;

    #[derive(Debug, thiserror::Error)]
    #[error("payment gateway unavailable")]
    struct GatewayError(#[source] ConnectError);

    #[test]
    fn test_error_value_walks_sources() {
        let err = GatewayError(ConnectError);
        let value = ErrorValue::new(&err);
        assert_eq!(value.kind, "GatewayError");
        assert_eq!(value.message, "payment gateway unavailable");
        assert_eq!(value.causes, vec!["connection refused".to_string()]);
    }

    #[test]
    fn test_render_strings_verbatim_others_as_json() {
        assert_eq!(FieldValue::from("plain").render(), "plain");
        assert_eq!(FieldValue::from(42).render(), "42");
        assert_eq!(
            FieldValue::from(serde_json::json!({"a": 1})).render(),
            r#"{"a":1}"#
        );
    }

    #[test]
    fn test_non_finite_float_is_placeholder() {
        let value = FieldValue::Float(f64::NAN).to_json_value();
        assert_eq!(value, serde_json::Value::String(UNSERIALIZABLE.to_string()));
    }

    #[test]
    fn test_error_lookup_requires_error_value() {
        let props = Properties::new().with(ERROR_KEY, "just a string");
        assert!(props.error().is_none());

        let props = Properties::new().with_error(&ConnectError);
        assert_eq!(props.error().map(|e| e.message.as_str()), Some("connection refused"));
    }

    #[test]
    fn test_merge_defaults_keeps_existing() {
        let mut props = Properties::new().with("request_id", "abc");
        let defaults = Properties::new()
            .with("request_id", "ignored")
            .with("service", "api");
        props.merge_defaults(&defaults);

        assert_eq!(props.get("request_id"), Some(&FieldValue::from("abc")));
        assert_eq!(props.get("service"), Some(&FieldValue::from("api")));
    }

    #[test]
    fn test_format_fields_sorted() {
        let props = Properties::new().with("b", 2).with("a", "x");
        assert_eq!(props.format_fields(), "a=x b=2");
    }
}
