//! Rows read from an export.
//!
//! JSON values are resolved once into [`RawValue`] when a row is parsed, so
//! later stages dispatch on a closed set of variants instead of probing
//! `serde_json::Value` at every step.

use serde_json::{Map, Number, Value};

/// A single cell from an export.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// JSON `null`.
    Null,
    /// JSON number.
    Number(Number),
    /// JSON boolean.
    Bool(bool),
    /// JSON string. Nested arrays and objects are kept as their JSON text.
    Text(String),
}

impl RawValue {
    /// Returns the text content, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Value> for RawValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::Text(s),
            nested @ (Value::Array(_) | Value::Object(_)) => Self::Text(nested.to_string()),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(String::from(value))
    }
}

/// One exported row: column names in export order with their values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, RawValue)>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column, keeping insertion order.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.fields.push((column.into(), value.into()));
        self
    }

    /// Builds a row from a JSON object, preserving key order.
    #[must_use]
    pub fn from_object(object: Map<String, Value>) -> Self {
        Self {
            fields: object
                .into_iter()
                .map(|(k, v)| (k, RawValue::from(v)))
                .collect(),
        }
    }

    /// Looks up a column by its source name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&RawValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Returns the column names in export order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        Self::Number(Number::from(value))
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}
