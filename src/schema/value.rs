use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A field value as held by the form.
///
/// Validation turns raw input into the variant matching the field's declared type.
/// Input that fails validation is kept as `Text` so the user sees what they typed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Value {
    #[default]
    Null,
    Text(String),
    Integer(i64),
    Decimal(f64),
    Date(NaiveDate),
}

impl Value {
    /// True for `Null` and whitespace-only text.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// The finite numeric reading of this value, if it has one.
    ///
    /// Text counts as numeric when it parses to a finite number.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            Value::Integer(i) => *i as f64,
            Value::Decimal(d) => *d,
            Value::Text(s) => s.trim().parse::<f64>().ok()?,
            Value::Null | Value::Date(_) => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Baseline comparison used for change tracking.
    ///
    /// Null and empty text are equivalent, and numbers compare by magnitude regardless
    /// of whether they are stored as integers or decimals.
    pub fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_empty() && b.is_empty() => true,
            (a, b) if a.is_empty() || b.is_empty() => false,
            (Value::Integer(_) | Value::Decimal(_), Value::Integer(_) | Value::Decimal(_)) => {
                self.as_number() == other.as_number()
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            _ => false,
        }
    }

    /// Converts a JSON value as delivered by the item/package data collaborator.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Text(b.to_string()),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map(Value::Decimal).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(s) => write!(f, "{}", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Decimal(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// The current state of one field in a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    pub field_id: String,
    pub value: Value,
    pub is_valid: bool,
    pub error_message: Option<String>,
}

impl FieldValue {
    pub fn new(field_id: impl Into<String>, value: Value) -> Self {
        Self {
            field_id: field_id.into(),
            value,
            is_valid: true,
            error_message: None,
        }
    }

    /// Resets the field to a valid, empty state.
    pub fn clear(&mut self) {
        self.value = Value::Null;
        self.is_valid = true;
        self.error_message = None;
    }
}
