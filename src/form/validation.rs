use crate::error::ValidationError;
use crate::schema::{FieldDefinition, FieldType, FieldValue, Value};
use chrono::{DateTime, NaiveDate};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d.%m.%Y"];

/// Validates raw input for a field and produces its new state.
///
/// Valid input is converted to the variant of the declared type. Invalid input is kept
/// as text, marked invalid, and carries the error message. Empty input is invalid only
/// for required fields that are not calculated.
pub fn validate(definition: &FieldDefinition, raw: Value) -> FieldValue {
    let mut field = FieldValue::new(definition.id.clone(), Value::Null);

    if raw.is_empty() {
        if definition.required && !definition.is_calculated() {
            field.is_valid = false;
            field.error_message = Some(ValidationError::Required.to_string());
        }
        return field;
    }

    match coerce(definition.field_type, raw.clone()) {
        Ok(value) => field.value = value,
        Err(error) => {
            field.value = Value::Text(raw.to_string());
            field.is_valid = false;
            field.error_message = Some(error.to_string());
        }
    }
    field
}

/// Converts a non-empty value to the variant matching `field_type`.
pub fn coerce(field_type: FieldType, raw: Value) -> Result<Value, ValidationError> {
    match field_type {
        FieldType::String => Ok(match raw {
            Value::Text(s) => Value::Text(s),
            other => Value::Text(other.to_string()),
        }),
        FieldType::Integer => coerce_integer(raw),
        FieldType::Decimal => coerce_decimal(raw),
        FieldType::Date => coerce_date(raw),
    }
}

fn coerce_integer(raw: Value) -> Result<Value, ValidationError> {
    let text = raw.to_string();
    let n = match raw {
        Value::Integer(i) => return Ok(Value::Integer(i)),
        Value::Decimal(d) => d,
        Value::Text(s) => {
            if let Ok(i) = s.trim().parse::<i64>() {
                return Ok(Value::Integer(i));
            }
            parse_number(&s).ok_or_else(|| ValidationError::NotANumber(text.clone()))?
        }
        Value::Date(_) | Value::Null => return Err(ValidationError::NotANumber(text)),
    };

    if !n.is_finite() {
        return Err(ValidationError::NotANumber(text));
    }
    if n.fract() != 0.0 || n.abs() >= i64::MAX as f64 {
        return Err(ValidationError::NotAnInteger(text));
    }
    Ok(Value::Integer(n as i64))
}

fn coerce_decimal(raw: Value) -> Result<Value, ValidationError> {
    match raw {
        Value::Integer(i) => Ok(Value::Decimal(i as f64)),
        Value::Decimal(d) if d.is_finite() => Ok(Value::Decimal(d)),
        Value::Text(ref s) => parse_number(s)
            .map(Value::Decimal)
            .ok_or_else(|| ValidationError::NotANumber(raw.to_string())),
        other => Err(ValidationError::NotANumber(other.to_string())),
    }
}

fn coerce_date(raw: Value) -> Result<Value, ValidationError> {
    match raw {
        Value::Date(d) => Ok(Value::Date(d)),
        Value::Text(ref s) => parse_date(s)
            .map(Value::Date)
            .ok_or_else(|| ValidationError::InvalidDate(raw.to_string())),
        other => Err(ValidationError::InvalidDate(other.to_string())),
    }
}

/// Parses user-typed numeric text. A lone decimal comma is accepted as a separator.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let normalized = if trimmed.contains(',') && !trimmed.contains('.') {
        trimmed.replacen(',', ".", 1)
    } else {
        trimmed.to_string()
    };
    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parses `YYYY-MM-DD`, `DD.MM.YYYY`, or an RFC 3339 timestamp (date part).
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|timestamp| timestamp.date_naive())
        })
}
