use super::definition::FieldType;
use super::value::{FieldValue, Value};
use super::FieldSchema;
use serde_json::{Map, Number};

/// The map handed to the external update API on save.
///
/// A `null` entry means "remove this custom attribute".
pub type MetadataPayload = Map<String, serde_json::Value>;

/// Converts a single value to its wire representation for a field of `field_type`.
pub fn to_wire(field_type: FieldType, value: &Value) -> serde_json::Value {
    if value.is_empty() {
        return serde_json::Value::Null;
    }
    match (field_type, value) {
        (FieldType::Integer, Value::Integer(i)) => serde_json::Value::from(*i),
        (FieldType::Integer | FieldType::Decimal, v) => match v.as_number() {
            Some(n) if field_type == FieldType::Integer && n.fract() == 0.0 => {
                serde_json::Value::from(n as i64)
            }
            Some(n) => Number::from_f64(n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            None => serde_json::Value::String(v.to_string()),
        },
        (_, v) => serde_json::Value::String(v.to_string()),
    }
}

/// Builds the save payload for every field, in definition order.
pub fn build_payload(schema: &FieldSchema, fields: &[FieldValue]) -> MetadataPayload {
    fields
        .iter()
        .filter_map(|field| {
            let definition = schema.get(&field.field_id)?;
            Some((
                field.field_id.clone(),
                to_wire(definition.field_type, &field.value),
            ))
        })
        .collect()
}
