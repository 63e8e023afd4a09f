//! Common test utilities for building field definitions and baselines.
use ahash::AHashMap;
use santei::prelude::*;

/// Length, Width, Height and a calculated Volume.
///
/// Logic: `Volume = Length * Width * Height`, rounded to 2 digits.
#[allow(dead_code)]
pub fn volume_definitions() -> Vec<FieldDefinition> {
    vec![
        FieldDefinition::new("Length", FieldType::Decimal),
        FieldDefinition::new("Width", FieldType::Decimal),
        FieldDefinition::new("Height", FieldType::Decimal),
        FieldDefinition::new("Volume", FieldType::Decimal).calculated(CalculatedSpec::new(
            "Length*Width*Height",
            ["Length", "Width", "Height"],
            2,
        )),
    ]
}

/// Same as `volume_definitions`, but Volume may be typed over by the user.
#[allow(dead_code)]
pub fn overridable_volume_definitions() -> Vec<FieldDefinition> {
    let mut definitions = volume_definitions();
    if let Some(spec) = definitions[3].calculated.as_mut() {
        spec.clear_dependencies_on_manual_edit = true;
    }
    definitions
}

/// A chain of calculated fields declared in reverse dependency order.
///
/// Logic: `Area = Length * Width`, `Weight = Volume * Density`, `Volume = Area * Height`.
/// `Weight` is declared before `Volume`, so a single definition-order pass computes it
/// from a stale `Volume`.
#[allow(dead_code)]
pub fn chained_definitions() -> Vec<FieldDefinition> {
    vec![
        FieldDefinition::new("Length", FieldType::Decimal),
        FieldDefinition::new("Width", FieldType::Decimal),
        FieldDefinition::new("Height", FieldType::Decimal),
        FieldDefinition::new("Density", FieldType::Decimal),
        FieldDefinition::new("Area", FieldType::Decimal).calculated(CalculatedSpec::new(
            "{Length} * {Width}",
            ["Length", "Width"],
            2,
        )),
        FieldDefinition::new("Weight", FieldType::Decimal).calculated(CalculatedSpec::new(
            "Volume * Density",
            ["Volume", "Density"],
            3,
        )),
        FieldDefinition::new("Volume", FieldType::Decimal).calculated(CalculatedSpec::new(
            "Area * Height",
            ["Area", "Height"],
            2,
        )),
    ]
}

/// Builds a baseline map from `(id, value)` pairs.
#[allow(dead_code)]
pub fn baseline<V: Into<Value>>(
    entries: impl IntoIterator<Item = (&'static str, V)>,
) -> AHashMap<String, Value> {
    entries
        .into_iter()
        .map(|(id, value)| (id.to_string(), value.into()))
        .collect()
}

/// The `Length=10, Width=5, Height=3` baseline used throughout the tests.
#[allow(dead_code)]
pub fn box_baseline() -> AHashMap<String, Value> {
    baseline([("Length", 10), ("Width", 5), ("Height", 3)])
}

/// Field list for driving the engine directly, in definition order.
#[allow(dead_code)]
pub fn field_values(schema: &FieldSchema, values: &AHashMap<String, Value>) -> Vec<FieldValue> {
    schema
        .definitions()
        .iter()
        .map(|d| FieldValue::new(d.id.clone(), values.get(&d.id).cloned().unwrap_or_default()))
        .collect()
}

#[allow(dead_code)]
pub fn value_of<'a>(fields: &'a [FieldValue], id: &str) -> &'a Value {
    &fields
        .iter()
        .find(|f| f.field_id == id)
        .unwrap_or_else(|| panic!("no field '{}'", id))
        .value
}
