pub mod conversion;
pub mod definition;
pub mod value;
pub mod wire;

pub use conversion::*;
pub use definition::*;
pub use value::*;
pub use wire::*;

use crate::error::SchemaError;
use ahash::{AHashMap, AHashSet};

/// A validated, indexed set of field definitions.
///
/// Field ids are unique. Dependencies that name an id outside the set are kept as
/// written; the engine treats them as permanently unsatisfied.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    definitions: Vec<FieldDefinition>,
    index: AHashMap<String, usize>,
}

impl FieldSchema {
    pub fn new(definitions: impl IntoFieldDefinitions) -> Result<Self, SchemaError> {
        let definitions = definitions.into_field_definitions()?;
        let mut index = AHashMap::with_capacity(definitions.len());

        for (position, definition) in definitions.iter().enumerate() {
            if index.insert(definition.id.clone(), position).is_some() {
                return Err(SchemaError::DuplicateFieldId(definition.id.clone()));
            }
        }

        for definition in &definitions {
            let dangling: AHashSet<&String> = definition
                .dependencies()
                .iter()
                .filter(|dep| !index.contains_key(dep.as_str()))
                .collect();
            if !dangling.is_empty() {
                log::warn!(
                    "Calculated field '{}' references unknown fields {:?}; \
                     it will never be computed",
                    definition.id,
                    dangling
                );
            }
        }

        Ok(Self { definitions, index })
    }

    pub fn get(&self, field_id: &str) -> Option<&FieldDefinition> {
        self.index.get(field_id).map(|&i| &self.definitions[i])
    }

    /// Position of the field in definition order.
    pub fn position(&self, field_id: &str) -> Option<usize> {
        self.index.get(field_id).copied()
    }

    pub fn contains(&self, field_id: &str) -> bool {
        self.index.contains_key(field_id)
    }

    pub fn definitions(&self) -> &[FieldDefinition] {
        &self.definitions
    }

    pub fn calculated(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.definitions.iter().filter(|d| d.is_calculated())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
