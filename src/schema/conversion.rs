use super::definition::FieldDefinition;
use crate::error::SchemaError;

/// A trait for custom schema formats that can be converted into santei field definitions.
///
/// This is the extension point for the metadata-schema collaborator: whatever shape the
/// remote API delivers, implementing this trait translates it into the canonical
/// `FieldDefinition` list the engine works on.
///
/// # Example
///
/// ```rust,no_run
/// use santei::prelude::*;
/// use santei::error::SchemaError;
///
/// struct RemoteAttribute { key: String, kind: String }
/// struct RemoteSchema { attributes: Vec<RemoteAttribute> }
///
/// impl IntoFieldDefinitions for RemoteSchema {
///     fn into_field_definitions(self) -> Result<Vec<FieldDefinition>, SchemaError> {
///         self.attributes
///             .into_iter()
///             .map(|attr| {
///                 let field_type = match attr.kind.as_str() {
///                     "int" => FieldType::Integer,
///                     "number" => FieldType::Decimal,
///                     "date" => FieldType::Date,
///                     "text" => FieldType::String,
///                     other => {
///                         let message = format!("unknown kind '{}'", other);
///                         return Err(SchemaError::Conversion(message));
///                     }
///                 };
///                 Ok(FieldDefinition::new(attr.key, field_type))
///             })
///             .collect()
///     }
/// }
/// ```
pub trait IntoFieldDefinitions {
    /// Consumes the object and converts it into santei field definitions.
    fn into_field_definitions(self) -> Result<Vec<FieldDefinition>, SchemaError>;
}

impl IntoFieldDefinitions for Vec<FieldDefinition> {
    fn into_field_definitions(self) -> Result<Vec<FieldDefinition>, SchemaError> {
        Ok(self)
    }
}

impl IntoFieldDefinitions for &str {
    /// Parses a JSON array of camelCase field definitions.
    fn into_field_definitions(self) -> Result<Vec<FieldDefinition>, SchemaError> {
        serde_json::from_str(self).map_err(|e| SchemaError::Conversion(e.to_string()))
    }
}
