use thiserror::Error;

/// Errors that can occur while building a `FieldSchema` from field definitions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Field id '{0}' is defined more than once")]
    DuplicateFieldId(String),

    #[error("Invalid custom schema data: {0}")]
    Conversion(String),
}

/// Type or presence failures for a single field value.
///
/// The `Display` text is what ends up in `FieldValue::error_message`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("This field is required")]
    Required,

    #[error("'{0}' is not a valid number")]
    NotANumber(String),

    #[error("'{0}' is not a whole number")]
    NotAnInteger(String),

    #[error("'{0}' is not a valid date")]
    InvalidDate(String),
}

/// Errors caused by using the form container incorrectly.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    #[error("Field '{0}' does not exist in this form")]
    UnknownField(String),

    #[error("Field '{0}' cannot be edited directly")]
    ReadOnlyField(String),
}

/// Errors reported by the persistence collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("The update for '{identifier}' was rejected: {message}")]
    Rejected { identifier: String, message: String },
}

/// Errors that can occur when saving a form.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SaveError {
    #[error("The form has invalid fields: {}", invalid_fields.join(", "))]
    InvalidForm { invalid_fields: Vec<String> },

    #[error(transparent)]
    Store(#[from] StoreError),
}
