//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the santei crate.

// Form session and persistence
pub use crate::form::{
    FieldValidation, FormOptions, FormState, InMemoryStore, MetadataForm, MetadataStore,
};

// Engine building blocks
pub use crate::engine::{FieldChange, OverrideController, RecalcOrder, Recalculation, Recalculator};
pub use crate::formula::{evaluate, round_to_precision};
pub use crate::graph::DependencyGraph;

// Schema and value types
pub use crate::schema::{
    CalculatedSpec, FieldDefinition, FieldSchema, FieldType, FieldValue, IntoFieldDefinitions,
    MetadataPayload, Value,
};

// Error types
pub use crate::error::{FormError, SaveError, SchemaError, StoreError, ValidationError};
