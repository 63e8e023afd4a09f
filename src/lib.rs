//! # Santei - Derived-Field Calculation Engine
//!
//! **Santei** keeps the calculated fields of a metadata editing form up to date. Field
//! definitions declare arithmetic formulas over other fields; the engine evaluates them
//! without ever executing host code, tracks which fields depend on which, and lets the
//! user override an editable calculated field without the engine overwriting it mid-edit.
//!
//! ## Core Workflow
//!
//! 1.  **Load Your Schema**: Convert the field definitions delivered by your metadata API into
//!     santei's `FieldDefinition`s, either directly or by implementing `IntoFieldDefinitions`.
//! 2.  **Open a Form**: Create a `MetadataForm` from the definitions and the current values.
//!     Calculated fields are computed once on load.
//! 3.  **Edit**: Forward user edits with `update_field_value`, and focus/blur events of
//!     editable calculated fields with `on_field_focus`/`on_field_blur`.
//! 4.  **Save**: Call `save_metadata` with your `MetadataStore` implementation.
//!
//! ## Quick Start
//!
//! ```rust
//! use santei::prelude::*;
//! use ahash::AHashMap;
//!
//! let definitions = vec![
//!     FieldDefinition::new("Length", FieldType::Decimal),
//!     FieldDefinition::new("Width", FieldType::Decimal),
//!     FieldDefinition::new("Height", FieldType::Decimal),
//!     FieldDefinition::new("Volume", FieldType::Decimal).calculated(CalculatedSpec::new(
//!         "Length * Width * Height",
//!         ["Length", "Width", "Height"],
//!         2,
//!     )),
//! ];
//!
//! let mut baseline = AHashMap::new();
//! baseline.insert("Length".to_string(), Value::from(10));
//! baseline.insert("Width".to_string(), Value::from(5));
//! baseline.insert("Height".to_string(), Value::from(3));
//!
//! let mut form = MetadataForm::new(definitions, baseline)?;
//! assert_eq!(form.get_field_value("Volume"), Some(&Value::Decimal(150.0)));
//!
//! form.update_field_value("Length", 12)?;
//! assert_eq!(form.get_field_value("Volume"), Some(&Value::Decimal(180.0)));
//! assert!(form.has_changes());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod engine;
pub mod error;
pub mod form;
pub mod formula;
pub mod graph;
pub mod prelude;
pub mod schema;
