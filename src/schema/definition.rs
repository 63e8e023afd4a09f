use serde::{Deserialize, Serialize};

/// The declared type of a metadata field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    String,
    Integer,
    Decimal,
    Date,
}

/// Describes how a derived field is computed from other fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedSpec {
    /// Arithmetic template referencing other field ids, either bare (`Length * Width`)
    /// or brace-delimited (`{Length} * {Width}`).
    pub formula: String,
    /// Field ids the formula reads, in declaration order.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Number of decimal digits the result is rounded to.
    #[serde(default)]
    pub precision: u32,
    /// Marks the field as also directly editable by the user.
    #[serde(default)]
    pub clear_dependencies_on_manual_edit: bool,
}

/// A single field of a metadata schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub calculated: Option<CalculatedSpec>,
}

impl FieldDefinition {
    /// Creates a plain, optional, editable field.
    pub fn new(id: impl Into<String>, field_type: FieldType) -> Self {
        let id = id.into();
        Self {
            description: id.clone(),
            id,
            field_type,
            required: false,
            read_only: false,
            calculated: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn calculated(mut self, spec: CalculatedSpec) -> Self {
        self.calculated = Some(spec);
        self
    }

    pub fn is_calculated(&self) -> bool {
        self.calculated.is_some()
    }

    /// True for calculated fields that the user may also type into.
    pub fn allows_manual_override(&self) -> bool {
        self.calculated
            .as_ref()
            .is_some_and(|spec| spec.clear_dependencies_on_manual_edit)
    }

    /// Whether a direct edit from the form is allowed at all.
    pub fn is_editable(&self) -> bool {
        !self.read_only && (!self.is_calculated() || self.allows_manual_override())
    }

    pub fn dependencies(&self) -> &[String] {
        self.calculated
            .as_ref()
            .map(|spec| spec.dependencies.as_slice())
            .unwrap_or(&[])
    }
}

impl CalculatedSpec {
    pub fn new<I, S>(formula: impl Into<String>, dependencies: I, precision: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            formula: formula.into(),
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            precision,
            clear_dependencies_on_manual_edit: false,
        }
    }

    pub fn with_manual_override(mut self) -> Self {
        self.clear_dependencies_on_manual_edit = true;
        self
    }
}
