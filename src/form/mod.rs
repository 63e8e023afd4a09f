use crate::engine::{OverrideController, RecalcOrder, Recalculator};
use crate::error::{FormError, SaveError, SchemaError};
use crate::graph::DependencyGraph;
use crate::schema::{
    FieldDefinition, FieldSchema, FieldValue, IntoFieldDefinitions, MetadataPayload, Value,
    build_payload,
};
use ahash::AHashMap;

pub mod store;
pub mod validation;

pub use store::{InMemoryStore, MetadataStore};

/// The published state of a form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormState {
    /// One entry per field definition, in definition order.
    pub fields: Vec<FieldValue>,
    pub is_valid: bool,
    pub is_loading: bool,
    pub has_changes: bool,
}

/// Validity of a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValidation {
    pub is_valid: bool,
    pub error_message: Option<String>,
}

/// Tuning for the recalculation behaviour of a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormOptions {
    pub recalc_order: RecalcOrder,
    /// Upper bound on repeated passes. `None` uses the number of calculated fields plus one.
    pub max_passes: Option<usize>,
}

/// Builder for a `MetadataForm`.
pub struct MetadataFormBuilder<D> {
    definitions: D,
    baseline: AHashMap<String, Value>,
    options: FormOptions,
}

impl<D: IntoFieldDefinitions> MetadataFormBuilder<D> {
    pub fn new(definitions: D, baseline: AHashMap<String, Value>) -> Self {
        Self {
            definitions,
            baseline,
            options: FormOptions::default(),
        }
    }

    pub fn with_recalc_order(mut self, order: RecalcOrder) -> Self {
        self.options.recalc_order = order;
        self
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.options.max_passes = Some(max_passes.max(1));
        self
    }

    pub fn with_options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Result<MetadataForm, SchemaError> {
        let schema = FieldSchema::new(self.definitions)?;
        let graph = DependencyGraph::new(&schema);
        let mut form = MetadataForm {
            schema,
            graph,
            options: self.options,
            controller: OverrideController::new(),
            baseline: self.baseline,
            snapshot: Vec::new(),
            state: FormState::default(),
        };
        form.load_baseline();
        Ok(form)
    }
}

/// One edit session over a set of metadata fields.
///
/// Holds per-field values and validity, keeps calculated fields up to date, and tracks
/// changes against the baseline the session started from.
pub struct MetadataForm {
    schema: FieldSchema,
    graph: DependencyGraph,
    options: FormOptions,
    controller: OverrideController,
    baseline: AHashMap<String, Value>,
    snapshot: Vec<Value>,
    state: FormState,
}

impl MetadataForm {
    pub fn builder<D: IntoFieldDefinitions>(
        definitions: D,
        baseline: AHashMap<String, Value>,
    ) -> MetadataFormBuilder<D> {
        MetadataFormBuilder::new(definitions, baseline)
    }

    /// Creates a form with default options.
    pub fn new(
        definitions: impl IntoFieldDefinitions,
        baseline: AHashMap<String, Value>,
    ) -> Result<Self, SchemaError> {
        Self::builder(definitions, baseline).build()
    }

    /// Sets a field from user input and brings the rest of the form up to date.
    ///
    /// Type problems are recorded on the field, not returned. Errors are returned only for
    /// unknown fields and fields that cannot be edited directly.
    pub fn update_field_value(
        &mut self,
        field_id: &str,
        value: impl Into<Value>,
    ) -> Result<(), FormError> {
        let definition = self
            .schema
            .get(field_id)
            .ok_or_else(|| FormError::UnknownField(field_id.to_string()))?;
        if !definition.is_editable() {
            return Err(FormError::ReadOnlyField(field_id.to_string()));
        }
        let position = self
            .position(field_id)
            .ok_or_else(|| FormError::UnknownField(field_id.to_string()))?;

        self.state.fields[position] = validation::validate(definition, value.into());

        if definition.allows_manual_override() {
            self.controller.apply_manual_edit(
                &self.schema,
                &self.graph,
                &mut self.state.fields,
                field_id,
            );
        } else {
            let recalculator =
                Recalculator::new(&self.schema, &self.graph, self.options.recalc_order);
            let result = recalculator.converge(
                &self.state.fields,
                self.controller.focused(),
                self.max_passes(),
            );
            self.state.fields = result.fields;
        }

        self.refresh_flags();
        Ok(())
    }

    /// Marks `field_id` as being edited. Only override-enabled calculated fields participate.
    pub fn on_field_focus(&mut self, field_id: &str) -> bool {
        self.controller.on_field_focus(&self.schema, field_id)
    }

    /// Ends editing of `field_id`, restoring its computed value if the override was left
    /// empty or invalid.
    pub fn on_field_blur(&mut self, field_id: &str) {
        let max_passes = self.max_passes();
        let recalculator = Recalculator::new(&self.schema, &self.graph, self.options.recalc_order);
        let fields = std::mem::take(&mut self.state.fields);
        self.state.fields =
            self.controller
                .on_field_blur(field_id, fields, &recalculator, max_passes);
        self.refresh_flags();
    }

    /// Validates the form and hands its wire representation to `store`.
    ///
    /// Refuses without calling the store when any field is invalid. On success the saved
    /// values become the new baseline. On failure the edits are kept so the user can retry.
    /// `is_loading` is set while the store call is pending. Dropping the returned future
    /// mid-call leaves it set until the next save or reset.
    pub async fn save_metadata<S: MetadataStore>(
        &mut self,
        store: &S,
        identifier: &str,
    ) -> Result<MetadataPayload, SaveError> {
        if !self.state.is_valid {
            return Err(SaveError::InvalidForm {
                invalid_fields: self.invalid_fields(),
            });
        }

        let payload = build_payload(&self.schema, &self.state.fields);
        log::info!(
            "Saving {} metadata fields for '{}'",
            payload.len(),
            identifier
        );

        self.state.is_loading = true;
        let outcome = store.update_metadata(identifier, &payload).await;
        self.state.is_loading = false;

        match outcome {
            Ok(()) => {
                self.baseline = self
                    .state
                    .fields
                    .iter()
                    .map(|f| (f.field_id.clone(), f.value.clone()))
                    .collect();
                self.take_snapshot();
                self.state.has_changes = false;
                Ok(payload)
            }
            Err(error) => {
                log::warn!("Saving metadata for '{}' failed: {}", identifier, error);
                Err(error.into())
            }
        }
    }

    /// Discards all edits and reloads the baseline.
    pub fn reset_form(&mut self) {
        self.load_baseline();
    }

    pub fn get_field_value(&self, field_id: &str) -> Option<&Value> {
        self.field(field_id).map(|f| &f.value)
    }

    pub fn get_field_validation(&self, field_id: &str) -> Option<FieldValidation> {
        self.field(field_id).map(|f| FieldValidation {
            is_valid: f.is_valid,
            error_message: f.error_message.clone(),
        })
    }

    pub fn get_field_definition(&self, field_id: &str) -> Option<&FieldDefinition> {
        self.schema.get(field_id)
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn fields(&self) -> &[FieldValue] {
        &self.state.fields
    }

    pub fn is_valid(&self) -> bool {
        self.state.is_valid
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    pub fn has_changes(&self) -> bool {
        self.state.has_changes
    }

    pub fn focused_field(&self) -> Option<&str> {
        self.controller.focused()
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Ids of all invalid fields, in definition order.
    pub fn invalid_fields(&self) -> Vec<String> {
        self.state
            .fields
            .iter()
            .filter(|f| !f.is_valid)
            .map(|f| f.field_id.clone())
            .collect()
    }

    fn load_baseline(&mut self) {
        self.controller = OverrideController::new();
        let fields: Vec<FieldValue> = self
            .schema
            .definitions()
            .iter()
            .map(|definition| {
                let raw = self
                    .baseline
                    .get(&definition.id)
                    .cloned()
                    .unwrap_or_default();
                validation::validate(definition, raw)
            })
            .collect();

        let recalculator = Recalculator::new(&self.schema, &self.graph, self.options.recalc_order);
        self.state = FormState {
            fields: recalculator.converge(&fields, None, self.max_passes()).fields,
            ..FormState::default()
        };
        self.take_snapshot();
        self.refresh_flags();
    }

    fn take_snapshot(&mut self) {
        self.snapshot = self.state.fields.iter().map(|f| f.value.clone()).collect();
    }

    fn refresh_flags(&mut self) {
        self.state.is_valid = self.state.fields.iter().all(|f| f.is_valid);
        self.state.has_changes = self
            .state
            .fields
            .iter()
            .zip(&self.snapshot)
            .any(|(field, original)| !field.value.same_as(original));
    }

    fn max_passes(&self) -> usize {
        self.options
            .max_passes
            .unwrap_or_else(|| self.schema.calculated().count() + 1)
    }

    fn position(&self, field_id: &str) -> Option<usize> {
        self.schema
            .position(field_id)
            .filter(|&i| self.state.fields.get(i).is_some_and(|f| f.field_id == field_id))
    }

    fn field(&self, field_id: &str) -> Option<&FieldValue> {
        self.position(field_id).map(|i| &self.state.fields[i])
    }
}
