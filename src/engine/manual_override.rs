use super::Recalculator;
use crate::form::validation;
use crate::graph::DependencyGraph;
use crate::schema::{FieldSchema, FieldValue, Value};
use itertools::Itertools;

/// Governs manual overrides of calculated fields.
///
/// Tracks at most one focused field. Only calculated fields with
/// `clear_dependencies_on_manual_edit` take part; focusing any other field is a no-op.
#[derive(Debug, Clone, Default)]
pub struct OverrideController {
    focused: Option<String>,
}

impl OverrideController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    /// Records `field_id` as focused if it allows manual override.
    ///
    /// Returns whether the focus was recorded.
    pub fn on_field_focus(&mut self, schema: &FieldSchema, field_id: &str) -> bool {
        let participates = schema
            .get(field_id)
            .is_some_and(|definition| definition.allows_manual_override());
        if participates {
            self.focused = Some(field_id.to_string());
        }
        participates
    }

    /// Releases the focus on `field_id`.
    ///
    /// When the field was the focused one and the user left it empty or invalid, the
    /// override is abandoned and a full recalculation restores the computed value.
    pub fn on_field_blur(
        &mut self,
        field_id: &str,
        fields: Vec<FieldValue>,
        recalculator: &Recalculator<'_>,
        max_passes: usize,
    ) -> Vec<FieldValue> {
        if self.focused.as_deref() != Some(field_id) {
            return fields;
        }
        self.focused = None;

        let abandoned = fields
            .iter()
            .find(|f| f.field_id == field_id)
            .is_some_and(|f| f.value.is_empty() || !f.is_valid);
        if !abandoned {
            return fields;
        }

        log::debug!("Override of '{}' left incomplete, recalculating", field_id);
        recalculator.converge(&fields, None, max_passes).fields
    }

    /// Applies a manual edit of an override-enabled calculated field.
    ///
    /// Clears the field's own dependencies and then every field that transitively depends
    /// on one of them, except the edited field itself. The edited field keeps the value the
    /// user typed. Returns the ids that were cleared, in clearing order.
    pub fn apply_manual_edit(
        &self,
        schema: &FieldSchema,
        graph: &DependencyGraph,
        fields: &mut [FieldValue],
        edited_id: &str,
    ) -> Vec<String> {
        let Some(definition) = schema.get(edited_id) else {
            return Vec::new();
        };
        if !definition.allows_manual_override() {
            return Vec::new();
        }

        let dependencies = graph.dependencies(edited_id);
        let cleared: Vec<String> = dependencies
            .iter()
            .cloned()
            .chain(dependencies.iter().flat_map(|dep| graph.dependents(dep)))
            .filter(|id| id != edited_id && schema.contains(id))
            .unique()
            .collect();

        for id in &cleared {
            let Some(target) = schema.get(id) else {
                continue;
            };
            if let Some(field) = fields.iter_mut().find(|f| &f.field_id == id) {
                *field = validation::validate(target, Value::Null);
            }
        }

        log::debug!(
            "Manual override of '{}' cleared [{}]",
            edited_id,
            cleared.iter().join(", ")
        );
        cleared
    }
}
