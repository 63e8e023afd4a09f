use crate::formula::{evaluate, round_to_precision};
use crate::graph::DependencyGraph;
use crate::schema::{FieldDefinition, FieldSchema, FieldType, FieldValue, Value};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

mod manual_override;

pub use manual_override::OverrideController;

/// The order in which calculated fields are visited during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecalcOrder {
    /// Dependencies before dependents. Chains of calculated fields settle in one pass.
    #[default]
    Topological,
    /// Definition order, repeated until nothing changes. Reproduces the legacy behaviour
    /// where chained calculated fields only settle across several passes.
    DefinitionOrder,
}

/// A single value change made by a recalculation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field_id: String,
    pub previous: Value,
    pub current: Value,
}

/// The outcome of recalculating a field list.
#[derive(Debug, Clone, PartialEq)]
pub struct Recalculation {
    pub fields: Vec<FieldValue>,
    pub changes: Vec<FieldChange>,
}

impl Recalculation {
    /// Whether any calculated value differs from the input list.
    pub fn changed(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// Recomputes calculated fields from their dependencies.
pub struct Recalculator<'a> {
    schema: &'a FieldSchema,
    graph: &'a DependencyGraph,
    order: RecalcOrder,
}

impl<'a> Recalculator<'a> {
    pub fn new(schema: &'a FieldSchema, graph: &'a DependencyGraph, order: RecalcOrder) -> Self {
        Self {
            schema,
            graph,
            order,
        }
    }

    /// Runs a single pass over every calculated field and returns the new field list.
    ///
    /// The input is left untouched. `focused` names the field currently being typed into;
    /// if it allows manual override it is skipped so a half-typed value survives.
    pub fn recalculate(&self, fields: &[FieldValue], focused: Option<&str>) -> Recalculation {
        let mut fields = fields.to_vec();
        // Fields that failed validation never feed a formula.
        let mut values: AHashMap<String, Value> = fields
            .iter()
            .filter(|f| f.is_valid)
            .map(|f| (f.field_id.clone(), f.value.clone()))
            .collect();
        let mut changes = Vec::new();

        for definition in self.visit_order() {
            let Some(spec) = &definition.calculated else {
                continue;
            };
            if spec.clear_dependencies_on_manual_edit && focused == Some(definition.id.as_str()) {
                log::debug!("Skipping '{}' while it is being edited", definition.id);
                continue;
            }
            let Some(field) = fields.iter_mut().find(|f| f.field_id == definition.id) else {
                continue;
            };

            let dependencies_ready = spec
                .dependencies
                .iter()
                .all(|dep| values.get(dep).and_then(Value::as_number).is_some());

            let computed = if dependencies_ready {
                evaluate(&spec.formula, &values).map(|n| {
                    calculated_value(definition.field_type, round_to_precision(n, spec.precision))
                })
            } else {
                None
            };

            let previous = field.value.clone();
            match computed {
                Some(value) => {
                    field.value = value;
                    field.is_valid = true;
                    field.error_message = None;
                }
                None if previous != Value::Null => field.clear(),
                None => {}
            }
            values.insert(definition.id.clone(), field.value.clone());

            if field.value != previous {
                log::debug!(
                    "Recalculated '{}': '{}' -> '{}'",
                    definition.id,
                    previous,
                    field.value
                );
                changes.push(FieldChange {
                    field_id: definition.id.clone(),
                    previous,
                    current: field.value.clone(),
                });
            }
        }

        Recalculation { fields, changes }
    }

    /// Repeats passes until one changes nothing or `max_passes` is reached.
    ///
    /// Changes are accumulated so a field touched in several passes reports its first
    /// previous value and its final value.
    pub fn converge(
        &self,
        fields: &[FieldValue],
        focused: Option<&str>,
        max_passes: usize,
    ) -> Recalculation {
        let mut current = self.recalculate(fields, focused);
        let settled_in_one_pass =
            self.order == RecalcOrder::Topological && !self.graph.cycles_detected();
        if settled_in_one_pass {
            return current;
        }

        let mut passes = 1;
        let mut last_pass_changed = current.changed();
        while last_pass_changed && passes < max_passes {
            let next = self.recalculate(&current.fields, focused);
            last_pass_changed = next.changed();
            merge_changes(&mut current.changes, next.changes);
            current.fields = next.fields;
            passes += 1;
        }

        if last_pass_changed {
            log::warn!(
                "Recalculation did not settle after {} passes; \
                 the field definitions likely contain a cycle",
                passes
            );
        }
        current
    }

    fn visit_order(&self) -> Vec<&'a FieldDefinition> {
        match self.order {
            RecalcOrder::Topological => self
                .graph
                .topological_order()
                .iter()
                .filter_map(|id| self.schema.get(id))
                .collect(),
            RecalcOrder::DefinitionOrder => self.schema.calculated().collect(),
        }
    }
}

/// Calculated values are stored as integers for integer fields when the result is whole.
fn calculated_value(field_type: FieldType, n: f64) -> Value {
    if field_type == FieldType::Integer && n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::Integer(n as i64)
    } else {
        Value::Decimal(n)
    }
}

fn merge_changes(accumulated: &mut Vec<FieldChange>, newer: Vec<FieldChange>) {
    for change in newer {
        match accumulated.iter_mut().find(|c| c.field_id == change.field_id) {
            Some(existing) => existing.current = change.current,
            None => accumulated.push(change),
        }
    }
    accumulated.retain(|c| c.previous != c.current);
}
