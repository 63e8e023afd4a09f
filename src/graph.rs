use crate::schema::FieldSchema;
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use std::collections::VecDeque;

/// Dependency relationships between the fields of one schema.
///
/// Built once per schema. Cycles are tolerated: traversals never revisit a field, and
/// fields caught in a cycle are placed after all acyclic fields in the calculation order.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    // Calculated field id -> the ids its formula reads.
    dependencies: AHashMap<String, Vec<String>>,
    // Field id -> calculated fields that read it directly, in definition order.
    dependents: AHashMap<String, Vec<String>>,
    calculation_order: Vec<String>,
    cyclic: Vec<String>,
}

impl DependencyGraph {
    pub fn new(schema: &FieldSchema) -> Self {
        let mut dependencies = AHashMap::new();
        let mut dependents: AHashMap<String, Vec<String>> = AHashMap::new();

        for definition in schema.calculated() {
            let deps: Vec<String> = definition.dependencies().iter().unique().cloned().collect();
            for dep in &deps {
                dependents
                    .entry(dep.clone())
                    .or_default()
                    .push(definition.id.clone());
            }
            dependencies.insert(definition.id.clone(), deps);
        }

        let (calculation_order, cyclic) = Self::sort(schema, &dependencies, &dependents);
        if !cyclic.is_empty() {
            log::warn!(
                "Calculated fields form a dependency cycle and may not converge: {}",
                cyclic.iter().join(", ")
            );
        }

        Self {
            dependencies,
            dependents,
            calculation_order,
            cyclic,
        }
    }

    /// Kahn's algorithm over calculated fields. Inputs that are not themselves calculated
    /// never block a field.
    fn sort(
        schema: &FieldSchema,
        dependencies: &AHashMap<String, Vec<String>>,
        dependents: &AHashMap<String, Vec<String>>,
    ) -> (Vec<String>, Vec<String>) {
        let mut in_degree: AHashMap<&str, usize> = dependencies
            .iter()
            .map(|(id, deps)| {
                let blocking = deps
                    .iter()
                    .filter(|dep| dependencies.contains_key(dep.as_str()))
                    .count();
                (id.as_str(), blocking)
            })
            .collect();

        let mut ready: VecDeque<&str> = schema
            .calculated()
            .map(|d| d.id.as_str())
            .filter(|id| in_degree.get(id) == Some(&0))
            .collect();

        let mut order = Vec::with_capacity(in_degree.len());
        while let Some(id) = ready.pop_front() {
            order.push(id.to_string());
            for dependent in dependents.get(id).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push_back(dependent.as_str());
                    }
                }
            }
        }

        let placed: AHashSet<&str> = order.iter().map(String::as_str).collect();
        let cyclic: Vec<String> = schema
            .calculated()
            .filter(|d| !placed.contains(d.id.as_str()))
            .map(|d| d.id.clone())
            .collect();

        order.extend(cyclic.iter().cloned());
        (order, cyclic)
    }

    /// The fields the formula of `field_id` reads. Empty for non-calculated fields.
    pub fn dependencies(&self, field_id: &str) -> &[String] {
        self.dependencies
            .get(field_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every calculated field that depends on `field_id`, directly or transitively.
    ///
    /// Depth-first, in discovery order. A field already seen during this call is not
    /// expanded again, which guarantees termination on cyclic graphs. The starting field
    /// itself is never part of the result.
    pub fn dependents(&self, field_id: &str) -> Vec<String> {
        let mut visited: AHashSet<&str> = AHashSet::new();
        visited.insert(field_id);
        let mut result = Vec::new();
        self.collect_dependents(field_id, &mut visited, &mut result);
        result.into_iter().unique().collect()
    }

    fn collect_dependents<'a>(
        &'a self,
        field_id: &str,
        visited: &mut AHashSet<&'a str>,
        result: &mut Vec<String>,
    ) {
        for dependent in self.dependents.get(field_id).into_iter().flatten() {
            if !visited.insert(dependent.as_str()) {
                continue;
            }
            result.push(dependent.clone());
            self.collect_dependents(dependent, visited, result);
        }
    }

    /// Calculated field ids in dependency order, cyclic fields last in definition order.
    pub fn topological_order(&self) -> &[String] {
        &self.calculation_order
    }

    pub fn cycles_detected(&self) -> bool {
        !self.cyclic.is_empty()
    }

    /// Calculated fields that could not be ordered because they sit in or behind a cycle.
    pub fn cyclic_fields(&self) -> &[String] {
        &self.cyclic
    }
}
