use std::fmt;

use serde_json::Value as JsonValue;
use tracing::info;

use crate::config::ConstraintConfig;
use crate::constraint::Constraint;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::errors::Result;
use crate::field_combination::FieldCombinationConstraint;
use crate::field_expr::FieldExprConstraint;
use crate::nan_group::NanGroupConstraint;
use crate::pipeline::ConstraintPipeline;

/// Builds a constraint from the raw configuration value of its kind.
pub type ConstraintFactory =
    Box<dyn Fn(&JsonValue) -> Result<Box<dyn Constraint>> + Send + Sync>;

/// Kind name -> constructor. Registration order is the canonical order in
/// which a pipeline applies its constraints.
pub struct ConstraintRegistry {
    kinds: Vec<(String, ConstraintFactory)>,
}

impl ConstraintRegistry {
    /// Registry with no kinds.
    pub fn empty() -> Self {
        Self { kinds: Vec::new() }
    }

    /// Registry holding the built-in kinds in their canonical order:
    /// `nan_groups`, `field_constraints`, `field_combinations`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry
            .register(NanGroupConstraint::KIND, |value| {
                NanGroupConstraint::from_config(value).map(boxed)
            })
            .register(FieldExprConstraint::KIND, |value| {
                FieldExprConstraint::from_config(value).map(boxed)
            })
            .register(FieldCombinationConstraint::KIND, |value| {
                FieldCombinationConstraint::from_config(value).map(boxed)
            });
        registry
    }

    /// Add a kind after the existing ones. Registering an existing name
    /// replaces its constructor and keeps its position.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&JsonValue) -> Result<Box<dyn Constraint>> + Send + Sync + 'static,
    {
        let name = name.into();
        let factory: ConstraintFactory = Box::new(factory);
        match self.kinds.iter_mut().find(|(kind, _)| *kind == name) {
            Some(slot) => slot.1 = factory,
            None => self.kinds.push((name, factory)),
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kinds.iter().any(|(kind, _)| kind == name)
    }

    /// Registered kind names in canonical order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.iter().map(|(kind, _)| kind.as_str())
    }

    /// Instantiate one constraint per registered kind present in `config`,
    /// in canonical order. Unknown keys are skipped with a warning.
    pub fn build(&self, config: &ConstraintConfig) -> Result<ConstraintPipeline> {
        let mut diagnostics = Diagnostics::new();
        for key in config.kinds() {
            if !self.contains(key) {
                diagnostics.record(Diagnostic::new(
                    "unknown_constraint_kind",
                    key,
                    key,
                    format!(
                        "'{key}' is not a registered constraint kind (known: {})",
                        self.kinds().collect::<Vec<_>>().join(", ")
                    ),
                ));
            }
        }

        let mut constraints = Vec::new();
        for (kind, factory) in &self.kinds {
            if let Some(value) = config.get(kind) {
                constraints.push(factory(value)?);
            }
        }

        let pipeline = ConstraintPipeline::new(constraints, diagnostics);
        info!(
            kinds = ?pipeline.kinds().collect::<Vec<_>>(),
            "constraint pipeline built"
        );
        Ok(pipeline)
    }
}

fn boxed<C: Constraint + 'static>(constraint: C) -> Box<dyn Constraint> {
    Box::new(constraint)
}

impl Default for ConstraintRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for ConstraintRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintRegistry")
            .field("kinds", &self.kinds().collect::<Vec<_>>())
            .finish()
    }
}
