use std::collections::BTreeSet;

use rowsift_core::Table;
use tracing::debug;

use crate::config::ConstraintConfig;
use crate::constraint::Constraint;
use crate::diagnostics::Diagnostics;
use crate::errors::Result;
use crate::registry::ConstraintRegistry;

/// Active constraints in canonical order.
#[derive(Debug)]
pub struct ConstraintPipeline {
    constraints: Vec<Box<dyn Constraint>>,
    build_diagnostics: Diagnostics,
}

impl ConstraintPipeline {
    pub fn new(constraints: Vec<Box<dyn Constraint>>, build_diagnostics: Diagnostics) -> Self {
        Self {
            constraints,
            build_diagnostics,
        }
    }

    /// Build with the built-in kinds only.
    pub fn from_config(config: &ConstraintConfig) -> Result<Self> {
        ConstraintRegistry::with_defaults().build(config)
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    /// Kinds of the active constraints, in application order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.constraints.iter().map(|constraint| constraint.kind())
    }

    /// Warnings raised while building the pipeline (unknown kinds).
    pub fn build_diagnostics(&self) -> &Diagnostics {
        &self.build_diagnostics
    }

    pub fn fields(&self) -> BTreeSet<String> {
        self.constraints
            .iter()
            .flat_map(|constraint| constraint.fields())
            .collect()
    }

    /// Check every active constraint's fields against `table`.
    pub fn validate(&self, table: &Table) -> Result<()> {
        self.constraints
            .iter()
            .try_for_each(|constraint| constraint.validate(table))
    }

    /// Thread `table` through every active constraint. The input is left
    /// untouched and the result has a dense zero-based index.
    pub fn apply(&self, table: &Table, diagnostics: &mut Diagnostics) -> Result<Table> {
        let mut current = table.clone();
        for constraint in &self.constraints {
            let before = current.n_rows();
            current = constraint.apply(&current, diagnostics)?;
            debug!(
                kind = constraint.kind(),
                rows_in = before,
                rows_out = current.n_rows(),
                "constraint applied"
            );
        }
        Ok(current)
    }
}
