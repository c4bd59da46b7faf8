use std::collections::BTreeSet;
use std::fmt;

use rowsift_core::Table;

use crate::diagnostics::Diagnostics;
use crate::errors::{ConfigError, Result};

/// A rule that narrows a table to the rows satisfying it.
///
/// Implementations are immutable once built, so one instance may be applied
/// to independent tables concurrently. `apply` never mutates its input.
pub trait Constraint: fmt::Debug + Send + Sync {
    /// Configuration key of this constraint kind.
    fn kind(&self) -> &str;

    /// Every field the constraint reads or writes.
    fn fields(&self) -> BTreeSet<String>;

    /// Check that every referenced field exists in `table`.
    fn validate(&self, table: &Table) -> Result<()> {
        for field in self.fields() {
            if !table.has_column(&field) {
                return Err(ConfigError::FieldNotFound {
                    kind: self.kind().to_string(),
                    field,
                });
            }
        }
        Ok(())
    }

    /// Validate, then return the rows of `table` that satisfy the constraint.
    /// Per-rule data anomalies are recorded in `diagnostics` and skipped.
    fn apply(&self, table: &Table, diagnostics: &mut Diagnostics) -> Result<Table>;
}
