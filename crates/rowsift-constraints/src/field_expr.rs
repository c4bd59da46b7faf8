use std::collections::BTreeSet;

use rowsift_core::Table;
use rowsift_expr::{Expr, evaluate, parse_expression};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::constraint::Constraint;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::errors::{ConfigError, Result};

#[derive(Debug, Clone)]
struct CompiledExpression {
    source: String,
    expr: Expr,
}

/// Ordered list of boolean expressions. Each expression filters the result
/// of the previous one, so the list acts as a cumulative AND.
#[derive(Debug, Clone)]
pub struct FieldExprConstraint {
    expressions: Vec<CompiledExpression>,
}

impl FieldExprConstraint {
    pub const KIND: &'static str = "field_constraints";

    /// Parse every expression up front. Any grammar problem fails here,
    /// independent of the data the constraint is later applied to.
    pub fn new<I, S>(expressions: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut compiled = Vec::new();
        for (index, source) in expressions.into_iter().enumerate() {
            let source = source.into();
            let expr = parse_expression(&source).map_err(|err| ConfigError::InvalidExpression {
                kind: Self::KIND.to_string(),
                index,
                expression: source.clone(),
                source: err,
            })?;
            compiled.push(CompiledExpression { source, expr });
        }
        if compiled.is_empty() {
            return Err(ConfigError::invalid(
                Self::KIND,
                "at least one expression is required",
            ));
        }
        Ok(Self {
            expressions: compiled,
        })
    }

    /// Build from a JSON array of expression strings.
    pub fn from_config(value: &JsonValue) -> Result<Self> {
        let items = value
            .as_array()
            .ok_or_else(|| ConfigError::invalid(Self::KIND, "expected a list of expressions"))?;
        let mut sources = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let source = item.as_str().ok_or_else(|| {
                ConfigError::invalid(
                    Self::KIND,
                    format!("entry {index} must be a string, found {item}"),
                )
            })?;
            sources.push(source.to_string());
        }
        Self::new(sources)
    }

    pub fn expressions(&self) -> impl Iterator<Item = &str> {
        self.expressions.iter().map(|compiled| compiled.source.as_str())
    }
}

impl Constraint for FieldExprConstraint {
    fn kind(&self) -> &str {
        Self::KIND
    }

    fn fields(&self) -> BTreeSet<String> {
        self.expressions
            .iter()
            .flat_map(|compiled| compiled.expr.fields())
            .collect()
    }

    fn apply(&self, table: &Table, diagnostics: &mut Diagnostics) -> Result<Table> {
        self.validate(table)?;

        let mut current = table.clone();
        for compiled in &self.expressions {
            let evaluation = evaluate(&compiled.expr, &current);
            for warning in evaluation.warnings.iter() {
                diagnostics.record(Diagnostic::new(
                    warning.code,
                    Self::KIND,
                    compiled.source.as_str(),
                    warning.message.as_str(),
                ));
            }
            let before = current.n_rows();
            current = current.filter(&evaluation.mask);
            debug!(
                expression = %compiled.source,
                rows_in = before,
                rows_out = current.n_rows(),
                "field constraint applied"
            );
        }
        Ok(current)
    }
}
