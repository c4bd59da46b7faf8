use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use rowsift_core::{Table, Value};
use tracing::debug;

use crate::ast::{CompareOp, Expr, Literal};

/// Non-fatal issue raised while evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalWarning {
    pub code: &'static str,
    pub message: String,
}

impl EvalWarning {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Result of evaluating one expression against a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// One entry per row; `true` keeps the row.
    pub mask: Vec<bool>,
    /// Columns read while evaluating.
    pub touched: BTreeSet<String>,
    pub warnings: Vec<EvalWarning>,
}

impl Evaluation {
    pub fn matched(&self) -> usize {
        self.mask.iter().filter(|keep| **keep).count()
    }
}

/// Evaluate `expr` into a row mask.
///
/// Comparisons involving a missing value are false. An unrecoverable issue
/// (an unknown field, an impossible date literal, a sum over incompatible
/// values) turns the whole mask false and is reported as a warning.
pub fn evaluate(expr: &Expr, table: &Table) -> Evaluation {
    let mut evaluator = Evaluator {
        table,
        rows: table.n_rows(),
        touched: BTreeSet::new(),
        warnings: Vec::new(),
    };
    let mask = match evaluator.mask(expr) {
        Ok(mask) => mask,
        Err(warning) => {
            evaluator.warnings.push(warning);
            vec![false; evaluator.rows]
        }
    };
    let evaluation = Evaluation {
        mask,
        touched: evaluator.touched,
        warnings: evaluator.warnings,
    };
    debug!(
        expression = %expr,
        rows = table.n_rows(),
        matched = evaluation.matched(),
        "expression evaluated"
    );
    evaluation
}

/// Per-row values of an operand: a borrowed column, a broadcast scalar or a
/// computed vector.
enum Operand<'a> {
    Column(&'a [Value]),
    Scalar(Value),
    Computed(Vec<Value>),
}

impl Operand<'_> {
    fn get(&self, row: usize) -> &Value {
        match self {
            Operand::Column(values) => &values[row],
            Operand::Scalar(value) => value,
            Operand::Computed(values) => &values[row],
        }
    }
}

struct Evaluator<'a> {
    table: &'a Table,
    rows: usize,
    touched: BTreeSet<String>,
    warnings: Vec<EvalWarning>,
}

impl<'a> Evaluator<'a> {
    fn mask(&mut self, expr: &Expr) -> Result<Vec<bool>, EvalWarning> {
        match expr {
            Expr::Field(_) | Expr::Literal(_) | Expr::Sum(..) => {
                let operand = self.resolve(expr)?;
                Ok((0..self.rows)
                    .map(|row| operand.get(row).is_truthy())
                    .collect())
            }
            Expr::Compare { left, op, right } => {
                let lhs = self.resolve(left)?;
                let rhs = self.resolve(right)?;
                let mut incomparable = false;
                let mask = (0..self.rows)
                    .map(|row| {
                        let (a, b) = (lhs.get(row), rhs.get(row));
                        if a.is_null() || b.is_null() {
                            return false;
                        }
                        match a.compare(b) {
                            Some(ordering) => apply_op(*op, ordering),
                            // Different kinds are never equal.
                            None => {
                                incomparable = true;
                                *op == CompareOp::Ne
                            }
                        }
                    })
                    .collect();
                if incomparable {
                    self.warnings.push(EvalWarning::new(
                        "incomparable_types",
                        format!("'{expr}' compares values of different kinds"),
                    ));
                }
                Ok(mask)
            }
            Expr::NullTest { operand, negated } => {
                let operand = self.resolve(operand)?;
                Ok((0..self.rows)
                    .map(|row| operand.get(row).is_null() != *negated)
                    .collect())
            }
            Expr::And(left, right) => {
                let left = self.mask(left)?;
                let right = self.mask(right)?;
                Ok(left.iter().zip(&right).map(|(a, b)| *a && *b).collect())
            }
            Expr::Or(left, right) => {
                let left = self.mask(left)?;
                let right = self.mask(right)?;
                Ok(left.iter().zip(&right).map(|(a, b)| *a || *b).collect())
            }
            Expr::Group(inner) => self.mask(inner),
        }
    }

    fn resolve(&mut self, expr: &Expr) -> Result<Operand<'a>, EvalWarning> {
        match expr {
            Expr::Field(name) => {
                let column = self.table.column(name).ok_or_else(|| {
                    EvalWarning::new("unknown_field", format!("field '{name}' not found"))
                })?;
                self.touched.insert(name.clone());
                Ok(Operand::Column(column.values()))
            }
            Expr::Literal(literal) => literal_value(literal).map(Operand::Scalar),
            Expr::Sum(left, right) => {
                let lhs = self.resolve(left)?;
                let rhs = self.resolve(right)?;
                let values = (0..self.rows)
                    .map(|row| add(lhs.get(row), rhs.get(row)))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| {
                        EvalWarning::new(
                            "invalid_sum",
                            format!("'{expr}' adds values that cannot be summed"),
                        )
                    })?;
                Ok(Operand::Computed(values))
            }
            other => Err(EvalWarning::new(
                "invalid_operand",
                format!("'{other}' is a predicate, not a value"),
            )),
        }
    }
}

fn literal_value(literal: &Literal) -> Result<Value, EvalWarning> {
    match literal {
        Literal::Int(value) => Ok(Value::Int(*value)),
        Literal::Float(value) => Ok(Value::Float(*value)),
        Literal::Na => Ok(Value::Null),
        Literal::Date(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map(Value::Date)
            .map_err(|err| {
                EvalWarning::new(
                    "unparseable_literal",
                    format!("DATE({raw}) is not a valid date: {err}"),
                )
            }),
    }
}

fn apply_op(op: CompareOp, ordering: Ordering) -> bool {
    match op {
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
    }
}

/// Elementwise addition. Nulls propagate; dates accept whole-day offsets
/// on either side. `None` means the pair cannot be added.
fn add(left: &Value, right: &Value) -> Option<Value> {
    if left.is_null() || right.is_null() {
        return Some(Value::Null);
    }
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.checked_add(*b).map(Value::Int),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            Some(Value::Float(left.as_f64()? + right.as_f64()?))
        }
        (Value::Date(_) | Value::DateTime(_), offset) => shift(left, offset),
        (offset, Value::Date(_) | Value::DateTime(_)) => shift(right, offset),
        _ => None,
    }
}

fn shift(temporal: &Value, offset: &Value) -> Option<Value> {
    if !matches!(offset, Value::Int(_) | Value::Float(_)) {
        return None;
    }
    let days = Duration::try_days(offset.as_i64()?)?;
    match temporal {
        Value::Date(date) => date.checked_add_signed(days).map(Value::Date),
        Value::DateTime(datetime) => datetime.checked_add_signed(days).map(Value::DateTime),
        _ => None,
    }
}
