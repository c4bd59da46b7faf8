use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use rowsift_core::{Table, Value};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::NULL_SENTINEL;
use crate::constraint::Constraint;
use crate::diagnostics::Diagnostics;
use crate::errors::{ConfigError, Result};
use crate::model::{
    FieldCombinationEntry, FieldCombinationSpec, Scalar, ScalarList, SourceFields,
};

/// Source side of a combination rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKey {
    Single(String),
    Composite(Vec<String>),
}

impl SourceKey {
    /// Parse a pair-form key: `"dept"` or `"(dept, level)"`.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        match trimmed.strip_prefix('(').and_then(|rest| rest.strip_suffix(')')) {
            Some(inner) => {
                let names: Vec<String> = inner
                    .split(',')
                    .map(|name| unquote(name).to_string())
                    .collect();
                if names.iter().any(String::is_empty) {
                    return None;
                }
                Some(SourceKey::Composite(names))
            }
            None if !trimmed.is_empty() => Some(SourceKey::Single(trimmed.to_string())),
            None => None,
        }
    }

    pub fn fields(&self) -> Vec<&str> {
        match self {
            SourceKey::Single(name) => vec![name.as_str()],
            SourceKey::Composite(names) => names.iter().map(String::as_str).collect(),
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            SourceKey::Single(_) => 1,
            SourceKey::Composite(names) => names.len(),
        }
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKey::Single(name) => f.write_str(name),
            SourceKey::Composite(names) => write!(f, "({})", names.join(", ")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Matcher {
    Null,
    Equals(Scalar),
}

impl Matcher {
    fn from_scalar(value: Option<Scalar>) -> Self {
        match value {
            None => Matcher::Null,
            Some(Scalar::Text(text)) if text == NULL_SENTINEL => Matcher::Null,
            Some(scalar) => Matcher::Equals(scalar),
        }
    }

    fn from_text(text: &str) -> Self {
        Self::from_scalar(Some(Scalar::Text(unquote(text).to_string())))
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            Matcher::Null => value.is_null(),
            Matcher::Equals(scalar) => !value.is_null() && scalar_matches(scalar, value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Condition {
    when: Vec<Matcher>,
    allowed: Vec<Matcher>,
}

#[derive(Debug, Clone, PartialEq)]
struct CombinationRule {
    source: SourceKey,
    target: String,
    conditions: Vec<Condition>,
}

impl CombinationRule {
    /// Rows where some condition's source matches but the target is not
    /// among the allowed values.
    fn violations(&self, table: &Table) -> Result<Vec<bool>> {
        let sources = self
            .source
            .fields()
            .into_iter()
            .map(|name| table.require_column(name).map(|column| column.values()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let target = table.require_column(&self.target)?.values();

        Ok((0..table.n_rows())
            .map(|row| {
                self.conditions.iter().any(|condition| {
                    let source_matches = condition
                        .when
                        .iter()
                        .zip(&sources)
                        .all(|(matcher, values)| matcher.matches(&values[row]));
                    source_matches
                        && !condition
                            .allowed
                            .iter()
                            .any(|matcher| matcher.matches(&target[row]))
                })
            })
            .collect())
    }
}

/// Conditional membership rules: when a source field (or tuple of fields)
/// takes a configured value, the target field must take one of the allowed
/// values. Rows matching no condition are kept.
#[derive(Debug, Clone)]
pub struct FieldCombinationConstraint {
    rules: Vec<CombinationRule>,
}

impl FieldCombinationConstraint {
    pub const KIND: &'static str = "field_combinations";

    pub fn new(entries: &[FieldCombinationEntry]) -> Result<Self> {
        let rules = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| parse_entry(index, entry))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn from_config(value: &JsonValue) -> Result<Self> {
        let items = value
            .as_array()
            .ok_or_else(|| ConfigError::invalid(Self::KIND, "expected a list of rules"))?;
        let mut entries = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let entry = serde_json::from_value(item.clone()).map_err(|err| {
                ConfigError::invalid(
                    Self::KIND,
                    format!(
                        "entry {index}: expected [{{source: target}}, {{value: allowed}}] \
                         or {{source, target, conditions}}: {err}"
                    ),
                )
            })?;
            entries.push(entry);
        }
        Self::new(&entries)
    }
}

impl Constraint for FieldCombinationConstraint {
    fn kind(&self) -> &str {
        Self::KIND
    }

    fn fields(&self) -> BTreeSet<String> {
        let mut fields = BTreeSet::new();
        for rule in &self.rules {
            fields.extend(rule.source.fields().into_iter().map(str::to_string));
            fields.insert(rule.target.clone());
        }
        fields
    }

    fn apply(&self, table: &Table, _diagnostics: &mut Diagnostics) -> Result<Table> {
        self.validate(table)?;

        let mut current = table.clone();
        for rule in &self.rules {
            let violations = rule.violations(&current)?;
            let keep: Vec<bool> = violations.iter().map(|violated| !violated).collect();
            let before = current.n_rows();
            current = current.filter(&keep);
            debug!(
                source = %rule.source,
                target = %rule.target,
                rows_in = before,
                rows_out = current.n_rows(),
                "field combination applied"
            );
        }
        Ok(current)
    }
}

fn parse_entry(index: usize, entry: &FieldCombinationEntry) -> Result<CombinationRule> {
    let invalid = |message: String| {
        ConfigError::invalid(
            FieldCombinationConstraint::KIND,
            format!("entry {index}: {message}"),
        )
    };

    match entry {
        FieldCombinationEntry::Pair(field_map, conditions) => {
            if field_map.len() != 1 {
                return Err(invalid(format!(
                    "field map must have exactly one entry, found {}",
                    field_map.len()
                )));
            }
            let Some((source_text, target)) = field_map.iter().next() else {
                return Err(invalid("field map is empty".to_string()));
            };
            let source = SourceKey::parse(source_text)
                .ok_or_else(|| invalid(format!("invalid source key '{source_text}'")))?;
            let conditions = pair_conditions(&source, conditions).map_err(invalid)?;
            build_rule(source, target, conditions).map_err(invalid)
        }
        FieldCombinationEntry::Spec(spec) => {
            let (source, conditions) = spec_conditions(spec).map_err(invalid)?;
            build_rule(source, &spec.target, conditions).map_err(invalid)
        }
    }
}

fn build_rule(
    source: SourceKey,
    target: &str,
    conditions: Vec<Condition>,
) -> std::result::Result<CombinationRule, String> {
    if target.trim().is_empty() {
        return Err("target field name is empty".to_string());
    }
    if source.fields().iter().any(|name| name.trim().is_empty()) {
        return Err("source field names must be non-empty".to_string());
    }
    Ok(CombinationRule {
        source,
        target: target.to_string(),
        conditions,
    })
}

fn pair_conditions(
    source: &SourceKey,
    conditions: &BTreeMap<String, ScalarList>,
) -> std::result::Result<Vec<Condition>, String> {
    conditions
        .iter()
        .map(|(key, allowed)| {
            let when = match source {
                SourceKey::Single(_) => vec![Matcher::from_text(key)],
                SourceKey::Composite(_) => {
                    let inner = key
                        .trim()
                        .strip_prefix('(')
                        .and_then(|rest| rest.strip_suffix(')'))
                        .ok_or_else(|| {
                            format!("condition key '{key}' must be a tuple like \"(a, b)\"")
                        })?;
                    inner.split(',').map(Matcher::from_text).collect()
                }
            };
            condition(source, key, when, allowed)
        })
        .collect()
}

fn spec_conditions(
    spec: &FieldCombinationSpec,
) -> std::result::Result<(SourceKey, Vec<Condition>), String> {
    let source = match &spec.source {
        SourceFields::Single(name) => SourceKey::Single(name.clone()),
        SourceFields::Composite(names) if names.is_empty() => {
            return Err("source field list is empty".to_string());
        }
        SourceFields::Composite(names) => SourceKey::Composite(names.clone()),
    };
    let conditions = spec
        .conditions
        .iter()
        .map(|condition_spec| {
            let when = condition_spec
                .when
                .to_vec()
                .into_iter()
                .map(Matcher::from_scalar)
                .collect();
            let key = serde_json::to_string(&condition_spec.when).unwrap_or_default();
            condition(&source, &key, when, &condition_spec.allow)
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((source, conditions))
}

fn condition(
    source: &SourceKey,
    key: &str,
    when: Vec<Matcher>,
    allowed: &ScalarList,
) -> std::result::Result<Condition, String> {
    if when.len() != source.arity() {
        return Err(format!(
            "condition '{key}' has {} value(s) but source {source} has {}",
            when.len(),
            source.arity()
        ));
    }
    Ok(Condition {
        when,
        allowed: allowed
            .to_vec()
            .into_iter()
            .map(Matcher::from_scalar)
            .collect(),
    })
}

fn unquote(text: &str) -> &str {
    let trimmed = text.trim();
    for quote in ['\'', '"'] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    trimmed
}

/// Equality between a configured scalar and a cell, coercing text keys to
/// the cell's kind (`"100"` matches the integer 100).
fn scalar_matches(scalar: &Scalar, value: &Value) -> bool {
    match (scalar, value) {
        (Scalar::Bool(expected), Value::Bool(actual)) => expected == actual,
        (Scalar::Int(expected), Value::Int(actual)) => expected == actual,
        (Scalar::Int(_) | Scalar::Float(_), Value::Int(_) | Value::Float(_)) => {
            scalar_f64(scalar) == value.as_f64()
        }
        (Scalar::Int(_) | Scalar::Float(_), Value::Text(actual)) => {
            actual.trim().parse::<f64>().ok() == scalar_f64(scalar)
        }
        (Scalar::Text(expected), Value::Text(actual)) => expected == actual,
        (Scalar::Text(expected), Value::Int(actual)) => {
            expected.trim().parse::<i64>().ok() == Some(*actual)
                || expected.trim().parse::<f64>().ok() == Some(*actual as f64)
        }
        (Scalar::Text(expected), Value::Float(actual)) => {
            expected.trim().parse::<f64>().ok() == Some(*actual)
        }
        (Scalar::Text(expected), Value::Bool(actual)) => {
            expected.trim().eq_ignore_ascii_case(if *actual { "true" } else { "false" })
        }
        (Scalar::Text(expected), Value::Date(actual)) => {
            NaiveDate::parse_from_str(expected.trim(), "%Y-%m-%d").ok() == Some(*actual)
        }
        (Scalar::Text(expected), Value::DateTime(actual)) => {
            ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"].iter().any(|format| {
                NaiveDateTime::parse_from_str(expected.trim(), format).ok() == Some(*actual)
            })
        }
        _ => false,
    }
}

fn scalar_f64(scalar: &Scalar) -> Option<f64> {
    match scalar {
        Scalar::Int(value) => Some(*value as f64),
        Scalar::Float(value) => Some(*value),
        Scalar::Bool(_) | Scalar::Text(_) => None,
    }
}
