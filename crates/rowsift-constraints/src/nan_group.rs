use std::collections::BTreeSet;

use rowsift_core::{Table, Value};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::constraint::Constraint;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::errors::{ConfigError, Result};
use crate::model::{NanGroupsConfig, NanRuleConfig};

const DELETE: &str = "delete";
const ERASE: &str = "erase";
const COPY: &str = "copy";

#[derive(Debug, Clone, PartialEq, Eq)]
struct NanRule {
    main: String,
    delete: bool,
    erase: Vec<String>,
    copy: Vec<String>,
}

/// Null-propagation rules keyed by a main field.
///
/// - `delete`: drop rows where the main field is null.
/// - `erase`: null out related fields wherever the main field is null.
/// - `copy`: fill nulls in related fields from the main field where it is
///   present, if the dtypes are compatible.
///
/// All deletes run before any erase or copy. Rules are applied in main-field
/// name order.
#[derive(Debug, Clone)]
pub struct NanGroupConstraint {
    rules: Vec<NanRule>,
}

impl NanGroupConstraint {
    pub const KIND: &'static str = "nan_groups";

    pub fn new(config: &NanGroupsConfig) -> Result<Self> {
        let mut rules = Vec::with_capacity(config.len());
        for (main, rule) in config {
            if main.trim().is_empty() {
                return Err(ConfigError::invalid(Self::KIND, "main field name is empty"));
            }
            rules.push(parse_rule(main, rule)?);
        }
        Ok(Self { rules })
    }

    pub fn from_config(value: &JsonValue) -> Result<Self> {
        let config: NanGroupsConfig = serde_json::from_value(value.clone()).map_err(|err| {
            ConfigError::invalid(
                Self::KIND,
                format!("expected {{main_field: \"delete\" | {{action: field(s)}}}}: {err}"),
            )
        })?;
        Self::new(&config)
    }

    fn erase(
        &self,
        table: Table,
        main: &str,
        related: &str,
        diagnostics: &mut Diagnostics,
    ) -> Result<Table> {
        if related == main {
            record_self_reference(diagnostics, main, ERASE);
            return Ok(table);
        }
        let main_nulls = table.require_column(main)?.null_mask();
        let values = table
            .require_column(related)?
            .values()
            .iter()
            .zip(&main_nulls)
            .map(|(value, main_null)| if *main_null { Value::Null } else { value.clone() })
            .collect();
        Ok(table.with_column_values(related, values)?)
    }

    fn copy(
        &self,
        table: Table,
        main: &str,
        related: &str,
        diagnostics: &mut Diagnostics,
    ) -> Result<Table> {
        if related == main {
            record_self_reference(diagnostics, main, COPY);
            return Ok(table);
        }
        let source = table.require_column(main)?;
        let target = table.require_column(related)?;
        if !source.dtype().can_cast_to(target.dtype()) {
            diagnostics.record(Diagnostic::new(
                "incompatible_dtype",
                Self::KIND,
                format!("{main}.{COPY}.{related}"),
                format!(
                    "cannot copy {} field '{main}' into {} field '{related}'",
                    source.dtype(),
                    target.dtype()
                ),
            ));
            return Ok(table);
        }
        let dtype = target.dtype();
        let values = source
            .values()
            .iter()
            .zip(target.values())
            .map(|(main_value, related_value)| {
                if related_value.is_null() && !main_value.is_null() {
                    dtype.cast(main_value.clone()).unwrap_or(Value::Null)
                } else {
                    related_value.clone()
                }
            })
            .collect();
        Ok(table.with_column_values(related, values)?)
    }
}

impl Constraint for NanGroupConstraint {
    fn kind(&self) -> &str {
        Self::KIND
    }

    fn fields(&self) -> BTreeSet<String> {
        let mut fields = BTreeSet::new();
        for rule in &self.rules {
            fields.insert(rule.main.clone());
            fields.extend(rule.erase.iter().cloned());
            fields.extend(rule.copy.iter().cloned());
        }
        fields
    }

    fn apply(&self, table: &Table, diagnostics: &mut Diagnostics) -> Result<Table> {
        self.validate(table)?;

        let mut keep = vec![true; table.n_rows()];
        for rule in self.rules.iter().filter(|rule| rule.delete) {
            let nulls = table.require_column(&rule.main)?.null_mask();
            for (slot, null) in keep.iter_mut().zip(nulls) {
                *slot &= !null;
            }
        }
        let mut current = table.filter(&keep);
        debug!(
            rows_in = table.n_rows(),
            rows_out = current.n_rows(),
            "nan group deletes applied"
        );

        for rule in &self.rules {
            for related in &rule.erase {
                current = self.erase(current, &rule.main, related, diagnostics)?;
            }
            for related in &rule.copy {
                current = self.copy(current, &rule.main, related, diagnostics)?;
            }
        }
        Ok(current)
    }
}

fn parse_rule(main: &str, rule: &NanRuleConfig) -> Result<NanRule> {
    let mut parsed = NanRule {
        main: main.to_string(),
        delete: false,
        erase: Vec::new(),
        copy: Vec::new(),
    };
    match rule {
        NanRuleConfig::Action(action) => {
            if action != DELETE {
                return Err(ConfigError::invalid(
                    NanGroupConstraint::KIND,
                    format!(
                        "'{main}': bare action must be \"{DELETE}\", found \"{action}\""
                    ),
                ));
            }
            parsed.delete = true;
        }
        NanRuleConfig::Actions(actions) => {
            if actions.is_empty() {
                return Err(ConfigError::invalid(
                    NanGroupConstraint::KIND,
                    format!("'{main}': no actions configured"),
                ));
            }
            for (action, fields) in actions {
                let fields = fields.to_vec();
                match action.as_str() {
                    DELETE => parsed.delete = true,
                    ERASE | COPY => {
                        if fields.is_empty() || fields.iter().any(|field| field.trim().is_empty())
                        {
                            return Err(ConfigError::invalid(
                                NanGroupConstraint::KIND,
                                format!("'{main}.{action}': related field names must be non-empty"),
                            ));
                        }
                        if action == ERASE {
                            parsed.erase.extend(fields);
                        } else {
                            parsed.copy.extend(fields);
                        }
                    }
                    other => {
                        let expected = format!("{DELETE}, {ERASE} or {COPY}");
                        return Err(ConfigError::invalid(
                            NanGroupConstraint::KIND,
                            format!("'{main}': unknown action \"{other}\" (expected {expected})"),
                        ));
                    }
                }
            }
        }
    }
    if parsed.delete && (!parsed.erase.is_empty() || !parsed.copy.is_empty()) {
        return Err(ConfigError::invalid(
            NanGroupConstraint::KIND,
            format!("'{main}': \"{DELETE}\" cannot be combined with \"{ERASE}\" or \"{COPY}\""),
        ));
    }
    Ok(parsed)
}

fn record_self_reference(diagnostics: &mut Diagnostics, main: &str, action: &str) {
    diagnostics.record(Diagnostic::new(
        "self_reference",
        NanGroupConstraint::KIND,
        format!("{main}.{action}.{main}"),
        format!("'{main}' lists itself as a related field; skipped"),
    ));
}
