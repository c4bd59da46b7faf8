use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Structured non-fatal issue raised while building or applying constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    /// Constraint kind that raised the issue (`field_constraints`, ...).
    pub constraint: String,
    /// The rule or expression the issue is about.
    pub rule: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        code: impl Into<String>,
        constraint: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            constraint: constraint.into(),
            rule: rule.into(),
            message: message.into(),
        }
    }
}

/// Accumulates diagnostics so callers can inspect skipped rules without
/// parsing log output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub warnings: Vec<Diagnostic>,
    pub warnings_by_code: BTreeMap<String, u64>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and emit it as a `tracing` event.
    pub fn record(&mut self, issue: Diagnostic) {
        log_issue(&issue);
        *self.warnings_by_code.entry(issue.code.clone()).or_insert(0) += 1;
        self.warnings.push(issue);
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.warnings.iter()
    }

    /// Number of warnings recorded with `code`.
    pub fn count(&self, code: &str) -> u64 {
        self.warnings_by_code.get(code).copied().unwrap_or(0)
    }

    /// Merge another accumulator into this one without logging again.
    pub fn merge(&mut self, other: Diagnostics) {
        for (code, count) in other.warnings_by_code {
            *self.warnings_by_code.entry(code).or_insert(0) += count;
        }
        self.warnings.extend(other.warnings);
    }
}

fn log_issue(issue: &Diagnostic) {
    warn!(
        code = %issue.code,
        constraint = %issue.constraint,
        rule = %issue.rule,
        message = %issue.message
    );
}
