//! Declarative row constraints and the pipeline that applies them.
//!
//! Three built-in kinds are provided:
//! - `nan_groups` ([`NanGroupConstraint`]): null-propagation rules,
//! - `field_constraints` ([`FieldExprConstraint`]): boolean expressions,
//! - `field_combinations` ([`FieldCombinationConstraint`]): conditional
//!   membership rules between a source and a target field.
//!
//! [`ConstraintPipeline`] applies the active kinds in a fixed canonical order.
//! Further kinds can be added through [`ConstraintRegistry::register`].

pub mod config;
pub mod constraint;
pub mod diagnostics;
pub mod errors;
pub mod field_combination;
pub mod field_expr;
pub mod model;
pub mod nan_group;
pub mod pipeline;
pub mod registry;

pub use config::{ConstraintConfig, config_json_schema, load_config, validate_config_json};
pub use constraint::Constraint;
pub use diagnostics::{Diagnostic, Diagnostics};
pub use errors::{ConfigError, Result};
pub use field_combination::{FieldCombinationConstraint, SourceKey};
pub use field_expr::FieldExprConstraint;
pub use nan_group::NanGroupConstraint;
pub use pipeline::ConstraintPipeline;
pub use registry::{ConstraintFactory, ConstraintRegistry};

/// String that stands for "the value is missing" in combination conditions.
pub const NULL_SENTINEL: &str = "pd.NA";
