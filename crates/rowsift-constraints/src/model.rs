//! Serializable configuration surface for the built-in constraint kinds.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One field name or a list of field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FieldList {
    One(String),
    Many(Vec<String>),
}

impl FieldList {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            FieldList::One(field) => vec![field.clone()],
            FieldList::Many(fields) => fields.clone(),
        }
    }
}

/// Rule for one main field: the bare string `"delete"`, or a map from action
/// (`delete`, `erase`, `copy`) to related field(s).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum NanRuleConfig {
    Action(String),
    Actions(BTreeMap<String, FieldList>),
}

/// `nan_groups` configuration: main field -> rule.
pub type NanGroupsConfig = BTreeMap<String, NanRuleConfig>;

/// Scalar configuration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// A scalar, `null`, or a list of those.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ScalarList {
    Many(Vec<Option<Scalar>>),
    One(Option<Scalar>),
}

impl ScalarList {
    pub fn to_vec(&self) -> Vec<Option<Scalar>> {
        match self {
            ScalarList::Many(values) => values.clone(),
            ScalarList::One(value) => vec![value.clone()],
        }
    }
}

/// Source side of a combination rule: one field or a tuple of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum SourceFields {
    Single(String),
    Composite(Vec<String>),
}

/// One condition of a combination rule: when the source equals `when`,
/// the target must be one of `allow`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConditionSpec {
    pub when: ScalarList,
    pub allow: ScalarList,
}

/// Explicit form of a combination rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldCombinationSpec {
    pub source: SourceFields,
    pub target: String,
    pub conditions: Vec<ConditionSpec>,
}

/// A `field_combinations` entry.
///
/// The pair form `[{"dept": "bonus"}, {"HR": [100, 200]}]` writes composite
/// source keys as `"(a, b)"` and composite condition keys as `"(x, y)"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FieldCombinationEntry {
    Pair(BTreeMap<String, String>, BTreeMap<String, ScalarList>),
    Spec(FieldCombinationSpec),
}

/// Typed view of the built-in configuration keys, used to document the
/// configuration surface as JSON Schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct BuiltinConstraintConfig {
    /// Null-propagation rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nan_groups: Option<NanGroupsConfig>,
    /// Boolean expressions applied in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_constraints: Option<Vec<String>>,
    /// Conditional value-combination rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_combinations: Option<Vec<FieldCombinationEntry>>,
}
