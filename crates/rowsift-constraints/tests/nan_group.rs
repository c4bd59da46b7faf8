use std::collections::BTreeMap;

use rowsift_constraints::model::{FieldList, NanRuleConfig};
use rowsift_constraints::{ConfigError, Constraint, Diagnostics, NanGroupConstraint};
use rowsift_core::{Column, DataType, Table, Value};
use serde_json::json;

fn column(name: &str, dtype: DataType, values: Vec<Value>) -> Column {
    Column::new(name, dtype, values).expect("column")
}

fn people() -> Table {
    Table::new(vec![
        column(
            "job",
            DataType::Text,
            vec![Value::Null, "eng".into(), "ops".into(), Value::Null],
        ),
        column(
            "title",
            DataType::Text,
            vec!["lead".into(), Value::Null, "staff".into(), Value::Null],
        ),
        column(
            "salary",
            DataType::Int,
            vec![Value::Int(100), Value::Int(200), Value::Null, Value::Int(400)],
        ),
    ])
    .expect("table")
}

fn apply(config: serde_json::Value, table: &Table) -> (Table, Diagnostics) {
    let constraint = NanGroupConstraint::from_config(&config).expect("constraint");
    let mut diagnostics = Diagnostics::new();
    let result = constraint.apply(table, &mut diagnostics).expect("apply");
    (result, diagnostics)
}

#[test]
fn erase_nulls_related_fields_where_main_is_null() {
    let jobs = Table::new(vec![
        column("job", DataType::Text, vec![Value::Null, "eng".into()]),
        column("salary", DataType::Int, vec![Value::Int(100), Value::Int(200)]),
    ])
    .expect("table");

    let (result, diagnostics) = apply(json!({"job": {"erase": "salary"}}), &jobs);

    assert_eq!(result.n_rows(), 2);
    let salary = result.column("salary").expect("salary");
    assert!(salary.values()[0].is_null());
    assert_eq!(salary.values()[1], Value::Int(200));
    assert_eq!(result.column("job"), jobs.column("job"));
    assert!(diagnostics.is_empty());
}

#[test]
fn delete_drops_rows_with_null_main_field() {
    let (result, _) = apply(json!({"job": "delete"}), &people());

    assert_eq!(result.n_rows(), 2);
    assert_eq!(
        result.column("job").expect("job").values(),
        &[Value::from("eng"), Value::from("ops")][..]
    );
}

#[test]
fn deletes_run_before_copies() {
    // title would copy into job, but rows with a null job are gone first.
    let (result, _) = apply(
        json!({"job": "delete", "title": {"copy": "job"}}),
        &people(),
    );

    assert_eq!(
        result.column("job").expect("job").values(),
        &[Value::from("eng"), Value::from("ops")][..]
    );
    assert_eq!(
        result.column("salary").expect("salary").values(),
        &[Value::Int(200), Value::Null][..]
    );
}

#[test]
fn copy_fills_only_nulls_where_main_is_present() {
    let (result, diagnostics) = apply(json!({"title": {"copy": ["job"]}}), &people());

    assert_eq!(
        result.column("job").expect("job").values(),
        &["lead".into(), "eng".into(), "ops".into(), Value::Null][..]
    );
    assert!(diagnostics.is_empty());
}

#[test]
fn copy_widens_ints_into_float_columns() {
    let table = Table::new(vec![
        column("base", DataType::Int, vec![Value::Int(3), Value::Null]),
        column("score", DataType::Float, vec![Value::Null, Value::Float(1.5)]),
    ])
    .expect("table");

    let (result, _) = apply(json!({"base": {"copy": "score"}}), &table);

    assert_eq!(
        result.column("score").expect("score").values(),
        &[Value::Float(3.0), Value::Float(1.5)][..]
    );
}

#[test]
fn incompatible_copy_is_skipped_with_a_warning() {
    let original = people();
    let (result, diagnostics) = apply(json!({"salary": {"copy": "title"}}), &original);

    assert_eq!(result, original);
    assert_eq!(diagnostics.count("incompatible_dtype"), 1);
    assert_eq!(diagnostics.warnings[0].constraint, NanGroupConstraint::KIND);
}

#[test]
fn self_reference_is_a_no_op_with_a_warning() {
    let original = people();
    let (result, diagnostics) = apply(
        json!({"job": {"erase": "job"}, "title": {"copy": "title"}}),
        &original,
    );

    assert_eq!(result, original);
    assert_eq!(diagnostics.count("self_reference"), 2);
}

#[test]
fn delete_cannot_combine_with_erase_or_copy() {
    let err = NanGroupConstraint::from_config(&json!({"job": {"delete": "job", "erase": "salary"}}))
        .expect_err("delete with erase");
    assert!(matches!(err, ConfigError::Invalid { .. }));

    let err = NanGroupConstraint::from_config(&json!({"job": "erase"})).expect_err("bare erase");
    assert!(err.to_string().contains("delete"));

    let err = NanGroupConstraint::from_config(&json!({"job": {"drop": "salary"}}))
        .expect_err("unknown action");
    assert!(err.to_string().contains("drop"));
}

#[test]
fn typed_config_builds_the_same_rules() {
    let mut actions = BTreeMap::new();
    actions.insert("erase".to_string(), FieldList::Many(vec!["salary".to_string()]));
    let mut config = BTreeMap::new();
    config.insert("job".to_string(), NanRuleConfig::Actions(actions));

    let typed = NanGroupConstraint::new(&config).expect("typed");
    let table = people();
    let mut diagnostics = Diagnostics::new();
    let from_typed = typed.apply(&table, &mut diagnostics).expect("apply typed");
    let (from_json, _) = apply(json!({"job": {"erase": "salary"}}), &table);

    assert_eq!(from_typed, from_json);
}

#[test]
fn missing_related_field_fails_validation() {
    let constraint =
        NanGroupConstraint::from_config(&json!({"job": {"erase": "bonus"}})).expect("constraint");
    let err = constraint
        .apply(&people(), &mut Diagnostics::new())
        .expect_err("bonus missing");
    assert!(err.is_field_not_found());
}
