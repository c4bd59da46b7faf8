use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rowsift_constraints::{
    ConfigError, Constraint, ConstraintConfig, ConstraintPipeline, ConstraintRegistry,
    Diagnostics, load_config, validate_config_json,
};
use rowsift_core::{Column, Table, Value};
use serde_json::json;

fn table(columns: Vec<(&str, Vec<Value>)>) -> Table {
    Table::new(
        columns
            .into_iter()
            .map(|(name, values)| Column::infer(name, values).expect("column"))
            .collect(),
    )
    .expect("table")
}

fn temp_path(label: &str, extension: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "rowsift_{label}_{}.{extension}",
        uuid::Uuid::new_v4()
    ))
}

/// Keeps rows where `field` is strictly positive.
#[derive(Debug)]
struct Positive {
    field: String,
}

impl Constraint for Positive {
    fn kind(&self) -> &str {
        "positive"
    }

    fn fields(&self) -> BTreeSet<String> {
        BTreeSet::from([self.field.clone()])
    }

    fn apply(
        &self,
        table: &Table,
        _diagnostics: &mut Diagnostics,
    ) -> rowsift_constraints::Result<Table> {
        self.validate(table)?;
        let mask: Vec<bool> = table
            .require_column(&self.field)?
            .values()
            .iter()
            .map(|value| value.as_f64().is_some_and(|number| number > 0.0))
            .collect();
        Ok(table.filter(&mask))
    }
}

fn positive_factory(
    value: &serde_json::Value,
) -> rowsift_constraints::Result<Box<dyn Constraint>> {
    let field = value
        .as_str()
        .ok_or_else(|| ConfigError::invalid("positive", "expected a field name"))?;
    Ok(Box::new(Positive {
        field: field.to_string(),
    }))
}

#[test]
fn kinds_apply_in_canonical_order() {
    let config = ConstraintConfig::from_json_str(
        r#"{
            "field_combinations": [[{"a": "b"}, {"5": [7]}]],
            "field_constraints": ["a > 3"],
            "nan_groups": {"b": {"copy": "a"}}
        }"#,
    )
    .expect("config");
    let pipeline = ConstraintPipeline::from_config(&config).expect("pipeline");

    assert_eq!(
        pipeline.kinds().collect::<Vec<_>>(),
        vec!["nan_groups", "field_constraints", "field_combinations"]
    );

    // The copy fills `a` before `a > 3` runs; the combination rule then
    // requires b == 7 whenever a == 5.
    let values = table(vec![
        ("a", vec![Value::Null, Value::Null, Value::Int(4), Value::Int(1)]),
        ("b", vec![Value::Int(5), Value::Int(9), Value::Int(4), Value::Int(8)]),
    ]);
    let mut diagnostics = Diagnostics::new();
    let result = pipeline.apply(&values, &mut diagnostics).expect("apply");

    assert_eq!(
        result.column("a").expect("a").values(),
        &[Value::Int(9), Value::Int(4)][..]
    );
    assert!(diagnostics.is_empty());
}

#[test]
fn unknown_kinds_are_skipped_with_a_warning() {
    let config = ConstraintConfig::new()
        .with("field_constraints", json!(["x > 0"]))
        .with("missing_groups", json!({"x": "delete"}));
    let pipeline = ConstraintPipeline::from_config(&config).expect("pipeline");

    assert_eq!(pipeline.len(), 1);
    assert_eq!(pipeline.build_diagnostics().count("unknown_constraint_kind"), 1);
    assert_eq!(pipeline.build_diagnostics().warnings[0].rule, "missing_groups");
}

/// In-memory log sink for the fmt subscriber.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self.0.lock().map_err(|_| io::Error::other("poisoned"))?;
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn unknown_kind_is_logged_once() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let config = ConstraintConfig::new().with("missing_groups", json!({"x": "delete"}));
    tracing::subscriber::with_default(subscriber, || {
        ConstraintPipeline::from_config(&config).expect("pipeline");
    });

    let bytes = logs.0.lock().expect("log buffer").clone();
    let output = String::from_utf8(bytes).expect("utf8 logs");
    let warnings = output
        .lines()
        .filter(|line| line.contains("WARN") && line.contains("missing_groups"))
        .count();
    assert_eq!(warnings, 1, "{output}");
}

#[test]
fn empty_config_passes_rows_through() {
    let pipeline = ConstraintPipeline::from_config(&ConstraintConfig::new()).expect("pipeline");
    let values = table(vec![("x", vec![Value::Int(1), Value::Null])]);

    assert!(pipeline.is_empty());
    assert_eq!(
        pipeline.apply(&values, &mut Diagnostics::new()).expect("apply"),
        values
    );
}

#[test]
fn registered_kinds_follow_the_builtins() {
    let mut registry = ConstraintRegistry::with_defaults();
    registry.register("positive", positive_factory);

    let config = ConstraintConfig::new()
        .with("positive", json!("y"))
        .with("field_constraints", json!(["x < 10"]));
    let pipeline = registry.build(&config).expect("pipeline");

    assert_eq!(
        pipeline.kinds().collect::<Vec<_>>(),
        vec!["field_constraints", "positive"]
    );
    assert_eq!(
        pipeline.fields(),
        BTreeSet::from(["x".to_string(), "y".to_string()])
    );

    let values = table(vec![
        ("x", vec![Value::Int(1), Value::Int(2), Value::Int(30)]),
        ("y", vec![Value::Int(-1), Value::Int(2), Value::Int(3)]),
    ]);
    let result = pipeline
        .apply(&values, &mut Diagnostics::new())
        .expect("apply");
    assert_eq!(result.column("x").expect("x").values(), &[Value::Int(2)][..]);
}

#[test]
fn re_registering_keeps_the_canonical_slot() {
    let mut registry = ConstraintRegistry::with_defaults();
    registry.register("nan_groups", positive_factory);

    assert_eq!(
        registry.kinds().collect::<Vec<_>>(),
        vec!["nan_groups", "field_constraints", "field_combinations"]
    );
    let pipeline = registry
        .build(&ConstraintConfig::new().with("nan_groups", json!("x")))
        .expect("pipeline");
    assert_eq!(pipeline.kinds().collect::<Vec<_>>(), vec!["positive"]);
}

#[test]
fn construction_errors_surface_from_build() {
    let config = ConstraintConfig::new().with("field_constraints", json!(["a >"]));
    let err = ConstraintPipeline::from_config(&config).expect_err("bad expression");
    assert!(matches!(err, ConfigError::InvalidExpression { .. }));
}

#[test]
fn pipeline_validate_reports_missing_fields() {
    let config = ConstraintConfig::new().with("nan_groups", json!({"job": "delete"}));
    let pipeline = ConstraintPipeline::from_config(&config).expect("pipeline");
    let values = table(vec![("x", vec![Value::Int(1)])]);

    let err = pipeline.validate(&values).expect_err("job missing");
    assert!(err.is_field_not_found());
}

#[test]
fn load_config_reads_json_and_toml() {
    let json_path = temp_path("config", "json");
    fs::write(
        &json_path,
        r#"{"field_constraints": ["age > 18"], "nan_groups": {"job": "delete"}}"#,
    )
    .expect("write json");
    let toml_path = temp_path("config", "toml");
    fs::write(
        &toml_path,
        "field_constraints = [\"age > 18\"]\n\n[nan_groups]\njob = \"delete\"\n",
    )
    .expect("write toml");

    let from_json = load_config(&json_path).expect("load json");
    let from_toml = load_config(&toml_path).expect("load toml");
    assert_eq!(from_json, from_toml);

    let yaml_path = temp_path("config", "yaml");
    fs::write(&yaml_path, "field_constraints: []").expect("write yaml");
    let err = load_config(&yaml_path).expect_err("unsupported extension");
    assert!(matches!(err, ConfigError::Invalid { .. }));

    for path in [json_path, toml_path, yaml_path] {
        let _ = fs::remove_file(path);
    }
}

#[test]
fn config_documents_are_checked_against_the_schema() {
    let valid = json!({
        "nan_groups": {"job": "delete", "title": {"copy": ["job"]}},
        "field_constraints": ["age > 18"],
        "field_combinations": [[{"dept": "bonus"}, {"HR": [100, null]}]],
        "custom_kind": {"anything": true}
    });
    assert!(validate_config_json(&valid).expect("validate").is_empty());

    let invalid = json!({"field_constraints": "age > 18"});
    let diagnostics = validate_config_json(&invalid).expect("validate");
    assert!(diagnostics.count("schema_violation") >= 1);
}
