use rowsift_core::{Column, CoreError, DataType, Table, Value};

fn people() -> Table {
    Table::new(vec![
        Column::infer(
            "name",
            vec!["ana".into(), "bruno".into(), "ana".into(), "caio".into()],
        )
        .expect("name column"),
        Column::infer(
            "age",
            vec![Value::Int(30), Value::Null, Value::Int(30), Value::Int(41)],
        )
        .expect("age column"),
    ])
    .expect("table")
}

#[test]
fn filter_returns_dense_rows_without_touching_input() {
    let table = people();
    let filtered = table.filter(&[false, true, false, true]);

    assert_eq!(filtered.n_rows(), 2);
    assert_eq!(
        filtered.row(0),
        vec![&Value::from("bruno"), &Value::Null]
    );
    assert_eq!(filtered.row(1), vec![&Value::from("caio"), &Value::Int(41)]);
    assert_eq!(table.n_rows(), 4);
}

#[test]
fn drop_duplicates_keeps_first_occurrence() {
    let deduped = people().drop_duplicates();
    assert_eq!(deduped.n_rows(), 3);
    assert_eq!(deduped.row(2), vec![&Value::from("caio"), &Value::Int(41)]);
}

#[test]
fn drop_duplicates_treats_signed_zeros_as_equal() {
    let table = Table::new(vec![
        Column::infer("x", vec![Value::Float(-0.0), Value::Float(0.0), Value::Float(1.0)])
            .expect("x"),
    ])
    .expect("table");
    let deduped = table.drop_duplicates();
    assert_eq!(deduped.n_rows(), 2);
    assert_eq!(deduped.row(1), vec![&Value::Float(1.0)]);
}

#[test]
fn concat_matches_columns_by_name() {
    let table = people();
    let other = Table::new(vec![
        Column::infer("age", vec![Value::Int(7)]).expect("age"),
        Column::infer("name", vec!["dora".into()]).expect("name"),
    ])
    .expect("other");

    let combined = table.concat(&other).expect("concat");
    assert_eq!(combined.n_rows(), 5);
    assert_eq!(combined.row(4), vec![&Value::from("dora"), &Value::Int(7)]);
}

#[test]
fn concat_rejects_incompatible_dtypes() {
    let table = people();
    let other = Table::new(vec![
        Column::infer("name", vec!["dora".into()]).expect("name"),
        Column::infer("age", vec!["seven".into()]).expect("age"),
    ])
    .expect("other");

    assert!(matches!(
        table.concat(&other),
        Err(CoreError::TypeMismatch { ref column, .. }) if column == "age"
    ));
}

#[test]
fn concat_accepts_all_null_columns_of_another_dtype() {
    let table = people();
    let nulls = Table::new(vec![
        Column::infer("name", vec!["dora".into()]).expect("name"),
        Column::infer("age", vec![Value::Null]).expect("age"),
    ])
    .expect("other");
    assert_eq!(nulls.column("age").expect("age").dtype(), DataType::Float);

    let combined = table.concat(&nulls).expect("concat");
    let age = combined.column("age").expect("age");
    assert_eq!(age.dtype(), DataType::Int);
    assert_eq!(combined.n_rows(), 5);
    assert!(age.values()[4].is_null());

    let widened = nulls.concat(&table).expect("concat onto nulls");
    assert_eq!(widened.column("age").expect("age").dtype(), DataType::Int);
    assert_eq!(widened.row(1), vec![&Value::from("ana"), &Value::Int(30)]);
}

#[test]
fn new_rejects_ragged_and_duplicate_columns() {
    let ragged = Table::new(vec![
        Column::infer("a", vec![Value::Int(1), Value::Int(2)]).expect("a"),
        Column::infer("b", vec![Value::Int(1)]).expect("b"),
    ]);
    assert!(matches!(ragged, Err(CoreError::ShapeMismatch { .. })));

    let duplicate = Table::new(vec![
        Column::infer("a", vec![Value::Int(1)]).expect("a"),
        Column::infer("a", vec![Value::Int(2)]).expect("a again"),
    ]);
    assert!(matches!(duplicate, Err(CoreError::DuplicateColumn(_))));
}

#[test]
fn column_rejects_values_outside_its_dtype() {
    let result = Column::new("age", DataType::Int, vec![Value::Int(1), "x".into()]);
    assert!(matches!(
        result,
        Err(CoreError::TypeMismatch { row: 1, .. })
    ));
}

#[test]
fn sample_rows_is_deterministic_for_a_seed() {
    let values: Vec<Value> = (0..100).map(Value::Int).collect();
    let table = Table::new(vec![Column::infer("id", values).expect("id")]).expect("table");

    let first = table.sample_rows(10, 42);
    let second = table.sample_rows(10, 42);

    assert_eq!(first.n_rows(), 10);
    assert_eq!(first, second);
    assert_eq!(table.sample_rows(500, 42).n_rows(), 100);
}

#[test]
fn with_column_values_keeps_dtype() {
    let table = people();
    let updated = table
        .with_column_values(
            "age",
            vec![Value::Null, Value::Int(1), Value::Int(2), Value::Int(3)],
        )
        .expect("replace");
    assert_eq!(updated.column("age").map(Column::dtype), Some(DataType::Int));
    assert!(updated.column("age").expect("age").null_mask()[0]);
}
