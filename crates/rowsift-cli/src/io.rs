use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use rowsift_core::{Column, DataType, Table, Value};

use crate::errors::CliError;

/// Cells read as missing regardless of the column type.
const NULL_MARKERS: [&str; 6] = ["", "NA", "NaN", "nan", "null", "pd.NA"];

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Candidate dtypes, narrowest first. Text accepts everything.
const INFERENCE_ORDER: [DataType; 6] = [
    DataType::Int,
    DataType::Float,
    DataType::Bool,
    DataType::Date,
    DataType::DateTime,
    DataType::Text,
];

/// Read a headed CSV file, inferring one dtype per column.
pub fn read_table_csv(path: &Path) -> Result<Table, CliError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record?;
        for (index, column) in cells.iter_mut().enumerate() {
            column.push(record.get(index).unwrap_or_default().to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, cells)| infer_column(name, &cells))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Table::new(columns)?)
}

/// Write `table` as CSV with a header row. Nulls are written as empty
/// cells and floats keep a decimal point so they read back as floats.
pub fn write_table_csv(path: &Path, table: &Table) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(table.column_names())?;
    for row in 0..table.n_rows() {
        let record: Vec<String> = table.row(row).into_iter().map(format_cell).collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn format_cell(value: &Value) -> String {
    match value {
        value if value.is_null() => String::new(),
        Value::Float(number) => format!("{number:?}"),
        other => other.to_string(),
    }
}

fn infer_column(name: String, cells: &[String]) -> Result<Column, CliError> {
    let dtype = INFERENCE_ORDER
        .into_iter()
        .find(|dtype| {
            cells
                .iter()
                .filter(|cell| !is_null_marker(cell))
                .all(|cell| parse_cell(*dtype, cell).is_some())
        })
        .unwrap_or(DataType::Text);
    let values = cells
        .iter()
        .map(|cell| parse_cell(dtype, cell).unwrap_or(Value::Null))
        .collect();
    Ok(Column::new(name, dtype, values)?)
}

fn is_null_marker(cell: &str) -> bool {
    NULL_MARKERS.contains(&cell)
}

fn parse_cell(dtype: DataType, cell: &str) -> Option<Value> {
    if is_null_marker(cell) {
        return Some(Value::Null);
    }
    match dtype {
        DataType::Int => cell.parse::<i64>().ok().map(Value::Int),
        DataType::Float => cell.parse::<f64>().ok().map(Value::Float),
        DataType::Bool => match cell.to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        DataType::Date => NaiveDate::parse_from_str(cell, "%Y-%m-%d")
            .ok()
            .map(Value::Date),
        DataType::DateTime => DATETIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(cell, format).ok())
            .map(Value::DateTime),
        DataType::Text => Some(Value::Text(cell.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("rowsift_cli_{label}_{}.csv", uuid::Uuid::new_v4()))
    }

    #[test]
    fn infers_column_types_and_nulls() {
        let path = temp_path("infer");
        fs::write(
            &path,
            "age,income,name,joined,active\n\
             34,5.5,ana,2024-01-02,true\n\
             ,NA,bo,,false\n\
             51,7,cy,2023-12-31,\n",
        )
        .expect("write csv");

        let table = read_table_csv(&path).expect("read csv");
        let _ = fs::remove_file(&path);

        let schema: Vec<DataType> = table.schema().into_iter().map(|(_, dtype)| dtype).collect();
        assert_eq!(
            schema,
            vec![
                DataType::Int,
                DataType::Float,
                DataType::Text,
                DataType::Date,
                DataType::Bool
            ]
        );
        let age = table.column("age").expect("age");
        assert!(age.values()[1].is_null());
        assert_eq!(
            table.column("income").expect("income").values()[2],
            Value::Float(7.0)
        );
    }

    #[test]
    fn written_tables_read_back() {
        let path = temp_path("roundtrip");
        fs::write(
            &path,
            "id,score,when\n1,0.5,2024-03-01\n2,,2024-03-02\n3,4,\n",
        )
        .expect("write csv");
        let table = read_table_csv(&path).expect("read csv");

        let out = temp_path("roundtrip_out");
        write_table_csv(&out, &table).expect("write table");
        let again = read_table_csv(&out).expect("read written csv");
        let _ = fs::remove_file(&path);
        let _ = fs::remove_file(&out);

        assert_eq!(table, again);
    }
}
