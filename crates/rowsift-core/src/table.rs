use std::collections::HashSet;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{CoreError, Result};
use crate::value::{DataType, Value};

/// A named, typed column. Every value is either null or of `dtype`.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    dtype: DataType,
    values: Vec<Value>,
}

impl Column {
    /// Build a column with an explicit dtype. Integers are widened into
    /// float columns; any other mismatch is rejected.
    pub fn new(name: impl Into<String>, dtype: DataType, values: Vec<Value>) -> Result<Self> {
        let name = name.into();
        let mut checked = Vec::with_capacity(values.len());
        for (row, value) in values.into_iter().enumerate() {
            let found = describe(&value);
            match dtype.cast(value) {
                Some(value) => checked.push(value),
                None => {
                    return Err(CoreError::TypeMismatch {
                        column: name,
                        dtype,
                        row,
                        found,
                    });
                }
            }
        }
        Ok(Self {
            name,
            dtype,
            values: checked,
        })
    }

    /// Build a column and infer its dtype from the present values.
    ///
    /// Mixed ints and floats become a float column; an all-null column is
    /// typed as float.
    pub fn infer(name: impl Into<String>, values: Vec<Value>) -> Result<Self> {
        let mut dtype = None;
        for value in &values {
            let Some(found) = value.data_type() else {
                continue;
            };
            dtype = match (dtype, found) {
                (None, found) => Some(found),
                (Some(DataType::Int), DataType::Float) => Some(DataType::Float),
                (Some(current), _) => Some(current),
            };
        }
        Self::new(name, dtype.unwrap_or(DataType::Float), values)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&Value> {
        self.values.get(row)
    }

    /// Null mask aligned to the column's rows.
    pub fn null_mask(&self) -> Vec<bool> {
        self.values.iter().map(Value::is_null).collect()
    }

    fn take(&self, indices: &[usize]) -> Self {
        Self {
            name: self.name.clone(),
            dtype: self.dtype,
            values: indices
                .iter()
                .map(|idx| self.values[*idx].clone())
                .collect(),
        }
    }
}

/// In-memory columnar table.
///
/// Rows are addressed by position, so the index is always dense and
/// zero-based. Every operation returns a new table; inputs are never
/// mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let rows = columns.first().map(Column::len).unwrap_or(0);
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(CoreError::DuplicateColumn(column.name.clone()));
            }
            if column.len() != rows {
                return Err(CoreError::ShapeMismatch {
                    column: column.name.clone(),
                    expected: rows,
                    actual: column.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// A zero-row table with the same columns as `self`.
    pub fn empty_like(&self) -> Self {
        self.take(&[])
    }

    pub fn n_rows(&self) -> usize {
        self.rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(Column::name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| CoreError::ColumnNotFound(name.to_string()))
    }

    /// Column names and dtypes in table order.
    pub fn schema(&self) -> Vec<(String, DataType)> {
        self.columns
            .iter()
            .map(|column| (column.name.clone(), column.dtype))
            .collect()
    }

    pub fn row(&self, row: usize) -> Vec<&Value> {
        self.columns
            .iter()
            .map(|column| &column.values[row])
            .collect()
    }

    /// Keep rows whose mask entry is true. Missing mask entries count as false.
    pub fn filter(&self, mask: &[bool]) -> Self {
        let indices: Vec<usize> = mask
            .iter()
            .take(self.rows)
            .enumerate()
            .filter_map(|(idx, keep)| keep.then_some(idx))
            .collect();
        self.take(&indices)
    }

    /// Gather rows by position, in the given order.
    pub fn take(&self, indices: &[usize]) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .map(|column| column.take(indices))
                .collect(),
            rows: indices.len(),
        }
    }

    /// Replace the values of one column, keeping its dtype.
    pub fn with_column_values(&self, name: &str, values: Vec<Value>) -> Result<Self> {
        let position = self
            .columns
            .iter()
            .position(|column| column.name == name)
            .ok_or_else(|| CoreError::ColumnNotFound(name.to_string()))?;
        if values.len() != self.rows {
            return Err(CoreError::ShapeMismatch {
                column: name.to_string(),
                expected: self.rows,
                actual: values.len(),
            });
        }
        let column = Column::new(name, self.columns[position].dtype, values)?;
        let mut columns = self.columns.clone();
        columns[position] = column;
        Ok(Self {
            columns,
            rows: self.rows,
        })
    }

    /// Append the rows of `other`. Columns are matched by name; `other` may
    /// list them in a different order. Incoming values are cast into the
    /// existing dtype one by one, so an all-null column joins any dtype. A
    /// column holding only nulls so far takes the incoming dtype instead.
    pub fn concat(&self, other: &Table) -> Result<Self> {
        if self.n_cols() != other.n_cols() {
            return Err(CoreError::SchemaMismatch(format!(
                "expected {} columns, found {}",
                self.n_cols(),
                other.n_cols()
            )));
        }
        let mut columns = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let incoming = other.column(&column.name).ok_or_else(|| {
                CoreError::SchemaMismatch(format!("column '{}' missing", column.name))
            })?;
            let dtype = if column.values.iter().all(Value::is_null) {
                incoming.dtype
            } else {
                column.dtype
            };
            let mut values = column.values.clone();
            values.extend(incoming.values.iter().cloned());
            columns.push(Column::new(column.name.clone(), dtype, values)?);
        }
        Ok(Self {
            columns,
            rows: self.rows + other.rows,
        })
    }

    /// Drop exact-duplicate rows, keeping the first occurrence.
    pub fn drop_duplicates(&self) -> Self {
        let mut seen = HashSet::with_capacity(self.rows);
        let indices: Vec<usize> = (0..self.rows)
            .filter(|row| seen.insert(self.row_key(*row)))
            .collect();
        if indices.len() == self.rows {
            return self.clone();
        }
        self.take(&indices)
    }

    /// Uniformly sample `n` distinct rows with a fixed seed. Sampled rows keep
    /// their relative order. Returns a copy when `n >= n_rows()`.
    pub fn sample_rows(&self, n: usize, seed: u64) -> Self {
        if n >= self.rows {
            return self.clone();
        }
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut indices = rand::seq::index::sample(&mut rng, self.rows, n).into_vec();
        indices.sort_unstable();
        self.take(&indices)
    }

    fn row_key(&self, row: usize) -> String {
        self.columns
            .iter()
            .map(|column| column.values[row].key())
            .collect::<Vec<_>>()
            .join("\u{1f}")
    }
}

fn describe(value: &Value) -> String {
    value
        .data_type()
        .map(|dtype| format!("a {dtype} value"))
        .unwrap_or_else(|| "null".to_string())
}
