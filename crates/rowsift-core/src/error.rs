use thiserror::Error;

use crate::value::DataType;

/// Errors raised while building or combining tables.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Columns of a table disagree on their row count.
    #[error("column '{column}' has {actual} rows, expected {expected}")]
    ShapeMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
    /// Two columns share the same name.
    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),
    /// A value does not fit the declared dtype of its column.
    #[error("column '{column}' is {dtype} but row {row} holds {found}")]
    TypeMismatch {
        column: String,
        dtype: DataType,
        row: usize,
        found: String,
    },
    /// Two tables cannot be combined because their columns differ.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
    /// A named column is absent.
    #[error("column not found: {0}")]
    ColumnNotFound(String),
}

/// Convenience alias for results returned by rowsift-core.
pub type Result<T> = std::result::Result<T, CoreError>;
