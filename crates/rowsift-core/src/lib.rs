//! Core table contracts for rowsift.
//!
//! Defines the in-memory columnar `Table` that every constraint filters, plus
//! the scalar `Value` model shared by the expression engine and the resample
//! loop. Rows are addressed by position only, so every table returned from a
//! filtering step carries a dense zero-based index.

pub mod error;
pub mod table;
pub mod value;

pub use error::{CoreError, Result};
pub use table::{Column, Table};
pub use value::{DataType, Value};
