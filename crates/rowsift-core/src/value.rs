use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Logical dtype of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Bool,
    Int,
    Float,
    Text,
    Date,
    DateTime,
}

impl DataType {
    /// Returns true for `Int` and `Float`.
    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Int | DataType::Float)
    }

    /// Returns true for `Date` and `DateTime`.
    pub fn is_temporal(self) -> bool {
        matches!(self, DataType::Date | DataType::DateTime)
    }

    /// Whether values of `self` can be written into a column of `target`
    /// without losing their meaning.
    pub fn can_cast_to(self, target: DataType) -> bool {
        self == target || (self == DataType::Int && target == DataType::Float)
    }

    /// Whether `value` may be stored in a column of this dtype.
    pub fn accepts(self, value: &Value) -> bool {
        match value.data_type() {
            None => true,
            Some(found) => found == self,
        }
    }

    /// Convert `value` for storage in a column of this dtype.
    pub fn cast(self, value: Value) -> Option<Value> {
        match (self, value) {
            (_, Value::Null) => Some(Value::Null),
            (DataType::Float, Value::Int(v)) => Some(Value::Float(v as f64)),
            (dtype, value) if dtype.accepts(&value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Bool => "bool",
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::Text => "text",
            DataType::Date => "date",
            DataType::DateTime => "datetime",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single cell value.
///
/// `Float(NaN)` is treated as missing everywhere `is_null` is consulted.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(value) => value.is_nan(),
            _ => false,
        }
    }

    /// Dtype of a present value; `None` for nulls.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(DataType::Bool),
            Value::Int(_) => Some(DataType::Int),
            Value::Float(value) if value.is_nan() => None,
            Value::Float(_) => Some(DataType::Float),
            Value::Text(_) => Some(DataType::Text),
            Value::Date(_) => Some(DataType::Date),
            Value::DateTime(_) => Some(DataType::DateTime),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(value) => Some(*value as f64),
            Value::Float(value) if !value.is_nan() => Some(*value),
            Value::Bool(value) => Some(if *value { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            Value::Float(value) if value.fract() == 0.0 && value.is_finite() => {
                Some(*value as i64)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Temporal view of the value; dates are promoted to midnight.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(value) => Some(value.and_time(NaiveTime::MIN)),
            Value::DateTime(value) => Some(*value),
            _ => None,
        }
    }

    /// Non-null and non-zero.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(value) => *value,
            Value::Int(value) => *value != 0,
            Value::Float(value) => !value.is_nan() && *value != 0.0,
            Value::Text(_) | Value::Date(_) | Value::DateTime(_) => true,
        }
    }

    /// Ordering between two present values of comparable kinds.
    ///
    /// Numbers (and booleans) compare numerically, dates and datetimes
    /// compare on the time axis, text compares lexicographically. Any null or
    /// mixed-kind pair yields `None`.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        if self.is_null() || other.is_null() {
            return None;
        }
        match (self, other) {
            (Value::Int(left), Value::Int(right)) => Some(left.cmp(right)),
            (Value::Text(left), Value::Text(right)) => Some(left.cmp(right)),
            (Value::Bool(left), Value::Bool(right)) => Some(left.cmp(right)),
            (left, right) if left.is_temporal() && right.is_temporal() => {
                Some(left.as_datetime()?.cmp(&right.as_datetime()?))
            }
            (left, right) if left.is_numeric_like() && right.is_numeric_like() => {
                left.as_f64()?.partial_cmp(&right.as_f64()?)
            }
            _ => None,
        }
    }

    /// Stable textual key used for row hashing and deduplication.
    pub fn key(&self) -> String {
        if self.is_null() {
            return "n:".to_string();
        }
        match self {
            Value::Null => "n:".to_string(),
            Value::Bool(value) => format!("b:{value}"),
            Value::Int(value) => format!("i:{value}"),
            // -0.0 and 0.0 compare equal, so they share a key.
            Value::Float(value) => format!("f:{:x}", (value + 0.0).to_bits()),
            Value::Text(value) => format!("t:{}:{value}", value.len()),
            Value::Date(value) => format!("d:{}", value.format("%Y-%m-%d")),
            Value::DateTime(value) => format!("dt:{}", value.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }

    fn is_temporal(&self) -> bool {
        matches!(self, Value::Date(_) | Value::DateTime(_))
    }

    fn is_numeric_like(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_) | Value::Bool(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Float(value) if value.is_nan() => Ok(()),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Text(value) => f.write_str(value),
            Value::Date(value) => write!(f, "{}", value.format("%Y-%m-%d")),
            Value::DateTime(value) => write!(f, "{}", value.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::DateTime(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_counts_as_null() {
        assert!(Value::Float(f64::NAN).is_null());
        assert_eq!(Value::Float(f64::NAN).data_type(), None);
        assert!(!Value::Float(0.0).is_null());
    }

    #[test]
    fn compare_mixes_int_and_float() {
        assert_eq!(
            Value::Int(3).compare(&Value::Float(2.5)),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::Int(3).compare(&Value::Null), None);
        assert_eq!(Value::Int(3).compare(&Value::from("3")), None);
    }

    #[test]
    fn compare_promotes_dates_to_datetimes() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let datetime = date.and_hms_opt(12, 0, 0).unwrap();
        assert_eq!(
            Value::Date(date).compare(&Value::DateTime(datetime)),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn truthiness_requires_non_null_non_zero() {
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Float(0.5).is_truthy());
        assert!(Value::from("").is_truthy());
    }

    #[test]
    fn int_casts_into_float_columns_only() {
        assert!(DataType::Int.can_cast_to(DataType::Float));
        assert!(!DataType::Float.can_cast_to(DataType::Int));
        assert_eq!(DataType::Float.cast(Value::Int(2)), Some(Value::Float(2.0)));
        assert_eq!(DataType::Int.cast(Value::from("x")), None);
    }

    #[test]
    fn signed_zeros_share_a_key() {
        assert_eq!(Value::Float(-0.0).key(), Value::Float(0.0).key());
        assert_ne!(Value::Float(0.0).key(), Value::Int(0).key());
    }
}
