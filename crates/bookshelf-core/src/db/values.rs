//! Conversions between model fields and libSQL values

use libsql::{Row, Value};

use crate::error::{Error, Result};

pub fn text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |value| Value::Text(value.to_string()))
}

pub fn integer(value: Option<i64>) -> Value {
    value.map_or(Value::Null, Value::Integer)
}

pub fn real(value: Option<f64>) -> Value {
    value.map_or(Value::Null, Value::Real)
}

pub fn flag(value: bool) -> Value {
    Value::Integer(i64::from(value))
}

pub fn read_text(row: &Row, idx: i32) -> Result<Option<String>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Text(value) => Ok(Some(value)),
        Value::Integer(value) => Ok(Some(value.to_string())),
        Value::Real(value) => Ok(Some(value.to_string())),
        Value::Blob(_) => Err(Error::Database(format!(
            "column {idx} holds a blob, expected text"
        ))),
    }
}

pub fn read_i64(row: &Row, idx: i32) -> Result<Option<i64>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Integer(value) => Ok(Some(value)),
        other => Err(Error::Database(format!(
            "column {idx} holds {other:?}, expected integer"
        ))),
    }
}

pub fn read_i32(row: &Row, idx: i32) -> Result<Option<i32>> {
    read_i64(row, idx)?
        .map(|value| {
            i32::try_from(value)
                .map_err(|_| Error::Database(format!("column {idx} out of range: {value}")))
        })
        .transpose()
}

#[allow(clippy::cast_precision_loss)]
pub fn read_f64(row: &Row, idx: i32) -> Result<Option<f64>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Real(value) => Ok(Some(value)),
        Value::Integer(value) => Ok(Some(value as f64)),
        other => Err(Error::Database(format!(
            "column {idx} holds {other:?}, expected real"
        ))),
    }
}

pub fn read_flag(row: &Row, idx: i32) -> Result<bool> {
    Ok(read_i64(row, idx)?.unwrap_or(0) != 0)
}

pub fn read_required_i64(row: &Row, idx: i32) -> Result<i64> {
    read_i64(row, idx)?.ok_or_else(|| Error::Database(format!("column {idx} is NULL")))
}
