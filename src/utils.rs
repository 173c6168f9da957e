//! Utility functions for data processing

use arrow::array::{Array, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow_schema::DataType;

use crate::error::{DashboardError, Result};

fn column_index(batch: &RecordBatch, name: &str) -> Result<usize> {
    batch
        .schema()
        .fields()
        .iter()
        .position(|f| f.name() == name)
        .ok_or_else(|| DashboardError::schema(format!("column {} not found", name)))
}

fn wrong_type(name: &str, found: &DataType, expected: &str) -> DashboardError {
    DashboardError::schema(format!("column {} is {}, expected {}", name, found, expected))
}

/// Get a Float64 column by name
pub fn get_f64_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array> {
    let col = batch.column(column_index(batch, name)?);
    col.as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| wrong_type(name, col.data_type(), "Float64"))
}

/// Get an Int64 column by name
pub fn get_i64_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int64Array> {
    let col = batch.column(column_index(batch, name)?);
    col.as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| wrong_type(name, col.data_type(), "Int64"))
}

/// Get a Utf8 column by name
pub fn get_str_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    let col = batch.column(column_index(batch, name)?);
    col.as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| wrong_type(name, col.data_type(), "Utf8"))
}

/// Optional value at `i`, `None` when the slot is null
#[inline]
pub fn opt_i64(array: &Int64Array, i: usize) -> Option<i64> {
    array.is_valid(i).then(|| array.value(i))
}

#[inline]
pub fn opt_f64(array: &Float64Array, i: usize) -> Option<f64> {
    array.is_valid(i).then(|| array.value(i))
}

#[inline]
pub fn opt_str(array: &StringArray, i: usize) -> Option<&str> {
    array.is_valid(i).then(|| array.value(i))
}

/// Round to 2 decimal places, half away from zero
///
/// Matches SQLite `ROUND(x, 2)` for the magnitudes that occur in sales data.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
