//! Filter projection over summary tables
//!
//! A projection keeps the rows whose key is in the selected set, in their
//! original order. Nothing is re-aggregated. Unknown keys are ignored and
//! null keys are never selected, so an empty or non-matching selection
//! simply produces an empty summary.

use std::collections::HashSet;

use arrow::array::{Array, BooleanArray, RecordBatch, StringArray};
use arrow_select::filter::filter_record_batch;

use crate::error::{DashboardError, Result};
use crate::summary::{CategoryProfit, CountrySales, SummaryRow};

/// Countries selected when the caller has not chosen any
pub const DEFAULT_COUNTRY_COUNT: usize = 5;

/// Rows of `summary` whose key is in `selected`, original order preserved
pub fn project<T: SummaryRow>(summary: &[T], selected: &HashSet<String>) -> Vec<T> {
    summary
        .iter()
        .filter(|row| row.key().is_some_and(|k| selected.contains(k)))
        .cloned()
        .collect()
}

/// Selection mask over a string key column
pub fn create_key_mask(keys: &StringArray, selected: &HashSet<String>) -> BooleanArray {
    keys.iter()
        .map(|k| Some(k.is_some_and(|k| selected.contains(k))))
        .collect()
}

/// [`project`] over the batch form of a summary
pub fn project_batch(
    batch: &RecordBatch,
    key_column: &str,
    selected: &HashSet<String>,
) -> Result<RecordBatch> {
    let keys = batch
        .column_by_name(key_column)
        .ok_or_else(|| DashboardError::schema(format!("column {} not found", key_column)))?;
    let keys = keys
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| DashboardError::schema(format!("column {} is not Utf8", key_column)))?;

    let mask = create_key_mask(keys, selected);
    Ok(filter_record_batch(batch, &mask)?)
}

/// Distinct non-null keys in summary order
pub fn distinct_keys<T: SummaryRow>(summary: &[T]) -> Vec<String> {
    let mut seen = HashSet::new();
    summary
        .iter()
        .filter_map(|row| row.key())
        .filter(|k| seen.insert(*k))
        .map(str::to_owned)
        .collect()
}

/// First [`DEFAULT_COUNTRY_COUNT`] distinct countries in sales order
pub fn default_countries(summary: &[CountrySales]) -> Vec<String> {
    let mut keys = distinct_keys(summary);
    keys.truncate(DEFAULT_COUNTRY_COUNT);
    keys
}

/// Every distinct category
pub fn default_categories(summary: &[CategoryProfit]) -> Vec<String> {
    distinct_keys(summary)
}
