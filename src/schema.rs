//! Source table definitions for the Northwind store
//!
//! Each table lists only the columns the queries read. Loaders project
//! exactly these columns and [`conform`] casts them to their canonical
//! Arrow type, so the query layer can downcast without further checks.

use std::sync::Arc;

use arrow::array::{ArrayRef, RecordBatch};
use arrow::compute::{can_cast_types, cast};
use arrow_schema::{DataType, Field, Schema, SchemaRef};

use crate::error::{DashboardError, Result};

/// Canonical column types used by the query layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int64,
    Float64,
    Utf8,
}

impl ColumnType {
    pub fn data_type(self) -> DataType {
        match self {
            ColumnType::Int64 => DataType::Int64,
            ColumnType::Float64 => DataType::Float64,
            ColumnType::Utf8 => DataType::Utf8,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub column_type: ColumnType,
}

const fn col(name: &'static str, column_type: ColumnType) -> ColumnSpec {
    ColumnSpec { name, column_type }
}

/// A source table and the columns required from it
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [ColumnSpec],
}

pub const ORDER: TableSpec = TableSpec {
    name: "Order",
    columns: &[col("Id", ColumnType::Int64), col("CustomerId", ColumnType::Utf8)],
};

pub const ORDER_DETAIL: TableSpec = TableSpec {
    name: "OrderDetail",
    columns: &[
        col("OrderId", ColumnType::Int64),
        col("ProductId", ColumnType::Int64),
        col("UnitPrice", ColumnType::Float64),
        col("Quantity", ColumnType::Int64),
        col("Discount", ColumnType::Float64),
    ],
};

pub const PRODUCT: TableSpec = TableSpec {
    name: "Product",
    columns: &[
        col("Id", ColumnType::Int64),
        col("ProductName", ColumnType::Utf8),
        col("CategoryId", ColumnType::Int64),
    ],
};

pub const CATEGORY: TableSpec = TableSpec {
    name: "Category",
    columns: &[col("Id", ColumnType::Int64), col("CategoryName", ColumnType::Utf8)],
};

pub const CUSTOMER: TableSpec = TableSpec {
    name: "Customer",
    columns: &[col("Id", ColumnType::Utf8), col("Country", ColumnType::Utf8)],
};

impl TableSpec {
    /// Canonical Arrow schema; every column is nullable
    pub fn schema(&self) -> SchemaRef {
        let fields: Vec<Field> = self
            .columns
            .iter()
            .map(|c| Field::new(c.name, c.column_type.data_type(), true))
            .collect();
        Arc::new(Schema::new(fields))
    }

    pub(crate) fn missing_table(&self) -> DashboardError {
        DashboardError::schema(format!("table {} not found", self.name))
    }

    pub(crate) fn missing_column(&self, column: &str) -> DashboardError {
        DashboardError::schema(format!("column {}.{} not found", self.name, column))
    }
}

/// Project and cast `batch` onto the canonical schema of `spec`
///
/// Column lookup is ASCII case-insensitive, matching SQLite identifier rules.
/// Extra columns are dropped.
pub fn conform(batch: &RecordBatch, spec: &TableSpec) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(spec.columns.len());

    for column in spec.columns {
        let idx = schema
            .fields()
            .iter()
            .position(|f| f.name().eq_ignore_ascii_case(column.name))
            .ok_or_else(|| spec.missing_column(column.name))?;

        let array = batch.column(idx);
        let target = column.column_type.data_type();
        if array.data_type() == &target {
            columns.push(array.clone());
            continue;
        }
        if !can_cast_types(array.data_type(), &target) {
            return Err(DashboardError::schema(format!(
                "column {}.{} has type {}, expected {}",
                spec.name,
                column.name,
                array.data_type(),
                target
            )));
        }
        columns.push(cast(array, &target)?);
    }

    Ok(RecordBatch::try_new(spec.schema(), columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Float64Array, Int32Array, StringArray};

    #[test]
    fn test_schema_is_nullable() {
        let schema = ORDER_DETAIL.schema();
        assert_eq!(schema.fields().len(), 5);
        assert!(schema.fields().iter().all(|f| f.is_nullable()));
        assert_eq!(schema.field(2).data_type(), &DataType::Float64);
    }

    #[test]
    fn test_conform_projects_and_casts() {
        let raw = RecordBatch::try_from_iter(vec![
            ("Extra", Arc::new(StringArray::from(vec!["x", "y"])) as ArrayRef),
            ("categoryname", Arc::new(StringArray::from(vec!["Beverages", "Seafood"])) as ArrayRef),
            ("ID", Arc::new(Int32Array::from(vec![1, 8])) as ArrayRef),
        ])
        .unwrap();

        let conformed = conform(&raw, &CATEGORY).unwrap();
        assert_eq!(conformed.num_columns(), 2);
        assert_eq!(conformed.schema().field(0).name(), "Id");
        assert_eq!(conformed.column(0).data_type(), &DataType::Int64);
        assert_eq!(conformed.column(1).len(), 2);
    }

    #[test]
    fn test_conform_reports_missing_column() {
        let raw = RecordBatch::try_from_iter(vec![(
            "Id",
            Arc::new(StringArray::from(vec!["ALFKI"])) as ArrayRef,
        )])
        .unwrap();

        let err = conform(&raw, &CUSTOMER).unwrap_err();
        assert!(matches!(err, DashboardError::SchemaMismatch { .. }));
        assert!(err.to_string().contains("Customer.Country"));
    }

    #[test]
    fn test_conform_casts_float_to_int() {
        let raw = RecordBatch::try_from_iter(vec![
            ("Id", Arc::new(Float64Array::from(vec![Some(3.0), None])) as ArrayRef),
            ("CategoryName", Arc::new(StringArray::from(vec!["Dairy", "Grains"])) as ArrayRef),
        ])
        .unwrap();

        let conformed = conform(&raw, &CATEGORY).unwrap();
        assert!(conformed.column(0).is_null(1));
    }
}
