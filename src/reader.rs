//! Parquet table reader with column projection
//!
//! The columnar backend stores one file per table, `<Table>.parquet`, in a
//! single directory. Only the columns a table definition requires are
//! decoded.

use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::array::RecordBatch;
use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatchReader;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::{ArrowWriter, ProjectionMask};
use tracing::debug;

use crate::error::{DashboardError, Result};
use crate::schema::TableSpec;
use crate::tables::NorthwindTables;

/// Rows decoded per batch
pub const BATCH_SIZE: usize = 8192;

/// Location of a table's file inside a snapshot directory
pub fn table_path(dir: &Path, spec: &TableSpec) -> PathBuf {
    dir.join(format!("{}.parquet", spec.name))
}

/// Read the columns required by `spec` from its parquet file
pub fn read_table(dir: &Path, spec: &TableSpec) -> Result<RecordBatch> {
    let path = table_path(dir, spec);
    let file = match File::open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(spec.missing_table()),
        Err(e) => return Err(DashboardError::unavailable(path, e)),
    };
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| DashboardError::unavailable(&path, e))?;

    let parquet_schema = builder.parquet_schema();
    let arrow_schema = builder.schema().clone();

    // Find root indices of the required columns
    let mut projection_indices = Vec::with_capacity(spec.columns.len());
    for column in spec.columns {
        let idx = arrow_schema
            .fields()
            .iter()
            .position(|f| f.name().eq_ignore_ascii_case(column.name))
            .ok_or_else(|| spec.missing_column(column.name))?;
        projection_indices.push(idx);
    }

    let projection = ProjectionMask::roots(parquet_schema, projection_indices);
    let reader = builder
        .with_projection(projection)
        .with_batch_size(BATCH_SIZE)
        .build()?;

    let projected_schema = reader.schema();
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    let batch = concat_batches(&projected_schema, &batches)?;

    debug!(table = spec.name, rows = batch.num_rows(), "loaded parquet table");
    Ok(batch)
}

/// Write every table of `tables` into `dir` as a parquet snapshot
pub fn write_snapshot(tables: &NorthwindTables, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    for (spec, batch) in tables.iter() {
        let file = File::create(table_path(dir, spec))?;
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
        writer.write(batch)?;
        writer.close()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{conform, ORDER_DETAIL, PRODUCT};
    use crate::tables::NorthwindTablesBuilder;
    use crate::utils::get_str_column;
    use arrow::array::{ArrayRef, Int64Array, StringArray};
    use std::sync::Arc;

    #[test]
    fn test_snapshot_round_trip_projects_columns() {
        let dir = tempfile::tempdir().unwrap();
        let tables = NorthwindTablesBuilder::new()
            .product(11, "Queso Cabrales", 4)
            .product(42, "Singaporean Hokkien Fried Mee", 5)
            .build()
            .unwrap();
        write_snapshot(&tables, dir.path()).unwrap();

        let products = read_table(dir.path(), &PRODUCT).unwrap();
        assert_eq!(products.num_rows(), 2);
        let names = get_str_column(&products, "ProductName").unwrap();
        assert_eq!(names.value(1), "Singaporean Hokkien Fried Mee");
    }

    #[test]
    fn test_extra_columns_are_not_decoded() {
        let dir = tempfile::tempdir().unwrap();
        let wide = RecordBatch::try_from_iter(vec![
            ("Id", Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef),
            ("ProductName", Arc::new(StringArray::from(vec!["Chai", "Chang"])) as ArrayRef),
            (
                "QuantityPerUnit",
                Arc::new(StringArray::from(vec!["10 boxes", "24 bottles"])) as ArrayRef,
            ),
            ("CategoryId", Arc::new(Int64Array::from(vec![1, 1])) as ArrayRef),
        ])
        .unwrap();
        let file = File::create(table_path(dir.path(), &PRODUCT)).unwrap();
        let mut writer = ArrowWriter::try_new(file, wide.schema(), None).unwrap();
        writer.write(&wide).unwrap();
        writer.close().unwrap();

        let batch = read_table(dir.path(), &PRODUCT).unwrap();
        assert_eq!(batch.num_columns(), 3);
        assert!(conform(&batch, &PRODUCT).is_ok());
    }

    #[test]
    fn test_missing_file_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_table(dir.path(), &ORDER_DETAIL).unwrap_err();
        assert!(err.to_string().contains("table OrderDetail not found"));
    }
}
