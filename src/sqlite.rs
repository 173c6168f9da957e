//! SQLite table loader
//!
//! Reads the required columns of a table into an Arrow [`RecordBatch`].
//! SQLite is dynamically typed, so each value is coerced to the column's
//! canonical type; values that cannot be coerced are schema errors.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Builder, Int64Builder, RecordBatch, StringBuilder};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use tracing::debug;

use crate::error::{DashboardError, Result};
use crate::schema::{ColumnSpec, ColumnType, TableSpec};

/// Column names of `table`, empty when the table does not exist
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote(table)))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

/// Read the columns required by `spec` from its table
pub fn read_table(conn: &Connection, spec: &TableSpec) -> Result<RecordBatch> {
    let available = table_columns(conn, spec.name)?;
    if available.is_empty() {
        return Err(spec.missing_table());
    }

    // Resolve the stored spelling of each column; SQLite identifiers are case-insensitive
    let mut select = Vec::with_capacity(spec.columns.len());
    for column in spec.columns {
        let stored = available
            .iter()
            .find(|name| name.eq_ignore_ascii_case(column.name))
            .ok_or_else(|| spec.missing_column(column.name))?;
        select.push(quote(stored));
    }

    let sql = format!("SELECT {} FROM {}", select.join(", "), quote(spec.name));
    let mut stmt = conn.prepare(&sql)?;
    let mut buffers: Vec<ColumnBuffer> = spec.columns.iter().map(ColumnBuffer::new).collect();

    let mut rows = stmt.query([])?;
    let mut row_idx = 0usize;
    while let Some(row) = rows.next()? {
        for (i, buffer) in buffers.iter_mut().enumerate() {
            buffer
                .append(row.get_ref(i)?)
                .map_err(|expected| {
                    DashboardError::schema(format!(
                        "value in {}.{} at row {} is not {}",
                        spec.name, spec.columns[i].name, row_idx, expected
                    ))
                })?;
        }
        row_idx += 1;
    }

    let columns: Vec<ArrayRef> = buffers.into_iter().map(ColumnBuffer::finish).collect();
    debug!(table = spec.name, rows = row_idx, "loaded sqlite table");
    Ok(RecordBatch::try_new(spec.schema(), columns)?)
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

enum ColumnBuffer {
    Int64(Int64Builder),
    Float64(Float64Builder),
    Utf8(StringBuilder),
}

impl ColumnBuffer {
    fn new(spec: &ColumnSpec) -> Self {
        match spec.column_type {
            ColumnType::Int64 => ColumnBuffer::Int64(Int64Builder::new()),
            ColumnType::Float64 => ColumnBuffer::Float64(Float64Builder::new()),
            ColumnType::Utf8 => ColumnBuffer::Utf8(StringBuilder::new()),
        }
    }

    /// Append one value; on failure returns the expected type name
    fn append(&mut self, value: ValueRef<'_>) -> std::result::Result<(), &'static str> {
        match self {
            ColumnBuffer::Int64(b) => match value {
                ValueRef::Null => b.append_null(),
                ValueRef::Integer(v) => b.append_value(v),
                ValueRef::Real(v) if v.fract() == 0.0 => b.append_value(v as i64),
                ValueRef::Text(t) => {
                    let v = std::str::from_utf8(t)
                        .ok()
                        .and_then(|s| s.trim().parse::<i64>().ok())
                        .ok_or("an integer")?;
                    b.append_value(v);
                }
                _ => return Err("an integer"),
            },
            ColumnBuffer::Float64(b) => match value {
                ValueRef::Null => b.append_null(),
                ValueRef::Integer(v) => b.append_value(v as f64),
                ValueRef::Real(v) if v.is_finite() => b.append_value(v),
                ValueRef::Real(_) => return Err("a finite number"),
                ValueRef::Text(t) => {
                    let v = std::str::from_utf8(t)
                        .ok()
                        .and_then(|s| s.trim().parse::<f64>().ok())
                        .filter(|v| v.is_finite())
                        .ok_or("a finite number")?;
                    b.append_value(v);
                }
                ValueRef::Blob(_) => return Err("a number"),
            },
            ColumnBuffer::Utf8(b) => match value {
                ValueRef::Null => b.append_null(),
                ValueRef::Text(t) => {
                    b.append_value(std::str::from_utf8(t).map_err(|_| "utf-8 text")?)
                }
                ValueRef::Integer(v) => b.append_value(v.to_string()),
                ValueRef::Real(v) => b.append_value(v.to_string()),
                ValueRef::Blob(_) => return Err("text"),
            },
        }
        Ok(())
    }

    fn finish(self) -> ArrayRef {
        match self {
            ColumnBuffer::Int64(mut b) => Arc::new(b.finish()),
            ColumnBuffer::Float64(mut b) => Arc::new(b.finish()),
            ColumnBuffer::Utf8(mut b) => Arc::new(b.finish()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CUSTOMER, ORDER, ORDER_DETAIL};
    use crate::utils::{get_f64_column, get_i64_column, get_str_column};
    use arrow::array::Array;

    fn memory_db(sql: &str) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(sql).unwrap();
        conn
    }

    #[test]
    fn test_read_quoted_table_name() {
        let conn = memory_db(
            r#"CREATE TABLE "Order" (Id INTEGER PRIMARY KEY, CustomerId TEXT, OrderDate TEXT);
               INSERT INTO "Order" VALUES (10248, 'VINET', '2012-07-04'), (10249, NULL, NULL);"#,
        );

        let batch = read_table(&conn, &ORDER).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 2);
        let customer = get_str_column(&batch, "CustomerId").unwrap();
        assert_eq!(customer.value(0), "VINET");
        assert!(customer.is_null(1));
    }

    #[test]
    fn test_numeric_affinity_is_coerced() {
        let conn = memory_db(
            r#"CREATE TABLE OrderDetail (Id TEXT, OrderId INTEGER, ProductId INTEGER,
                   UnitPrice DECIMAL, Quantity INTEGER, Discount DOUBLE);
               INSERT INTO OrderDetail VALUES ('10248/11', 10248, 11, 14, 12, 0),
                                              ('10248/42', 10248, 42, 9.8, '10', 0.15);"#,
        );

        let batch = read_table(&conn, &ORDER_DETAIL).unwrap();
        let price = get_f64_column(&batch, "UnitPrice").unwrap();
        assert_eq!(price.value(0), 14.0);
        assert_eq!(price.value(1), 9.8);
        let qty = get_i64_column(&batch, "Quantity").unwrap();
        assert_eq!(qty.value(1), 10);
    }

    #[test]
    fn test_column_names_are_case_insensitive() {
        let conn = memory_db(
            "CREATE TABLE customer (ID TEXT, COUNTRY TEXT);
             INSERT INTO customer VALUES ('ALFKI', 'Germany');",
        );

        let batch = read_table(&conn, &CUSTOMER).unwrap();
        assert_eq!(batch.schema().field(1).name(), "Country");
        assert_eq!(get_str_column(&batch, "Country").unwrap().value(0), "Germany");
    }

    #[test]
    fn test_missing_table_and_column() {
        let conn = memory_db("CREATE TABLE Customer (Id TEXT);");

        let err = read_table(&conn, &ORDER).unwrap_err();
        assert!(err.to_string().contains("table Order not found"));

        let err = read_table(&conn, &CUSTOMER).unwrap_err();
        assert!(err.to_string().contains("column Customer.Country not found"));
    }

    #[test]
    fn test_uncoercible_value_is_schema_error() {
        let conn = memory_db(
            r#"CREATE TABLE "Order" (Id INTEGER, CustomerId TEXT);
               INSERT INTO "Order" VALUES ('not-a-number', 'VINET');"#,
        );

        let err = read_table(&conn, &ORDER).unwrap_err();
        assert!(matches!(err, DashboardError::SchemaMismatch { .. }));
        assert!(err.to_string().contains("Order.Id"));
    }

    #[test]
    fn test_non_finite_price_is_schema_error() {
        for text in ["NaN", "inf", "-Infinity"] {
            let conn = memory_db(&format!(
                "CREATE TABLE OrderDetail (
                    OrderId INTEGER, ProductId INTEGER, UnitPrice REAL,
                    Quantity INTEGER, Discount REAL
                 );
                 INSERT INTO OrderDetail VALUES (10, 1, '{}', 2, 0);",
                text
            ));

            let err = read_table(&conn, &ORDER_DETAIL).unwrap_err();
            assert!(matches!(err, DashboardError::SchemaMismatch { .. }), "{}", text);
            assert!(err.to_string().contains("OrderDetail.UnitPrice"));
        }
    }
}
