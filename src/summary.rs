//! Summary rows handed to the presentation layer
//!
//! Each summary is a `Vec` of rows, serializable with camelCase field names,
//! and convertible to an Arrow [`RecordBatch`] whose column names follow the
//! dashboard's column labels (`Country`, `TotalSales`, ...).

use std::sync::Arc;

use arrow_array::{ArrayRef, Float64Array, Int64Array, RecordBatch, StringArray, UInt64Array};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use serde::Serialize;

use crate::error::Result;

/// A row of a summary table keyed by one dimension
pub trait SummaryRow: Clone {
    /// Name of the key column in the batch form
    const KEY_COLUMN: &'static str;

    /// Grouping key; `None` for the null group
    fn key(&self) -> Option<&str>;

    fn schema() -> SchemaRef;

    fn to_record_batch(rows: &[Self]) -> Result<RecordBatch>;
}

/// Sales per customer country
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountrySales {
    pub country: Option<String>,
    pub total_sales: f64,
    pub average_price: f64,
    pub total_orders: u64,
}

/// Sales per product category
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySales {
    pub category_name: Option<String>,
    pub category_sales: f64,
    pub product_count: u64,
}

/// Discounted revenue per product category
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryProfit {
    pub category_name: Option<String>,
    pub profit: f64,
}

/// Best-selling product by units
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub product_name: Option<String>,
    pub total_sold: i64,
    pub total_revenue: f64,
}

/// Headline figures of the overview page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewMetrics {
    pub country_count: usize,
    pub category_count: usize,
    pub total_sales: f64,
}

fn schema_of(fields: Vec<(&str, DataType)>) -> SchemaRef {
    Arc::new(Schema::new(
        fields
            .into_iter()
            .map(|(name, ty)| Field::new(name, ty, true))
            .collect::<Vec<_>>(),
    ))
}

fn keys<T: SummaryRow>(rows: &[T]) -> ArrayRef {
    Arc::new(rows.iter().map(|r| r.key()).collect::<StringArray>())
}

impl SummaryRow for CountrySales {
    const KEY_COLUMN: &'static str = "Country";

    fn key(&self) -> Option<&str> {
        self.country.as_deref()
    }

    fn schema() -> SchemaRef {
        schema_of(vec![
            ("Country", DataType::Utf8),
            ("TotalSales", DataType::Float64),
            ("AveragePrice", DataType::Float64),
            ("TotalOrders", DataType::UInt64),
        ])
    }

    fn to_record_batch(rows: &[Self]) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = vec![
            keys(rows),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.total_sales))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.average_price))),
            Arc::new(UInt64Array::from_iter_values(rows.iter().map(|r| r.total_orders))),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }
}

impl SummaryRow for CategorySales {
    const KEY_COLUMN: &'static str = "CategoryName";

    fn key(&self) -> Option<&str> {
        self.category_name.as_deref()
    }

    fn schema() -> SchemaRef {
        schema_of(vec![
            ("CategoryName", DataType::Utf8),
            ("CategorySales", DataType::Float64),
            ("ProductCount", DataType::UInt64),
        ])
    }

    fn to_record_batch(rows: &[Self]) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = vec![
            keys(rows),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.category_sales))),
            Arc::new(UInt64Array::from_iter_values(rows.iter().map(|r| r.product_count))),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }
}

impl SummaryRow for CategoryProfit {
    const KEY_COLUMN: &'static str = "CategoryName";

    fn key(&self) -> Option<&str> {
        self.category_name.as_deref()
    }

    fn schema() -> SchemaRef {
        schema_of(vec![
            ("CategoryName", DataType::Utf8),
            ("Profit", DataType::Float64),
        ])
    }

    fn to_record_batch(rows: &[Self]) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = vec![
            keys(rows),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.profit))),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }
}

impl SummaryRow for TopProduct {
    const KEY_COLUMN: &'static str = "ProductName";

    fn key(&self) -> Option<&str> {
        self.product_name.as_deref()
    }

    fn schema() -> SchemaRef {
        schema_of(vec![
            ("ProductName", DataType::Utf8),
            ("TotalSold", DataType::Int64),
            ("TotalRevenue", DataType::Float64),
        ])
    }

    fn to_record_batch(rows: &[Self]) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = vec![
            keys(rows),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.total_sold))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.total_revenue))),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;

    #[test]
    fn test_country_batch_keeps_null_key() {
        let rows = vec![
            CountrySales {
                country: Some("France".to_string()),
                total_sales: 25.0,
                average_price: 7.5,
                total_orders: 2,
            },
            CountrySales {
                country: None,
                total_sales: 15.0,
                average_price: 7.5,
                total_orders: 1,
            },
        ];

        let batch = CountrySales::to_record_batch(&rows).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema().field(0).name(), CountrySales::KEY_COLUMN);
        assert!(batch.column(0).is_null(1));
    }

    #[test]
    fn test_serializes_camel_case() {
        let row = TopProduct {
            product_name: Some("Chai".to_string()),
            total_sold: 5,
            total_revenue: 90.0,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["productName"], "Chai");
        assert_eq!(json["totalSold"], 5);
        assert_eq!(json["totalRevenue"], 90.0);
    }

    #[test]
    fn test_empty_summary_batch() {
        let batch = CategoryProfit::to_record_batch(&[]).unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 2);
    }
}
