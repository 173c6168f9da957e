//! Vectorized line expressions using Arrow kernels

use arrow::array::{Array, AsArray, Float64Array, RecordBatch};
use arrow::compute::cast;
use arrow::compute::kernels::numeric;
use arrow::datatypes::{DataType, Float64Type};

use crate::error::{DashboardError, Result};
use crate::utils::get_f64_column;

/// Derived per-line columns over `OrderDetail`
///
/// Nulls propagate: a line with a null price or quantity has a null gross.
pub struct LineExpressions {
    /// UnitPrice * Quantity
    pub gross: Float64Array,
    /// UnitPrice * Quantity * Discount
    pub discount_amount: Float64Array,
}

/// Evaluate the line expressions for a conformed `OrderDetail` batch
pub fn evaluate_line_expressions(order_details: &RecordBatch) -> Result<LineExpressions> {
    let price = get_f64_column(order_details, "UnitPrice")?;
    let discount = get_f64_column(order_details, "Discount")?;

    let quantity_idx = order_details
        .schema()
        .index_of("Quantity")
        .map_err(|_| DashboardError::schema("column Quantity not found"))?;
    let quantity = cast(order_details.column(quantity_idx), &DataType::Float64)?;

    let gross_arc = numeric::mul(price, &quantity)?;
    let gross = gross_arc.as_primitive::<Float64Type>().clone();

    let discount_arc = numeric::mul(&gross, discount)?;
    let discount_amount = discount_arc.as_primitive::<Float64Type>().clone();

    Ok(LineExpressions {
        gross,
        discount_amount,
    })
}

impl LineExpressions {
    pub fn len(&self) -> usize {
        self.gross.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gross.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::NorthwindTablesBuilder;

    #[test]
    fn test_gross_and_discount() {
        let tables = NorthwindTablesBuilder::new()
            .line(1, 1, 10.0, 2, 0.0)
            .line(1, 2, 100.0, 1, 0.1)
            .raw_line(Some(1), Some(3), None, Some(4), Some(0.0))
            .build()
            .unwrap();

        let exprs = evaluate_line_expressions(&tables.order_details).unwrap();
        assert_eq!(exprs.len(), 3);
        assert_eq!(exprs.gross.value(0), 20.0);
        assert_eq!(exprs.gross.value(1), 100.0);
        assert!((exprs.discount_amount.value(1) - 10.0).abs() < 1e-9);
        assert!(exprs.gross.is_null(2));
        assert!(exprs.discount_amount.is_null(2));
    }
}
