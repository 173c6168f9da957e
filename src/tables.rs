//! Loaded Northwind tables
//!
//! A [`NorthwindTables`] is an immutable snapshot of the five source tables,
//! each conformed to its canonical schema. Snapshots are cheap to clone
//! (Arrow buffers are reference counted) and safe to share across threads.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Builder, Int64Builder, RecordBatch, StringBuilder};

use crate::error::Result;
use crate::schema::{conform, TableSpec, CATEGORY, CUSTOMER, ORDER, ORDER_DETAIL, PRODUCT};

#[derive(Debug, Clone)]
pub struct NorthwindTables {
    pub orders: RecordBatch,
    pub order_details: RecordBatch,
    pub products: RecordBatch,
    pub categories: RecordBatch,
    pub customers: RecordBatch,
}

impl NorthwindTables {
    /// Build from raw batches, projecting and casting each to its schema
    pub fn try_new(
        orders: &RecordBatch,
        order_details: &RecordBatch,
        products: &RecordBatch,
        categories: &RecordBatch,
        customers: &RecordBatch,
    ) -> Result<Self> {
        Ok(Self {
            orders: conform(orders, &ORDER)?,
            order_details: conform(order_details, &ORDER_DETAIL)?,
            products: conform(products, &PRODUCT)?,
            categories: conform(categories, &CATEGORY)?,
            customers: conform(customers, &CUSTOMER)?,
        })
    }

    /// Load every table through `load`, which receives the table definition
    pub fn load_with<F>(mut load: F) -> Result<Self>
    where
        F: FnMut(&TableSpec) -> Result<RecordBatch>,
    {
        let orders = load(&ORDER)?;
        let order_details = load(&ORDER_DETAIL)?;
        let products = load(&PRODUCT)?;
        let categories = load(&CATEGORY)?;
        let customers = load(&CUSTOMER)?;
        Self::try_new(&orders, &order_details, &products, &categories, &customers)
    }

    /// Tables paired with their definitions, in load order
    pub fn iter(&self) -> impl Iterator<Item = (&'static TableSpec, &RecordBatch)> {
        [
            (&ORDER, &self.orders),
            (&ORDER_DETAIL, &self.order_details),
            (&PRODUCT, &self.products),
            (&CATEGORY, &self.categories),
            (&CUSTOMER, &self.customers),
        ]
        .into_iter()
    }

    pub fn line_count(&self) -> usize {
        self.order_details.num_rows()
    }
}

/// Row-wise builder for small in-memory table sets
///
/// Used for fixtures and synthetic benchmark data.
#[derive(Debug, Default)]
pub struct NorthwindTablesBuilder {
    order_id: Int64Builder,
    order_customer: StringBuilder,
    line_order: Int64Builder,
    line_product: Int64Builder,
    line_price: Float64Builder,
    line_quantity: Int64Builder,
    line_discount: Float64Builder,
    product_id: Int64Builder,
    product_name: StringBuilder,
    product_category: Int64Builder,
    category_id: Int64Builder,
    category_name: StringBuilder,
    customer_id: StringBuilder,
    customer_country: StringBuilder,
}

impl NorthwindTablesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order(mut self, id: i64, customer_id: Option<&str>) -> Self {
        self.order_id.append_value(id);
        self.order_customer.append_option(customer_id);
        self
    }

    pub fn line(
        mut self,
        order_id: i64,
        product_id: i64,
        unit_price: f64,
        quantity: i64,
        discount: f64,
    ) -> Self {
        self.line_order.append_value(order_id);
        self.line_product.append_value(product_id);
        self.line_price.append_value(unit_price);
        self.line_quantity.append_value(quantity);
        self.line_discount.append_value(discount);
        self
    }

    /// Append a line whose fields may be null
    pub fn raw_line(
        mut self,
        order_id: Option<i64>,
        product_id: Option<i64>,
        unit_price: Option<f64>,
        quantity: Option<i64>,
        discount: Option<f64>,
    ) -> Self {
        self.line_order.append_option(order_id);
        self.line_product.append_option(product_id);
        self.line_price.append_option(unit_price);
        self.line_quantity.append_option(quantity);
        self.line_discount.append_option(discount);
        self
    }

    pub fn product(mut self, id: i64, name: &str, category_id: i64) -> Self {
        self.product_id.append_value(id);
        self.product_name.append_value(name);
        self.product_category.append_value(category_id);
        self
    }

    pub fn category(mut self, id: i64, name: &str) -> Self {
        self.category_id.append_value(id);
        self.category_name.append_value(name);
        self
    }

    pub fn customer(mut self, id: &str, country: Option<&str>) -> Self {
        self.customer_id.append_value(id);
        self.customer_country.append_option(country);
        self
    }

    pub fn build(mut self) -> Result<NorthwindTables> {
        fn batch(spec: &TableSpec, columns: Vec<ArrayRef>) -> Result<RecordBatch> {
            Ok(RecordBatch::try_new(spec.schema(), columns)?)
        }

        Ok(NorthwindTables {
            orders: batch(
                &ORDER,
                vec![
                    Arc::new(self.order_id.finish()),
                    Arc::new(self.order_customer.finish()),
                ],
            )?,
            order_details: batch(
                &ORDER_DETAIL,
                vec![
                    Arc::new(self.line_order.finish()),
                    Arc::new(self.line_product.finish()),
                    Arc::new(self.line_price.finish()),
                    Arc::new(self.line_quantity.finish()),
                    Arc::new(self.line_discount.finish()),
                ],
            )?,
            products: batch(
                &PRODUCT,
                vec![
                    Arc::new(self.product_id.finish()),
                    Arc::new(self.product_name.finish()),
                    Arc::new(self.product_category.finish()),
                ],
            )?,
            categories: batch(
                &CATEGORY,
                vec![
                    Arc::new(self.category_id.finish()),
                    Arc::new(self.category_name.finish()),
                ],
            )?,
            customers: batch(
                &CUSTOMER,
                vec![
                    Arc::new(self.customer_id.finish()),
                    Arc::new(self.customer_country.finish()),
                ],
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{get_f64_column, get_str_column};
    use arrow::array::Array;

    #[test]
    fn test_builder_produces_canonical_tables() {
        let tables = NorthwindTablesBuilder::new()
            .customer("ALFKI", Some("Germany"))
            .customer("ANON", None)
            .order(10248, Some("ALFKI"))
            .line(10248, 11, 14.0, 12, 0.0)
            .raw_line(Some(10248), Some(42), None, Some(10), Some(0.0))
            .build()
            .unwrap();

        assert_eq!(tables.line_count(), 2);
        assert_eq!(tables.orders.schema(), ORDER.schema());

        let country = get_str_column(&tables.customers, "Country").unwrap();
        assert!(country.is_null(1));

        let price = get_f64_column(&tables.order_details, "UnitPrice").unwrap();
        assert!(price.is_null(1));
    }

    #[test]
    fn test_iter_follows_load_order() {
        let tables = NorthwindTablesBuilder::new().build().unwrap();
        let names: Vec<&str> = tables.iter().map(|(spec, _)| spec.name).collect();
        assert_eq!(
            names,
            vec!["Order", "OrderDetail", "Product", "Category", "Customer"]
        );
    }

    #[test]
    fn test_load_with_conforms_batches() {
        let source = NorthwindTablesBuilder::new()
            .category(1, "Beverages")
            .build()
            .unwrap();

        let loaded = NorthwindTables::load_with(|spec| {
            let (_, batch) = source
                .iter()
                .find(|(s, _)| s.name == spec.name)
                .unwrap();
            Ok(batch.clone())
        })
        .unwrap();

        assert_eq!(loaded.categories.num_rows(), 1);
    }
}
