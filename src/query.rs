//! Aggregation queries over the loaded Northwind tables
//!
//! Each query is one pass over `OrderDetail` after building hash lookups for
//! the dimension tables it joins. Joins are inner joins: a line whose
//! reference is null or points at a missing row is skipped. Currency totals
//! are summed unrounded and rounded to cents at the end; rows are sorted on
//! the rounded metric, descending, with ties in first-seen order.

use std::collections::HashMap;

use arrow::array::Array;
use tracing::debug;

use crate::aggregator::{sort_desc_by, Aggregator, Avg, DistinctCount, Sum};
use crate::error::Result;
use crate::expressions::evaluate_line_expressions;
use crate::summary::{CategoryProfit, CategorySales, CountrySales, OverviewMetrics, TopProduct};
use crate::tables::NorthwindTables;
use crate::utils::{
    get_f64_column, get_i64_column, get_str_column, opt_f64, opt_i64, opt_str, round2,
};

/// Rows returned by [`top_selling_products`]
pub const TOP_PRODUCTS_LIMIT: usize = 10;

/// Order id -> customer id
fn order_customers(tables: &NorthwindTables) -> Result<HashMap<i64, &str>> {
    let ids = get_i64_column(&tables.orders, "Id")?;
    let customers = get_str_column(&tables.orders, "CustomerId")?;
    Ok((0..ids.len())
        .filter_map(|i| Some((opt_i64(ids, i)?, opt_str(customers, i)?)))
        .collect())
}

/// Customer id -> country (possibly null)
fn customer_countries(tables: &NorthwindTables) -> Result<HashMap<&str, Option<&str>>> {
    let ids = get_str_column(&tables.customers, "Id")?;
    let countries = get_str_column(&tables.customers, "Country")?;
    Ok((0..ids.len())
        .filter_map(|i| Some((opt_str(ids, i)?, opt_str(countries, i))))
        .collect())
}

struct ProductRow<'a> {
    name: Option<&'a str>,
    category_id: Option<i64>,
}

/// Product id -> name and category reference
fn products(tables: &NorthwindTables) -> Result<HashMap<i64, ProductRow<'_>>> {
    let ids = get_i64_column(&tables.products, "Id")?;
    let names = get_str_column(&tables.products, "ProductName")?;
    let categories = get_i64_column(&tables.products, "CategoryId")?;
    Ok((0..ids.len())
        .filter_map(|i| {
            let row = ProductRow {
                name: opt_str(names, i),
                category_id: opt_i64(categories, i),
            };
            Some((opt_i64(ids, i)?, row))
        })
        .collect())
}

/// Category id -> name (possibly null)
fn category_names(tables: &NorthwindTables) -> Result<HashMap<i64, Option<&str>>> {
    let ids = get_i64_column(&tables.categories, "Id")?;
    let names = get_str_column(&tables.categories, "CategoryName")?;
    Ok((0..ids.len())
        .filter_map(|i| Some((opt_i64(ids, i)?, opt_str(names, i))))
        .collect())
}

#[derive(Default)]
struct CountryState {
    sales: Sum,
    price: Avg,
    orders: DistinctCount,
}

/// Sales per customer country
///
/// `Order ⋈ Customer ⋈ OrderDetail`, grouped by `Customer.Country`.
/// Customers without a country form a single `None` group.
pub fn sales_by_country(tables: &NorthwindTables) -> Result<Vec<CountrySales>> {
    let order_customers = order_customers(tables)?;
    let countries = customer_countries(tables)?;

    let lines = &tables.order_details;
    let order_ids = get_i64_column(lines, "OrderId")?;
    let prices = get_f64_column(lines, "UnitPrice")?;
    let exprs = evaluate_line_expressions(lines)?;

    let mut aggregator: Aggregator<CountryState> = Aggregator::new();
    for i in 0..lines.num_rows() {
        let Some(order_id) = opt_i64(order_ids, i) else { continue };
        let Some(customer) = order_customers.get(&order_id) else { continue };
        let Some(country) = countries.get(customer) else { continue };

        let state = aggregator.state(*country);
        state.sales.add(opt_f64(&exprs.gross, i));
        state.price.add(opt_f64(prices, i));
        state.orders.add(Some(order_id));
    }

    let mut rows: Vec<CountrySales> = aggregator
        .into_groups()
        .map(|(country, state)| CountrySales {
            country,
            total_sales: state.sales.rounded(),
            average_price: round2(state.price.value()),
            total_orders: state.orders.count(),
        })
        .collect();
    sort_desc_by(&mut rows, |r| r.total_sales);

    debug!(groups = rows.len(), "sales_by_country");
    Ok(rows)
}

#[derive(Default)]
struct CategoryState {
    sales: Sum,
    products: DistinctCount,
}

/// Sales per product category
///
/// `OrderDetail ⋈ Product ⋈ Category`, grouped by `Category.CategoryName`.
pub fn sales_by_category(tables: &NorthwindTables) -> Result<Vec<CategorySales>> {
    let products = products(tables)?;
    let categories = category_names(tables)?;

    let lines = &tables.order_details;
    let product_ids = get_i64_column(lines, "ProductId")?;
    let exprs = evaluate_line_expressions(lines)?;

    let mut aggregator: Aggregator<CategoryState> = Aggregator::new();
    for i in 0..lines.num_rows() {
        let Some(product_id) = opt_i64(product_ids, i) else { continue };
        let Some(product) = products.get(&product_id) else { continue };
        let Some(category_name) = product.category_id.and_then(|id| categories.get(&id)) else {
            continue;
        };

        let state = aggregator.state(*category_name);
        state.sales.add(opt_f64(&exprs.gross, i));
        state.products.add(Some(product_id));
    }

    let mut rows: Vec<CategorySales> = aggregator
        .into_groups()
        .map(|(category_name, state)| CategorySales {
            category_name,
            category_sales: state.sales.rounded(),
            product_count: state.products.count(),
        })
        .collect();
    sort_desc_by(&mut rows, |r| r.category_sales);

    debug!(groups = rows.len(), "sales_by_category");
    Ok(rows)
}

#[derive(Default)]
struct ProfitState {
    gross: Sum,
    discount: Sum,
}

/// Revenue net of line discounts per product category
///
/// The discount is applied per line and summed, then subtracted from the
/// summed gross: `round(Σ price×qty − Σ price×qty×discount, 2)`.
pub fn profit_by_category(tables: &NorthwindTables) -> Result<Vec<CategoryProfit>> {
    let products = products(tables)?;
    let categories = category_names(tables)?;

    let lines = &tables.order_details;
    let product_ids = get_i64_column(lines, "ProductId")?;
    let exprs = evaluate_line_expressions(lines)?;

    let mut aggregator: Aggregator<ProfitState> = Aggregator::new();
    for i in 0..lines.num_rows() {
        let Some(product_id) = opt_i64(product_ids, i) else { continue };
        let Some(product) = products.get(&product_id) else { continue };
        let Some(category_name) = product.category_id.and_then(|id| categories.get(&id)) else {
            continue;
        };

        let state = aggregator.state(*category_name);
        state.gross.add(opt_f64(&exprs.gross, i));
        state.discount.add(opt_f64(&exprs.discount_amount, i));
    }

    let mut rows: Vec<CategoryProfit> = aggregator
        .into_groups()
        .map(|(category_name, state)| CategoryProfit {
            category_name,
            profit: round2(state.gross.total - state.discount.total),
        })
        .collect();
    sort_desc_by(&mut rows, |r| r.profit);

    debug!(groups = rows.len(), "profit_by_category");
    Ok(rows)
}

#[derive(Default)]
struct ProductState {
    sold: i64,
    revenue: Sum,
}

/// The ten products with the most units sold
///
/// `OrderDetail ⋈ Product`, grouped by `Product.ProductName`, so products
/// sharing a name are counted together.
pub fn top_selling_products(tables: &NorthwindTables) -> Result<Vec<TopProduct>> {
    let products = products(tables)?;

    let lines = &tables.order_details;
    let product_ids = get_i64_column(lines, "ProductId")?;
    let quantities = get_i64_column(lines, "Quantity")?;
    let exprs = evaluate_line_expressions(lines)?;

    let mut aggregator: Aggregator<ProductState> = Aggregator::new();
    for i in 0..lines.num_rows() {
        let Some(product_id) = opt_i64(product_ids, i) else { continue };
        let Some(product) = products.get(&product_id) else { continue };

        let state = aggregator.state(product.name);
        state.sold += opt_i64(quantities, i).unwrap_or(0);
        state.revenue.add(opt_f64(&exprs.gross, i));
    }

    let mut rows: Vec<TopProduct> = aggregator
        .into_groups()
        .map(|(product_name, state)| TopProduct {
            product_name,
            total_sold: state.sold,
            total_revenue: state.revenue.rounded(),
        })
        .collect();
    rows.sort_by(|a, b| b.total_sold.cmp(&a.total_sold));
    rows.truncate(TOP_PRODUCTS_LIMIT);

    debug!(rows = rows.len(), "top_selling_products");
    Ok(rows)
}

/// Headline figures derived from the country and category summaries
pub fn overview_metrics(
    country_sales: &[CountrySales],
    category_rows: usize,
) -> OverviewMetrics {
    OverviewMetrics {
        country_count: country_sales.len(),
        category_count: category_rows,
        total_sales: round2(country_sales.iter().map(|r| r.total_sales).sum()),
    }
}
