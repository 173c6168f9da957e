//! Page render cycles
//!
//! A render loads a fresh table snapshot from the shared [`DataSource`], runs
//! the page's queries in sequence and applies the caller's selections. The
//! resulting page model is what the presentation layer draws; an empty
//! projected summary is a valid page and means "no data for this selection".

use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, info_span};

use crate::error::Result;
use crate::filter::{default_categories, default_countries, project};
use crate::query::{
    overview_metrics, profit_by_category, sales_by_category, sales_by_country,
    top_selling_products,
};
use crate::source::DataSource;
use crate::summary::{CategoryProfit, CategorySales, CountrySales, OverviewMetrics, TopProduct};
use crate::tables::NorthwindTables;

/// Landing page: sales by country and category with headline metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewPage {
    pub country_sales: Vec<CountrySales>,
    pub category_sales: Vec<CategorySales>,
    pub metrics: OverviewMetrics,
}

/// Filter choices coming back from the presentation layer
///
/// `None` applies the default selection policy; `Some(vec![])` is an
/// explicit empty selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionRequest {
    pub countries: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
}

/// Analytics page: filtered country sales, category profit, top products
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsPage {
    pub country_sales: Vec<CountrySales>,
    pub category_profit: Vec<CategoryProfit>,
    pub top_products: Vec<TopProduct>,
    pub selected_countries: Vec<String>,
    pub selected_categories: Vec<String>,
    pub filtered_country_sales: Vec<CountrySales>,
    pub filtered_category_profit: Vec<CategoryProfit>,
    pub country_count: usize,
    pub category_count: usize,
}

pub fn render_overview(source: &DataSource) -> Result<OverviewPage> {
    let tables = source.load_tables()?;
    build_overview(&tables)
}

pub fn render_analytics(source: &DataSource, request: &SelectionRequest) -> Result<AnalyticsPage> {
    let tables = source.load_tables()?;
    build_analytics(&tables, request)
}

/// Overview page from an already loaded snapshot
pub fn build_overview(tables: &NorthwindTables) -> Result<OverviewPage> {
    let _span = info_span!("overview").entered();

    let country_sales = sales_by_country(tables)?;
    let category_sales = sales_by_category(tables)?;
    let metrics = overview_metrics(&country_sales, category_sales.len());

    info!(
        countries = metrics.country_count,
        categories = metrics.category_count,
        total_sales = metrics.total_sales,
        "rendered overview"
    );
    Ok(OverviewPage {
        country_sales,
        category_sales,
        metrics,
    })
}

/// Analytics page from an already loaded snapshot
pub fn build_analytics(
    tables: &NorthwindTables,
    request: &SelectionRequest,
) -> Result<AnalyticsPage> {
    let _span = info_span!("analytics").entered();

    let country_sales = sales_by_country(tables)?;
    let category_profit = profit_by_category(tables)?;
    let top_products = top_selling_products(tables)?;

    let selected_countries = request
        .countries
        .clone()
        .unwrap_or_else(|| default_countries(&country_sales));
    let selected_categories = request
        .categories
        .clone()
        .unwrap_or_else(|| default_categories(&category_profit));

    let country_keys: HashSet<String> = selected_countries.iter().cloned().collect();
    let category_keys: HashSet<String> = selected_categories.iter().cloned().collect();
    let filtered_country_sales = project(&country_sales, &country_keys);
    let filtered_category_profit = project(&category_profit, &category_keys);

    info!(
        countries = filtered_country_sales.len(),
        categories = filtered_category_profit.len(),
        top_products = top_products.len(),
        "rendered analytics"
    );
    Ok(AnalyticsPage {
        country_count: country_sales.len(),
        category_count: category_profit.len(),
        country_sales,
        category_profit,
        top_products,
        selected_countries,
        selected_categories,
        filtered_country_sales,
        filtered_category_profit,
    })
}
