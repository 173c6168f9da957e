//! Northwind sales dashboard core
//!
//! Loads the Northwind sample tables from a read-only store, computes the
//! country, category and product summaries behind the dashboard pages, and
//! projects them onto the user's filter selections.

pub mod aggregator;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod expressions;
pub mod filter;
pub mod query;
pub mod reader;
pub mod schema;
pub mod source;
pub mod sqlite;
pub mod summary;
pub mod tables;
pub mod utils;

pub use dashboard::{
    build_analytics, build_overview, render_analytics, render_overview, AnalyticsPage,
    OverviewPage, SelectionRequest,
};
pub use error::{DashboardError, Result};
pub use filter::{default_categories, default_countries, project, project_batch};
pub use query::{profit_by_category, sales_by_category, sales_by_country, top_selling_products};
pub use source::DataSource;
pub use summary::{CategoryProfit, CategorySales, CountrySales, OverviewMetrics, TopProduct};
pub use tables::{NorthwindTables, NorthwindTablesBuilder};
