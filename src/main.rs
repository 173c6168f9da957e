use std::process::ExitCode;
use std::time::Instant;

use northwind_dash::config::{DashboardConfig, OutputFormat, LOG_ENV};
use northwind_dash::{render_analytics, render_overview, AnalyticsPage, DataSource, OverviewPage};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "dashboard failed");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = DashboardConfig::from_env()?;
    let source = DataSource::open(&config.source)?;

    let mut times = Vec::with_capacity(config.runs);
    let mut pages = None;
    for _ in 0..config.runs {
        let start = Instant::now();
        let overview = render_overview(&source)?;
        let analytics = render_analytics(&source, &config.selection)?;
        times.push(start.elapsed().as_secs_f64() * 1000.0);
        pages = Some((overview, analytics));
    }

    let Some((overview, analytics)) = pages else {
        return Ok(());
    };
    match config.format {
        OutputFormat::Json => {
            let doc = serde_json::json!({ "overview": overview, "analytics": analytics });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        OutputFormat::Table => {
            print_overview(&overview);
            print_analytics(&analytics);
        }
    }

    if times.len() > 1 {
        print_timings(&times);
    }
    Ok(())
}

fn label(key: &Option<String>) -> &str {
    key.as_deref().unwrap_or("(unknown)")
}

fn print_overview(page: &OverviewPage) {
    println!("Northwind Sales Overview");
    println!("========================");
    println!();
    println!("Sales by country");
    println!("{:-<64}", "");
    println!("{:<20} {:>15} {:>15} {:>10}", "Country", "TotalSales", "AveragePrice", "Orders");
    println!("{:-<64}", "");
    for row in &page.country_sales {
        println!(
            "{:<20} {:>15.2} {:>15.2} {:>10}",
            label(&row.country),
            row.total_sales,
            row.average_price,
            row.total_orders
        );
    }
    println!();

    println!("Sales by category");
    println!("{:-<64}", "");
    println!("{:<20} {:>15} {:>10}", "Category", "CategorySales", "Products");
    println!("{:-<64}", "");
    for row in &page.category_sales {
        println!(
            "{:<20} {:>15.2} {:>10}",
            label(&row.category_name),
            row.category_sales,
            row.product_count
        );
    }
    println!();

    println!("Countries:   {}", page.metrics.country_count);
    println!("Categories:  {}", page.metrics.category_count);
    println!("Total sales: ${:.2}", page.metrics.total_sales);
    println!();
}

fn print_analytics(page: &AnalyticsPage) {
    println!("Northwind Sales Analytics");
    println!("=========================");
    println!();
    println!("Selected countries:  {}", page.selected_countries.join(", "));
    println!("Selected categories: {}", page.selected_categories.join(", "));
    println!();

    println!("Sales by country");
    println!("{:-<64}", "");
    if page.filtered_country_sales.is_empty() {
        println!("No data available for selected countries");
    }
    for row in &page.filtered_country_sales {
        println!("{:<20} {:>15.2} {:>10}", label(&row.country), row.total_sales, row.total_orders);
    }
    println!();

    println!("Profit by category");
    println!("{:-<64}", "");
    if page.filtered_category_profit.is_empty() {
        println!("No data available for selected categories");
    }
    for row in &page.filtered_category_profit {
        println!("{:<20} {:>15.2}", label(&row.category_name), row.profit);
    }
    println!();

    println!("Top {} selling products", page.top_products.len());
    println!("{:-<64}", "");
    println!("{:<36} {:>10} {:>15}", "Product", "Sold", "Revenue");
    println!("{:-<64}", "");
    for row in &page.top_products {
        println!(
            "{:<36} {:>10} {:>15.2}",
            label(&row.product_name),
            row.total_sold,
            row.total_revenue
        );
    }
    println!();

    println!("Total countries:  {}", page.country_count);
    println!("Total categories: {}", page.category_count);
    println!();
}

fn print_timings(times: &[f64]) {
    let mean = times.iter().sum::<f64>() / times.len() as f64;
    let variance = times.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / times.len() as f64;
    let stddev = variance.sqrt();
    let min = times.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = times.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    println!("Render time ({} runs):", times.len());
    println!("{:-<40}", "");
    println!("  Mean:   {:.2} ms", mean);
    println!("  Stddev: {:.2} ms", stddev);
    println!("  Min:    {:.2} ms", min);
    println!("  Max:    {:.2} ms", max);
}
