use criterion::{black_box, criterion_group, criterion_main, Criterion};
use northwind_dash::{
    build_analytics, profit_by_category, sales_by_country, NorthwindTables,
    NorthwindTablesBuilder, SelectionRequest,
};

const COUNTRIES: &[&str] = &["USA", "Germany", "Austria", "Brazil", "France", "UK", "Venezuela"];

/// Northwind-sized synthetic tables: 830 orders, ~2150 lines
fn synthetic_tables() -> NorthwindTables {
    let mut builder = NorthwindTablesBuilder::new();
    for category in 1..=8 {
        builder = builder.category(category, &format!("Category {category}"));
    }
    for product in 1..=77 {
        builder = builder.product(product, &format!("Product {product}"), product % 8 + 1);
    }
    for customer in 0..91 {
        let country = COUNTRIES.get(customer % (COUNTRIES.len() + 1)).copied();
        builder = builder.customer(&format!("C{customer:04}"), country);
    }
    for order in 0..830i64 {
        let customer = format!("C{:04}", order % 91);
        builder = builder.order(10248 + order, Some(&customer));
        for line in 0..(order % 5 + 1) {
            let product = (order * 7 + line * 13) % 77 + 1;
            let price = 2.5 + (product as f64) * 1.25;
            let discount = if line % 3 == 0 { 0.05 } else { 0.0 };
            builder = builder.line(10248 + order, product, price, line + order % 20 + 1, discount);
        }
    }
    builder.build().expect("synthetic tables")
}

fn benchmark_queries(c: &mut Criterion) {
    let tables = synthetic_tables();

    c.bench_function("sales_by_country", |b| {
        b.iter(|| black_box(sales_by_country(black_box(&tables)).unwrap()))
    });
    c.bench_function("profit_by_category", |b| {
        b.iter(|| black_box(profit_by_category(black_box(&tables)).unwrap()))
    });
    c.bench_function("analytics_page", |b| {
        let request = SelectionRequest::default();
        b.iter(|| black_box(build_analytics(black_box(&tables), &request).unwrap()))
    });
}

criterion_group!(benches, benchmark_queries);
criterion_main!(benches);
