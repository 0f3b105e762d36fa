use std::collections::HashMap;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use domain::{Money, ProductId, ProductSnapshot, RequestedLine, price_order};

fn make_catalog(size: usize) -> HashMap<ProductId, ProductSnapshot> {
    (0..size)
        .map(|i| {
            let snapshot = ProductSnapshot::new(
                format!("SKU-{i:05}"),
                format!("Product {i}"),
                Money::from_minor(1_000 + i as i64),
            );
            (snapshot.product_id.clone(), snapshot)
        })
        .collect()
}

fn bench_price_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("domain/price_order");

    for lines in [1usize, 10, 100] {
        let catalog = make_catalog(lines);
        let requested: Vec<RequestedLine> = (0..lines)
            .map(|i| RequestedLine::new(format!("SKU-{i:05}"), 2))
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(lines), &requested, |b, req| {
            b.iter(|| price_order(req, &catalog).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_price_order);
criterion_main!(benches);
