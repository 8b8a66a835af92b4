use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::NaiveDate;
use std::sync::Arc;
use stockdate_core::ProductId;
use stockdate_infra::catalog::{InMemoryProductCatalog, ProductCatalog};
use stockdate_infra::directives::DirectiveRepository;
use stockdate_infra::meta_store::InMemoryMetaStore;
use stockdate_infra::reconciler::{FixedClock, StockReconciler};
use stockdate_products::{Product, StockDirective, StockStatus, TargetDate};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

/// Catalog where every fourth product is due; the rest are split between
/// future dates, disabled directives and no directive at all.
fn setup_catalog(
    size: usize,
) -> (Arc<InMemoryProductCatalog>, Arc<InMemoryMetaStore>) {
    let catalog = Arc::new(InMemoryProductCatalog::new());
    let meta = Arc::new(InMemoryMetaStore::new());
    let directives = DirectiveRepository::new(meta.clone());

    for i in 0..size {
        let id = ProductId::new();
        catalog
            .save(&Product::restore(
                id,
                format!("SKU-{i}"),
                format!("Product {i}"),
                StockStatus::InStock,
                1,
            ))
            .unwrap();

        let directive = match i % 4 {
            0 => Some(StockDirective::new(TargetDate::new("2024-05-31"), true)),
            1 => Some(StockDirective::new(TargetDate::new("2099-01-01"), true)),
            2 => Some(StockDirective::new(TargetDate::new("2024-01-01"), false)),
            _ => None,
        };
        if let Some(d) = directive {
            directives.write(id, &d).unwrap();
        }
    }

    (catalog, meta)
}

fn bench_sweep_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep_throughput");

    for size in [100usize, 1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter_batched(
                || {
                    let (catalog, meta) = setup_catalog(size);
                    StockReconciler::new(
                        catalog,
                        DirectiveRepository::new(meta),
                        FixedClock::new(today()),
                    )
                },
                |reconciler| black_box(reconciler.sweep().unwrap()),
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_idle_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("idle_sweep");

    // Second and later sweeps find nothing new to mark.
    let (catalog, meta) = setup_catalog(1_000);
    let reconciler = StockReconciler::new(
        catalog,
        DirectiveRepository::new(meta),
        FixedClock::new(today()),
    );
    reconciler.sweep().unwrap();

    group.bench_function("already_reconciled_1000", |b| {
        b.iter(|| black_box(reconciler.sweep().unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_sweep_throughput, bench_idle_sweep);
criterion_main!(benches);
