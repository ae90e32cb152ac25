//! Performance benchmarks for the document store.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use classroom_store::{CollectionName, Constraint, DocumentStore, Operator, StoreConfig};
use serde_json::json;

fn create_store() -> DocumentStore {
    DocumentStore::new(StoreConfig {
        validate_documents: false,
        ..Default::default()
    })
}

fn fill(store: &DocumentStore, count: usize) {
    for i in 0..count {
        let doc = json!({
            "title": format!("course {}", i),
            "instructorId": format!("i{}", i % 10),
            "rank": i,
        })
        .as_object()
        .unwrap()
        .clone();
        store.add(CollectionName::Courses, doc).unwrap();
    }
}

/// Benchmark constrained query scans at varying collection sizes.
fn bench_query_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_scan");

    for size in [100, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("collection_size", size), &size, |b, &size| {
            let store = create_store();
            fill(&store, size);

            let constraints = [Constraint::new("instructorId", Operator::Eq, "i3")];
            b.iter(|| {
                black_box(store.query(CollectionName::Courses, &constraints));
            });
        });
    }

    group.finish();
}

/// Benchmark mutation cost as registered subscriptions accumulate.
/// Each mutation re-runs every registered query (rebroadcast model).
fn bench_mutation_with_subscribers(c: &mut Criterion) {
    let mut group = c.benchmark_group("mutation_with_subscribers");

    for subscribers in [0, 10, 100] {
        group.bench_with_input(
            BenchmarkId::new("subscribers", subscribers),
            &subscribers,
            |b, &subscribers| {
                let store = create_store();
                fill(&store, 1_000);

                let _subs: Vec<_> = (0..subscribers)
                    .map(|i| {
                        // Distinct constraints so every entry re-evaluates.
                        let constraints =
                            [Constraint::new("instructorId", Operator::Eq, format!("i{}", i))];
                        store.subscribe(CollectionName::Courses, &constraints, |docs| {
                            black_box(docs.len());
                        })
                    })
                    .collect();

                let doc = json!({"title": "bench", "instructorId": "i3"})
                    .as_object()
                    .unwrap()
                    .clone();
                b.iter(|| {
                    let id = store.add(CollectionName::Courses, doc.clone()).unwrap();
                    store.remove(CollectionName::Courses, &id).unwrap();
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_query_scan, bench_mutation_with_subscribers);
criterion_main!(benches);
