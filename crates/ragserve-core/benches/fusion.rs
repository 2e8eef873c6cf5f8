//! Retrieval benchmarks
//!
//! Measures:
//! - Reciprocal Rank Fusion over candidate lists of growing size
//! - Keyword and vector search over a seeded collection

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ragserve_core::db::{Database, NewPassage, WritePolicy};
use ragserve_core::retrieval::{dedupe_by_source, rrf_fusion};
use ragserve_core::{HybridConfig, RetrievedPassage};

const TOPICS: &[&str] = &[
    "ownership moves values between bindings",
    "borrowing creates references without ownership",
    "lifetimes bound how long references live",
    "futures are polled by an async executor",
    "traits describe shared behaviour",
    "macros generate code at compile time",
];

fn candidates(n: usize, offset: usize) -> Vec<RetrievedPassage> {
    (0..n)
        .map(|i| RetrievedPassage {
            source: format!("doc-{}", (i * 7 + offset) % (n * 2)),
            title: String::new(),
            text: TOPICS[i % TOPICS.len()].to_string(),
            score: 1.0 / (i + 1) as f64,
        })
        .collect()
}

fn bench_fusion(c: &mut Criterion) {
    let mut group = c.benchmark_group("rrf_fusion");
    let config = HybridConfig::default();

    for size in [10, 100, 1000] {
        let vector = dedupe_by_source(candidates(size, 0));
        let keyword = dedupe_by_source(candidates(size, 3));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| rrf_fusion(black_box(&vector), black_box(&keyword), &config))
        });
    }

    group.finish();
}

fn setup_db(passages: usize) -> Database {
    let db = Database::open_in_memory().unwrap();
    db.initialize().unwrap();
    db.create_collection("bench", "bench", 8).unwrap();

    let rows: Vec<(NewPassage, Vec<f32>)> = (0..passages)
        .map(|i| {
            let embedding = (0..8).map(|d| ((i + d) % 5) as f32 + 0.1).collect();
            (
                NewPassage {
                    source: format!("doc-{}#0", i),
                    title: format!("Doc {}", i),
                    body: format!("{} (variant {})", TOPICS[i % TOPICS.len()], i),
                },
                embedding,
            )
        })
        .collect();
    db.write_passages("bench", &rows, WritePolicy::Overwrite)
        .unwrap();
    db
}

fn bench_search(c: &mut Criterion) {
    let db = setup_db(2000);
    let query = vec![1.0f32, 0.5, 0.2, 0.1, 0.0, 0.3, 0.7, 0.9];

    c.bench_function("keyword_search", |b| {
        b.iter(|| {
            db.search_keywords("bench", black_box("async executor futures"), 15)
                .unwrap()
        })
    });

    c.bench_function("vector_search", |b| {
        b.iter(|| db.search_vectors("bench", black_box(&query), 15).unwrap())
    });
}

criterion_group!(benches, bench_fusion, bench_search);
criterion_main!(benches);
