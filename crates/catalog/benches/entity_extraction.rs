//! Benchmarks for entity extraction
//!
//! Run with: cargo bench --package catalog
//!
//! Builds a synthetic catalog so no dataset files are needed.

use catalog::{EntityCatalog, EntityExtractor};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn synthetic_catalog(size: u32) -> EntityCatalog {
    let mut catalog = EntityCatalog::new();
    for id in 0..size {
        catalog.insert_entity(format!("Movie Number {id}"), id);
        catalog.register_item(id);
    }
    // A few forms that actually occur in the benchmark utterance.
    catalog.insert_entity("The Matrix", size);
    catalog.insert_entity("Titanic", size + 1);
    catalog
}

fn bench_extract(c: &mut Criterion) {
    let catalog = synthetic_catalog(10_000);
    let extractor = EntityExtractor::new(&catalog);
    let utterance = "I watched The Matrix last night and liked it more than Titanic, \
                     can you recommend something similar?";

    c.bench_function("extract_10k_vocabulary", |b| {
        b.iter(|| {
            let mentions = extractor.extract(black_box(utterance));
            black_box(mentions)
        })
    });
}

fn bench_extract_all(c: &mut Criterion) {
    let catalog = synthetic_catalog(10_000);
    let extractor = EntityExtractor::new(&catalog);
    let utterances: Vec<String> = (0..8)
        .map(|i| format!("turn {i}: still thinking about Titanic"))
        .collect();

    c.bench_function("extract_all_8_turns", |b| {
        b.iter(|| {
            let mentions = extractor.extract_all(black_box(&utterances));
            black_box(mentions)
        })
    });
}

criterion_group!(benches, bench_extract, bench_extract_all);
criterion_main!(benches);
