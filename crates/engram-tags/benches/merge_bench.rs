use criterion::{black_box, criterion_group, criterion_main, Criterion};

use engram_core::config::MergeConfig;
use engram_tags::analyzer::normalize_for_embedding;
use engram_tags::can_merge;

fn bench_can_merge(c: &mut Criterion) {
    let cfg = MergeConfig::default();
    let pairs = [
        ("api v 1", "api v 2"),
        ("type:refactor", "type:bug"),
        ("authentication", "authentication flow"),
        ("port 8080", "port 9090"),
        ("binary search", "binary search tree"),
    ];

    c.bench_function("can_merge_guard_chain", |b| {
        b.iter(|| {
            for (a, t) in &pairs {
                black_box(can_merge(black_box(a), black_box(t), 0.9, &cfg));
            }
        })
    });

    c.bench_function("normalize_for_embedding", |b| {
        b.iter(|| black_box(normalize_for_embedding(black_box("API__Gateway--version-2"))))
    });
}

criterion_group!(benches, bench_can_merge);
criterion_main!(benches);
