//! Store backend benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use docstate_bench::random_body;
use docstate_core::content_hash;
use docstate_store::{FileStore, InMemoryStore, KeyValueStore};
use std::time::Duration;
use tempfile::TempDir;

/// Benchmark sorted-set insert with trim against each backend.
fn bench_zadd_trim(c: &mut Criterion) {
    let mut group = c.benchmark_group("zadd_trim");

    let memory = InMemoryStore::new();
    let dir = TempDir::new().unwrap();
    let file = FileStore::open(&dir.path().join("bench.json")).unwrap();
    let backends: [(&str, &dyn KeyValueStore); 2] = [("memory", &memory), ("file", &file)];

    for (name, store) in backends {
        group.bench_function(name, |b| {
            let mut i = 0u64;
            b.iter(|| {
                i += 1;
                store
                    .zadd("bench", &format!("member-{}", i % 200), i as f64)
                    .unwrap();
                store.zremrangebyrank("bench", 0, -51).unwrap();
            });
        });
    }
    group.finish();
}

/// Benchmark reading the top of a 50-member set.
fn bench_zrevrange(c: &mut Criterion) {
    let store = InMemoryStore::new();
    for i in 0..50 {
        store.zadd("bench", &format!("member-{i}"), f64::from(i)).unwrap();
    }

    c.bench_function("zrevrange_top10", |b| {
        b.iter(|| black_box(store.zrevrange_with_scores("bench", 0, 9).unwrap()));
    });
}

/// Benchmark expiring string writes and reads.
fn bench_set_get(c: &mut Criterion) {
    let store = InMemoryStore::new();
    let ttl = Duration::from_secs(7200);

    c.bench_function("set_ex", |b| {
        b.iter(|| store.set_ex(black_box("token"), black_box("a@example.com"), ttl).unwrap());
    });
    store.set_ex("token", "a@example.com", ttl).unwrap();
    c.bench_function("get", |b| {
        b.iter(|| black_box(store.get(black_box("token")).unwrap()));
    });
}

/// Benchmark content hashing across body sizes.
fn bench_content_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("content_hash");

    for size in [256usize, 4096, 65536].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let body = random_body(size);
            b.iter(|| black_box(content_hash(black_box(&body))));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_zadd_trim,
    bench_zrevrange,
    bench_set_get,
    bench_content_hash,
);
criterion_main!(benches);
