//! Throughput Benchmark for TTLKV
//!
//! This benchmark measures the performance of the expiration engine and the
//! storage engine under various workloads.

use chrono::{Duration as TimeDelta, Utc};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use ttlkv::expiry::ExpirationEngine;
use ttlkv::storage::{EntryStore, StorageEngine};

fn new_engine() -> (Arc<ExpirationEngine>, Arc<StorageEngine>) {
    let store = Arc::new(StorageEngine::new());
    let engine = Arc::new(ExpirationEngine::new(store.clone()));
    (engine, store)
}

/// Benchmark PUT operations
fn bench_put(c: &mut Criterion) {
    let (engine, _) = new_engine();

    let mut group = c.benchmark_group("put");
    group.throughput(Throughput::Elements(1));

    group.bench_function("put_small", |b| {
        let mut i = 0u64;
        b.iter(|| {
            engine
                .put(&format!("key:{}", i), json!({"n": i}), None)
                .unwrap();
            i += 1;
        });
    });

    group.bench_function("put_with_ttl", |b| {
        let mut i = 0u64;
        b.iter(|| {
            engine
                .put(&format!("ttl:{}", i), json!({"n": i}), Some(3600))
                .unwrap();
            i += 1;
        });
    });

    group.bench_function("put_large", |b| {
        let mut i = 0u64;
        let value = json!({"blob": "x".repeat(64 * 1024)}); // 64KB value
        b.iter(|| {
            engine
                .put(&format!("large:{}", i), value.clone(), None)
                .unwrap();
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark GET operations
fn bench_get(c: &mut Criterion) {
    let (engine, _) = new_engine();

    // Pre-populate with data
    for i in 0..100_000 {
        engine
            .put(&format!("key:{}", i), json!({"value": i}), Some(3600))
            .unwrap();
    }

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(engine.get(&format!("key:{}", i % 100_000)).unwrap());
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(engine.get(&format!("missing:{}", i)).unwrap());
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark mixed workload (80% reads, 20% writes)
fn bench_mixed(c: &mut Criterion) {
    let (engine, _) = new_engine();

    // Pre-populate
    for i in 0..10_000 {
        engine.put(&format!("key:{}", i), json!(i), None).unwrap();
    }

    let mut group = c.benchmark_group("mixed");
    group.throughput(Throughput::Elements(1));

    group.bench_function("80_read_20_write", |b| {
        let mut i = 0u64;
        b.iter(|| {
            if i % 5 == 0 {
                // 20% writes
                engine.put(&format!("new:{}", i), json!("value"), Some(60)).unwrap();
            } else {
                // 80% reads
                black_box(engine.get(&format!("key:{}", i % 10_000)).unwrap());
            }
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark concurrent access
fn bench_concurrent(c: &mut Criterion) {
    use std::thread;

    let mut group = c.benchmark_group("concurrent");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("4_threads_mixed", |b| {
        b.iter(|| {
            let (engine, store) = new_engine();
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let engine = Arc::clone(&engine);
                    thread::spawn(move || {
                        for i in 0..10_000 {
                            let key = format!("key:{}:{}", t, i);
                            engine.put(&key, json!("value"), Some(60)).unwrap();
                            engine.get(&key).unwrap();
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            black_box(store.len().unwrap());
        });
    });

    group.finish();
}

/// Benchmark expiry: lazy removal on read and bulk sweeps
fn bench_expiry(c: &mut Criterion) {
    let mut group = c.benchmark_group("expiry");

    group.bench_function("lazy_expire_on_get", |b| {
        let (engine, store) = new_engine();
        let past = Some(Utc::now() - TimeDelta::seconds(1));
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("dead:{}", i);
            store.upsert(&key, json!(i), past).unwrap();
            black_box(engine.get(&key).unwrap());
            i += 1;
        });
    });

    // 10k dead entries hidden among 90k live ones
    group.throughput(Throughput::Elements(10_000));
    group.bench_function("sweep_10k_of_100k", |b| {
        b.iter_batched(
            || {
                let (engine, store) = new_engine();
                let past = Some(Utc::now() - TimeDelta::seconds(1));
                let future = Some(Utc::now() + TimeDelta::hours(1));
                for i in 0..100_000 {
                    let expires_at = if i % 10 == 0 { past } else { future };
                    store.upsert(&format!("key:{}", i), json!(i), expires_at).unwrap();
                }
                engine
            },
            |engine| black_box(engine.sweep().unwrap()),
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_put,
    bench_get,
    bench_mixed,
    bench_concurrent,
    bench_expiry,
);

criterion_main!(benches);
