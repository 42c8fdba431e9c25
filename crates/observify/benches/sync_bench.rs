//! Benchmarks for model creation, idempotent re-synchronization and keyed
//! reconciliation.
//!
//! Run with: cargo bench -p observify

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use observify::{SyncOptions, Value, create_reactive_model, reconcile, synchronize};
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn people(count: u64, offset: u64) -> serde_json::Value {
    serde_json::Value::Array(
        (0..count)
            .map(|i| {
                let id = (i + offset) % (count + offset);
                json!({
                    "id": id,
                    "name": format!("person-{id}"),
                    "age": id % 90,
                    "tags": ["a", "b"],
                    "address": { "city": "Springfield", "zip": id * 7 }
                })
            })
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// 1. Building a model from defaults
// ---------------------------------------------------------------------------

fn bench_create(c: &mut Criterion) {
    let mut group = c.benchmark_group("sync/create");
    let options = SyncOptions::new();

    for count in [10, 100, 1_000] {
        group.throughput(Throughput::Elements(count));
        let defaults = Value::from(json!({ "people": people(count, 0) }));
        group.bench_with_input(BenchmarkId::from_parameter(count), &defaults, |b, defaults| {
            b.iter(|| black_box(create_reactive_model(defaults, &options)))
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// 2. Re-synchronizing identical data (no-op path)
// ---------------------------------------------------------------------------

fn bench_resync(c: &mut Criterion) {
    let mut group = c.benchmark_group("sync/resync_identical");
    let options = SyncOptions::new();

    for count in [10, 100, 1_000] {
        group.throughput(Throughput::Elements(count));
        let defaults = Value::from(json!({ "people": people(count, 0) }));
        let Ok(model) = create_reactive_model(&defaults, &options) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::from_parameter(count), &defaults, |b, defaults| {
            b.iter(|| black_box(synchronize(&model, defaults, &options)))
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// 3. Keyed reconciliation of shuffled arrays
// ---------------------------------------------------------------------------

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("sync/reconcile");

    for count in [10, 100, 500] {
        group.throughput(Throughput::Elements(count));
        let existing = Value::from(people(count, 0));
        let incoming = Value::from(people(count, count / 3));
        let (Some(existing), Some(incoming)) = (existing.as_array(), incoming.as_array()) else {
            continue;
        };
        let (existing, incoming) = (existing.to_vec(), incoming.to_vec());
        group.bench_with_input(BenchmarkId::new("id", count), &(), |b, _| {
            b.iter(|| black_box(reconcile(&existing, &incoming, "id")))
        });
    }
    group.finish();
}

fn bench_keyed_sync(c: &mut Criterion) {
    let mut group = c.benchmark_group("sync/keyed_merge");
    let options = SyncOptions::new().with_array_key("people", "id");

    for count in [10, 100, 500] {
        group.throughput(Throughput::Elements(count));
        let Ok(model) =
            create_reactive_model(&Value::from(json!({ "people": people(count, 0) })), &options)
        else {
            continue;
        };
        let incoming = Value::from(json!({ "people": people(count, count / 3) }));
        group.bench_with_input(BenchmarkId::new("id", count), &incoming, |b, incoming| {
            b.iter(|| black_box(synchronize(&model, incoming, &options)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_create,
    bench_resync,
    bench_reconcile,
    bench_keyed_sync,
);
criterion_main!(benches);
