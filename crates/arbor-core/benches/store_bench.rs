//! Criterion benchmarks for the slot store and the threaded tree.
//!
//! Three benchmark groups:
//! - `flat_churn`: insert/erase/refill against `slotmap::SlotMap` as baseline
//! - `recycle_policy`: free-list vs linear-scan recycling on a fragmented store
//! - `tree`: building and walking a bushy tree

use arbor_core::config::{RecyclePolicy, StoreConfig};
use arbor_core::id::Handle;
use arbor_core::store::SlotStore;
use arbor_core::test_utils::*;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use slotmap::{DefaultKey, SlotMap};

const CHURN: u32 = 10_000;

fn bench_flat_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat_churn");

    group.bench_function("slot_store", |b| {
        b.iter(|| {
            let (mut store, handles) = flat_store(CHURN);
            let doomed: Vec<Handle> = handles.iter().copied().step_by(2).collect();
            store.erase(&doomed).unwrap();
            for i in 0..doomed.len() as u32 {
                store.insert_occupied(i).unwrap();
            }
            black_box(store.count())
        })
    });

    group.bench_function("slotmap_baseline", |b| {
        b.iter(|| {
            let mut map: SlotMap<DefaultKey, u32> = SlotMap::new();
            let keys: Vec<DefaultKey> = (0..CHURN).map(|i| map.insert(i * 10)).collect();
            for &key in keys.iter().step_by(2) {
                map.remove(key);
            }
            for i in 0..CHURN / 2 {
                map.insert(i);
            }
            black_box(map.len())
        })
    });

    group.finish();
}

fn fragmented(policy: RecyclePolicy) -> SlotStore<u32> {
    let mut store = SlotStore::with_config(StoreConfig::with_capacity(CHURN as usize).recycle(policy));
    let handles: Vec<Handle> = (0..CHURN).map(|i| store.insert_occupied(i).unwrap()).collect();
    let tail: Vec<Handle> = handles[(CHURN as usize - 64)..].to_vec();
    store.erase(&tail).unwrap();
    store
}

fn bench_recycle_policy(c: &mut Criterion) {
    let mut group = c.benchmark_group("recycle_policy");

    for (name, policy) in [
        ("free_list", RecyclePolicy::FreeList),
        ("linear_scan", RecyclePolicy::LinearScan),
    ] {
        group.bench_function(name, |b| {
            b.iter_batched(
                || fragmented(policy),
                |mut store| {
                    for i in 0..64 {
                        store.insert_occupied(i).unwrap();
                    }
                    black_box(store.count())
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree");

    group.bench_function("build_depth4_fan8", |b| {
        b.iter(|| black_box(bushy_tree(4, 8).node_count()))
    });

    let tree = bushy_tree(4, 8);
    group.bench_function("descendants_depth4_fan8", |b| {
        b.iter(|| black_box(tree.descendants(tree.root()).unwrap().count()))
    });

    group.bench_function("validate_depth4_fan8", |b| {
        b.iter(|| black_box(tree.validate().len()))
    });

    group.finish();
}

criterion_group!(benches, bench_flat_churn, bench_recycle_policy, bench_tree);
criterion_main!(benches);
