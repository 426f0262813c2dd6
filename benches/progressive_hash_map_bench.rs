use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use progressive_hashmap::{ProgressiveHashMap, MIGRATION_STEPS};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn filled(seed: u64, n: usize) -> (ProgressiveHashMap<String, u64>, Vec<String>) {
    let mut m = ProgressiveHashMap::new();
    let keys: Vec<String> = lcg(seed).take(n).map(key).collect();
    for (i, k) in keys.iter().enumerate() {
        let _ = m.insert(k.clone(), i as u64).unwrap();
    }
    (m, keys)
}

fn bench_insert_fresh_100k(c: &mut Criterion) {
    c.bench_function("progressive::insert_fresh_100k", |b| {
        b.iter_batched(
            ProgressiveHashMap::<String, u64>::new,
            |mut m| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    let _ = m.insert(key(x), i as u64).unwrap();
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_warm_100k(c: &mut Criterion) {
    c.bench_function("progressive::insert_warm_100k", |b| {
        b.iter_batched(
            || {
                // Pre-grow and then empty by removing
                let (mut m, keys) = filled(2, 110_000);
                for k in &keys {
                    let _ = m.remove(k);
                }
                m
            },
            |mut m| {
                for (i, x) in lcg(3).take(100_000).enumerate() {
                    let _ = m.insert(key(x), i as u64).unwrap();
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

// The inserts that carry a migration of a large table: each moves one
// eighth of it, so this is the per-insert worst case.
fn bench_insert_through_migration(c: &mut Criterion) {
    c.bench_function("progressive::insert_through_migration_of_131k", |b| {
        b.iter_batched(
            || {
                let mut m: ProgressiveHashMap<u64, u64> =
                    ProgressiveHashMap::with_capacity(1 << 17);
                let mut k = 0;
                while !m.is_migrating() {
                    let _ = m.insert(k, k).unwrap();
                    k += 1;
                }
                (m, k)
            },
            |(mut m, k)| {
                for i in 0..MIGRATION_STEPS as u64 {
                    let _ = m.insert(k + i, i).unwrap();
                }
                black_box(m)
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_remove_random_10k(c: &mut Criterion) {
    c.bench_function("progressive::remove_random_10k_of_110k", |b| {
        b.iter_batched(
            || {
                let (m, keys) = filled(5, 110_000);
                // Precompute 10k unique indices via LCG
                let n = keys.len();
                let mut sel = std::collections::HashSet::with_capacity(10_000);
                let mut s = 0x9e3779b97f4a7c15u64;
                while sel.len() < 10_000 {
                    s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
                    sel.insert((s as usize) % n);
                }
                let to_remove: Vec<String> = sel.into_iter().map(|i| keys[i].clone()).collect();
                (m, to_remove)
            },
            |(mut m, to_remove)| {
                for k in &to_remove {
                    black_box(m.remove(k));
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit_10k(c: &mut Criterion) {
    c.bench_function("progressive::get_hit_10k_on_100k", |b| {
        let (m, keys) = filled(7, 100_000);
        // Precompute 10k random query keys using LCG
        let n = keys.len();
        let mut s = 0x9e3779b97f4a7c15u64;
        let queries: Vec<String> = (0..10_000)
            .map(|_| {
                s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
                keys[(s as usize) % n].clone()
            })
            .collect();
        b.iter(|| {
            for k in &queries {
                black_box(m.get(k));
            }
        })
    });
}

fn bench_get_miss_10k(c: &mut Criterion) {
    c.bench_function("progressive::get_miss_10k_on_100k", |b| {
        let (m, _) = filled(11, 100_000);
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            for _ in 0..10_000 {
                let k = key(miss.next().unwrap());
                black_box(m.get(&k));
            }
        })
    });
}

// Lookups while a migration is suspended halfway, so both tables are probed.
fn bench_get_mid_migration_10k(c: &mut Criterion) {
    c.bench_function("progressive::get_mid_migration_10k", |b| {
        let mut m: ProgressiveHashMap<u64, u64> = ProgressiveHashMap::with_capacity(1 << 16);
        let mut k = 0;
        while !m.is_migrating() {
            let _ = m.insert(k, k).unwrap();
            k += 1;
        }
        for i in 0..(MIGRATION_STEPS / 2) as u64 {
            let _ = m.insert(k + i, i).unwrap();
        }
        let total = k;
        let mut q = lcg(17);
        b.iter(|| {
            for _ in 0..10_000 {
                let key = q.next().unwrap() % total;
                black_box(m.get(&key));
            }
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_insert;
    config = bench_config();
    targets = bench_insert_fresh_100k,
              bench_insert_warm_100k,
              bench_insert_through_migration
}
criterion_group! {
    name = benches_ops;
    config = bench_config();
    targets = bench_remove_random_10k,
              bench_get_hit_10k,
              bench_get_miss_10k,
              bench_get_mid_migration_10k
}
criterion_main!(benches_insert, benches_ops);
