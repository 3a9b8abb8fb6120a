use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::any::Any;
use std::rc::Rc;
use std::time::Duration;
use weak_ordered_map::{Capabilities, Key, OrderedMap};

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn filled(n: usize, seed: u64) -> (OrderedMap<u64>, Vec<String>) {
    let mut m = OrderedMap::with_capabilities(Capabilities::MAP);
    let keys: Vec<String> = lcg(seed).take(n).map(key).collect();
    for (i, k) in keys.iter().enumerate() {
        m.set(k.as_str(), i as u64).unwrap();
    }
    (m, keys)
}

fn bench_set_fresh_10k(c: &mut Criterion) {
    c.bench_function("ordered::set_fresh_10k", |b| {
        b.iter_batched(
            || lcg(1).take(10_000).map(key).collect::<Vec<_>>(),
            |keys| {
                let mut m: OrderedMap<u64> = OrderedMap::with_capabilities(Capabilities::MAP);
                for (i, k) in keys.into_iter().enumerate() {
                    m.set(k, i as u64).unwrap();
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit_10k(c: &mut Criterion) {
    c.bench_function("ordered::get_hit_10k", |b| {
        let (m, keys) = filled(10_000, 7);
        b.iter(|| {
            let mut sum = 0u64;
            for k in &keys {
                if let Ok(Some(v)) = m.get(k.as_str()) {
                    sum = sum.wrapping_add(*v);
                }
            }
            black_box(sum)
        })
    });
}

fn bench_object_keys_1k(c: &mut Criterion) {
    c.bench_function("ordered::object_set_get_1k", |b| {
        let objects: Vec<Rc<dyn Any>> = (0..1_000u64).map(|i| Rc::new(i) as Rc<dyn Any>).collect();
        b.iter(|| {
            let mut m: OrderedMap<usize> = OrderedMap::with_capabilities(Capabilities::MAP);
            for (i, o) in objects.iter().enumerate() {
                m.set(Key::Object(o.clone()), i).unwrap();
            }
            let hits = objects
                .iter()
                .filter(|o| matches!(m.get(Key::Object(Rc::clone(o))), Ok(Some(_))))
                .count();
            black_box(hits)
        })
    });
}

fn bench_remove_renumber_list_1k(c: &mut Criterion) {
    c.bench_function("ordered::list_shift_renumber_1k", |b| {
        b.iter_batched(
            || (0..1_000u64).collect::<OrderedMap<u64>>(),
            |mut m| {
                for _ in 0..100 {
                    let _ = m.shift();
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_walk_10k(c: &mut Criterion) {
    c.bench_function("ordered::cursor_walk_10k", |b| {
        let (mut m, _) = filled(10_000, 11);
        b.iter(|| {
            let mut sum = 0u64;
            m.rewind();
            while let Some(v) = m.current() {
                sum = sum.wrapping_add(*v);
                m.next();
            }
            black_box(sum)
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
    name = benches;
    config = bench_config();
    targets = bench_set_fresh_10k,
              bench_get_hit_10k,
              bench_object_keys_1k,
              bench_remove_renumber_list_1k,
              bench_walk_10k
}
criterion_main!(benches);
