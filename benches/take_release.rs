use criterion::{black_box, criterion_group, criterion_main, Criterion};
use esox_resourcepool::{ResourcePool, Slot};

fn take_release(c: &mut Criterion) {
    let pool = ResourcePool::<Vec<u8>>::new(16).unwrap();

    c.bench_function("try_take_release", |b| {
        b.iter(|| {
            let slot = pool.try_take().unwrap();
            black_box(Slot::id(&slot));
        })
    });

    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    c.bench_function("take_release_async", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let slot = pool.take().await.unwrap();
                black_box(slot.len());
            })
        })
    });
}

criterion_group!(benches, take_release);
criterion_main!(benches);
