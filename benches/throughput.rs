use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use sampler_core::ring::Ring;
use sampler_core::runtime::testing::{FakeRuntime, FakeUnwinder};
use sampler_core::sample::Sample;

const ITEMS: u64 = 1_000_000;

fn bench_ring_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring");
    group.throughput(Throughput::Elements(ITEMS));

    group.bench_function("reserve_commit_pop", |b| {
        let ring = Ring::new(4096, 8, 8);
        let runtime = FakeRuntime::with_stack(vec![("f", "a.rb", 1)]);
        let unwinder = FakeUnwinder::with_pcs(vec![]);
        let mut out = Sample::new(8, 8);

        b.iter(|| {
            for i in 0..ITEMS {
                if let Some(mut r) = ring.reserve() {
                    r.sample_mut().capture(i, &runtime, &unwinder, i);
                    r.commit();
                }
                ring.pop(&mut out);
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_ring_round_trip);
criterion_main!(benches);
