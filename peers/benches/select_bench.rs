use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use avalanche_peers::{PeerManager, RngSlotSource};

fn make_peers(n: usize) -> PeerManager {
    let mut pm = PeerManager::new();
    for i in 0..n {
        pm.add_peer(100 + (i as u64 % 37) * 10);
    }
    pm
}

fn bench_select_peer(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_peer");

    for peer_count in [10, 100, 1_000, 10_000] {
        let pm = make_peers(peer_count);
        let mut source = RngSlotSource(SmallRng::seed_from_u64(42));

        group.bench_with_input(
            BenchmarkId::new("contiguous", peer_count),
            &peer_count,
            |b, _| b.iter(|| black_box(pm.select_peer(&mut source))),
        );
    }

    for peer_count in [100, 1_000, 10_000] {
        let mut pm = make_peers(peer_count);
        for i in (0..peer_count).step_by(4) {
            pm.remove_peer(i);
        }
        let mut source = RngSlotSource(SmallRng::seed_from_u64(42));

        group.bench_with_input(
            BenchmarkId::new("fragmented", peer_count),
            &peer_count,
            |b, _| b.iter(|| black_box(pm.select_peer(&mut source))),
        );
    }

    group.finish();
}

fn bench_rescore_peer(c: &mut Criterion) {
    let mut group = c.benchmark_group("rescore_peer");

    for peer_count in [100, 1_000, 10_000] {
        group.bench_with_input(
            BenchmarkId::new("grow_first", peer_count),
            &peer_count,
            |b, &n| {
                b.iter_batched(
                    || make_peers(n),
                    |mut pm| {
                        pm.rescore_peer(0, black_box(10_000));
                        pm
                    },
                    criterion::BatchSize::LargeInput,
                )
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_select_peer, bench_rescore_peer);
criterion_main!(benches);
