use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use nek_coupler::algs::communicator::{Communicator, ThreadComm};
use nek_coupler::algs::field_gather::{gather_global_order, gather_rank_major};
use nek_coupler::algs::layout::PartitionLayout;

const RANKS: usize = 4;

/// Spawn a fresh thread group; every rank builds its layout and local
/// values, then runs `f`.
fn run_group<F>(n_local: usize, f: F)
where
    F: Fn(&ThreadComm, &PartitionLayout, &[f64], &[usize]) + Sync,
{
    std::thread::scope(|s| {
        for comm in ThreadComm::group(RANKS) {
            let f = &f;
            s.spawn(move || {
                let layout = PartitionLayout::all_gather(&comm, n_local);
                let range = layout.range(comm.rank());
                let values: Vec<f64> = range.clone().map(|k| k as f64).collect();
                // reversed global numbering
                let ids: Vec<usize> = range.map(|k| layout.total() - k).collect();
                f(&comm, &layout, &values, &ids);
            });
        }
    });
}

fn bench_gather(c: &mut Criterion) {
    let mut group = c.benchmark_group("field-gather");

    for &n_local in &[1_000usize, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::new("rank-major", n_local), &n_local, |b, &n| {
            b.iter(|| {
                run_group(n, |comm, layout, values, _| {
                    let _ = gather_rank_major(comm, layout, values);
                })
            });
        });
        group.bench_with_input(BenchmarkId::new("global", n_local), &n_local, |b, &n| {
            b.iter(|| {
                run_group(n, |comm, layout, values, ids| {
                    let _ = gather_global_order(comm, layout, values, ids).unwrap();
                })
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_gather);
criterion_main!(benches);
