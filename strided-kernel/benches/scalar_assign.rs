use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::hint::black_box;
use strided_kernel::{noalias, Layout, StridedArray};

fn random_array(layout: Layout, seed: u64) -> StridedArray<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    StridedArray::from_fn(layout, |_| rng.gen_range(-1.0..1.0))
}

/// `a += b` on a 3D array in row-major, column-major and mixed nestings.
fn bench_compound_assign(c: &mut Criterion) {
    let mut group = c.benchmark_group("compound_assign");
    for size in [16usize, 64, 128] {
        let dims = [size, size, size];
        group.throughput(Throughput::Elements((size * size * size) as u64));

        let layouts = [
            ("row_major", Layout::row_major(&dims)),
            ("col_major", Layout::col_major(&dims)),
            ("central", Layout::permuted(&dims, &[0, 2, 1]).expect("permutation")),
        ];
        for (name, layout) in layouts {
            let mut a = random_array(layout, 1);
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    a += black_box(1.5);
                })
            });
        }
    }
    group.finish();
}

/// `noalias(dest) = a * b` where source and destination disagree on layout.
fn bench_noalias_transposed(c: &mut Criterion) {
    let mut group = c.benchmark_group("noalias_transposed");
    for size in [100usize, 500, 1000] {
        let dims = [size, size];
        group.throughput(Throughput::Elements((size * size) as u64));

        let a = random_array(Layout::row_major(&dims), 2);
        let mut dest = StridedArray::<f64>::col_major(&dims);

        group.bench_with_input(BenchmarkId::new("strided", size), &size, |b, _| {
            b.iter(|| {
                if let Err(err) = noalias(&mut dest).assign(&a * black_box(2.0)) {
                    panic!("assign failed: {err}");
                }
            })
        });

        group.bench_with_input(BenchmarkId::new("naive", size), &size, |b, _| {
            b.iter(|| {
                for i in 0..size {
                    for j in 0..size {
                        dest.set(&[i, j], a.get(&[i, j]) * black_box(2.0));
                    }
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compound_assign, bench_noalias_transposed);
criterion_main!(benches);
