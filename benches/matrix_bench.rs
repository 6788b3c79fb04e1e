use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use ferrite::runtime::{
    matrix::{Matrix, MatrixComplex, MatrixReal},
    rng::{PerThreadRng, RngSeed, RngType, random_matrix::uniform_matrix},
    scalar::Complex,
};

fn bench_real_product(c: &mut Criterion) {
    let mut group = c.benchmark_group("matrix/multiply_real");
    let mut rng = PerThreadRng::for_thread(RngType::Xoshiro256PlusPlus, &RngSeed::from_u64(1), 0);

    for &side in &[16usize, 64, 128] {
        let a: MatrixReal = uniform_matrix(&mut rng, side, side);
        let b: MatrixReal = uniform_matrix(&mut rng, side, side);
        group.throughput(Throughput::Elements((side * side * side) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(side), &side, |bench, _| {
            bench.iter(|| black_box(a.multiply(&b)));
        });
    }

    group.finish();
}

fn bench_complex_product(c: &mut Criterion) {
    let mut group = c.benchmark_group("matrix/multiply_complex");

    for &side in &[16usize, 64] {
        let a: MatrixComplex =
            Matrix::from_fn(side, side, |r, c| Complex::new(r as f64, c as f64 * 0.5));
        let b = a.adjoint();
        group.throughput(Throughput::Elements((side * side * side) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(side), &side, |bench, _| {
            bench.iter(|| black_box(a.multiply(&b)));
        });
    }

    group.finish();
}

fn bench_power(c: &mut Criterion) {
    let q: Matrix<i64> = Matrix::from_rows(&[&[1, 1], &[1, 0]]).unwrap();
    c.bench_function("matrix/power_fibonacci_90", |bench| {
        bench.iter(|| black_box(q.power(black_box(90))));
    });
}

criterion_group!(benches, bench_real_product, bench_complex_product, bench_power);
criterion_main!(benches);
