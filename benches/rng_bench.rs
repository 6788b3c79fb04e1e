use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use ferrite::runtime::rng::{PerThreadRng, RngSeed, RngType, Sampling};

const DRAWS: u64 = 10_000;

const TYPES: [RngType; 4] = [
    RngType::Mt19937,
    RngType::Mt216091,
    RngType::Xoshiro256StarStar,
    RngType::Xoshiro256PlusPlus,
];

fn bench_raw_words(c: &mut Criterion) {
    let mut group = c.benchmark_group("rng/integer");
    group.throughput(Throughput::Elements(DRAWS));

    for rng_type in TYPES {
        let mut rng = PerThreadRng::for_thread(rng_type, &RngSeed::from_u64(7), 0);
        group.bench_function(BenchmarkId::from_parameter(rng_type), |b| {
            b.iter(|| {
                for _ in 0..DRAWS {
                    black_box(rng.random_integer());
                }
            });
        });
    }

    group.finish();
}

fn bench_distributions(c: &mut Criterion) {
    let mut group = c.benchmark_group("rng/distribution");
    group.throughput(Throughput::Elements(DRAWS));
    let mut rng = PerThreadRng::for_thread(RngType::Mt19937, &RngSeed::from_u64(7), 0);

    group.bench_function("normal", |b| {
        b.iter(|| {
            for _ in 0..DRAWS {
                black_box(rng.random_normal(0.0, 1.0).ok());
            }
        });
    });
    group.bench_function("gamma", |b| {
        b.iter(|| {
            for _ in 0..DRAWS {
                black_box(rng.random_gamma(2.5, 1.0).ok());
            }
        });
    });
    group.bench_function("poisson_large", |b| {
        b.iter(|| {
            for _ in 0..DRAWS {
                black_box(rng.random_poisson(120.0).ok());
            }
        });
    });

    group.finish();
}

fn bench_seeding(c: &mut Criterion) {
    let seed = RngSeed::new([1, 2, 3, 4]);
    c.bench_function("rng/seed_mt216091", |b| {
        b.iter(|| black_box(PerThreadRng::for_thread(RngType::Mt216091, &seed, black_box(5))));
    });
}

criterion_group!(benches, bench_raw_words, bench_distributions, bench_seeding);
criterion_main!(benches);
