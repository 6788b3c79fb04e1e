use ferrite::runtime::rng::{
    PerThreadRng, RngSeed, RngType, Sampling,
    random_matrix::normal_matrix,
};

const ALL_TYPES: [RngType; 4] = [
    RngType::Mt19937,
    RngType::Mt216091,
    RngType::Xoshiro256StarStar,
    RngType::Xoshiro256PlusPlus,
];

/// Complementary error function with fractional error below 1.2e-7.
fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87 + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let ans = t * poly.exp();
    if x >= 0.0 { ans } else { 2.0 - ans }
}

/// Probability that a standard normal deviate lies in `[a, b)`.
fn normal_mass(a: f64, b: f64) -> f64 {
    let s = std::f64::consts::SQRT_2;
    if a >= 0.0 {
        0.5 * (erfc(a / s) - erfc(b / s))
    } else {
        0.5 * (erfc(-b / s) - erfc(-a / s))
    }
}

#[test]
fn normal_histogram_matches_the_gaussian() {
    const SAMPLES: usize = 1_000_000;
    const BINS: usize = 100;
    let (mean, sigma) = (0.5, 1.5);
    let (low, high) = (mean - 4.0 * sigma, mean + 4.0 * sigma);
    let width = (high - low) / BINS as f64;

    let mut rng = PerThreadRng::for_thread(RngType::Mt19937, &RngSeed::from_u64(2024), 0);
    let mut counts = [0u64; BINS];
    for _ in 0..SAMPLES {
        let x = rng.random_normal(mean, sigma).unwrap();
        if (low..high).contains(&x) {
            let bin = (((x - low) / width) as usize).min(BINS - 1);
            counts[bin] += 1;
        }
    }

    let errors: Vec<f64> = counts
        .iter()
        .enumerate()
        .map(|(bin, &count)| {
            let a = (low + bin as f64 * width - mean) / sigma;
            let b = (low + (bin + 1) as f64 * width - mean) / sigma;
            let expected = normal_mass(a, b) * SAMPLES as f64;
            (count as f64 - expected) / expected
        })
        .collect();
    let average = errors.iter().sum::<f64>() / BINS as f64;
    let spread =
        (errors.iter().map(|e| (e - average).powi(2)).sum::<f64>() / BINS as f64).sqrt();

    assert!(average.abs() < 0.02, "mean relative error {average}");
    assert!(spread < 0.2, "relative error deviation {spread}");
}

#[test]
fn every_generator_is_uniform_on_the_unit_interval() {
    for rng_type in ALL_TYPES {
        let mut rng = PerThreadRng::for_thread(rng_type, &RngSeed::from_u64(11), 0);
        let mut sum = 0.0;
        let mut quarters = [0usize; 4];
        for _ in 0..100_000 {
            let u = rng.random_inclusive_exclusive();
            assert!((0.0..1.0).contains(&u));
            sum += u;
            quarters[(u * 4.0) as usize] += 1;
        }
        let mean = sum / 100_000.0;
        assert!((mean - 0.5).abs() < 0.01, "{rng_type}: mean {mean}");
        for count in quarters {
            assert!((24_000..26_000).contains(&count), "{rng_type}: {quarters:?}");
        }
    }
}

#[test]
fn streams_depend_on_seed_and_thread() {
    for rng_type in ALL_TYPES {
        let draw = |seed: u64, thread_id: u32| {
            let mut rng = PerThreadRng::for_thread(rng_type, &RngSeed::from_u64(seed), thread_id);
            (0..8).map(|_| rng.random_integer()).collect::<Vec<_>>()
        };
        assert_eq!(draw(1, 0), draw(1, 0));
        assert_ne!(draw(1, 0), draw(1, 1));
        assert_ne!(draw(1, 0), draw(2, 0));
    }
}

#[test]
fn matrices_consume_the_scalar_stream_in_column_major_order() {
    let seed = RngSeed::new([5, 6, 7, 8]);
    let mut by_matrix = PerThreadRng::for_thread(RngType::Xoshiro256PlusPlus, &seed, 3);
    let mut by_scalar = by_matrix.clone();

    let m = normal_matrix(&mut by_matrix, 3, 2, 1.0, 2.0).unwrap();
    for column in 0..2 {
        for row in 0..3 {
            assert_eq!(m.get(row, column), by_scalar.random_normal(1.0, 2.0).unwrap());
        }
    }
    assert_eq!(by_matrix.random_integer(), by_scalar.random_integer());
}
