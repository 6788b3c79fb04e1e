//! Uniform and derived distributions on top of any [`RngCore`].
//!
//! Invalid distribution parameters raise `InvalidParameterValue`. With that
//! class disabled, real-valued draws return NaN and integer-valued draws
//! return 0.

use std::f64::consts::PI;

use rand::RngCore;

use crate::runtime::{
    error::{RuntimeError, RuntimeResult},
    policy::raise,
};

const TWO_POW_MINUS_53: f64 = 1.0 / (1u64 << 53) as f64;
const TWO_POW_MINUS_52: f64 = 1.0 / (1u64 << 52) as f64;

/// Rate above which Poisson draws switch from multiplication of uniforms to
/// transformed rejection.
const POISSON_PTRS_THRESHOLD: f64 = 30.0;

/// Trial count below which binomial draws count Bernoulli successes.
const BINOMIAL_DIRECT_LIMIT: i64 = 16;

fn invalid_real(message: String) -> RuntimeResult<f64> {
    raise(RuntimeError::InvalidParameterValue(message), f64::NAN)
}

fn invalid_integer(message: String) -> RuntimeResult<i64> {
    raise(RuntimeError::InvalidParameterValue(message), 0)
}

fn positive(value: f64) -> bool {
    value > 0.0 && value.is_finite()
}

fn probability(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

/// `ln Γ(x)` for `x > 0` (Lanczos, g = 7).
pub(crate) fn ln_gamma(x: f64) -> f64 {
    const COEFFICIENTS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];
    if x < 0.5 {
        return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let mut sum = COEFFICIENTS[0];
    for (i, c) in COEFFICIENTS.iter().enumerate().skip(1) {
        sum += c / (x + i as f64);
    }
    let t = x + 7.5;
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + sum.ln()
}

/// Draws from a generator. Implemented for every [`RngCore`].
pub trait Sampling: RngCore {
    /// Uniform over the full `i64` range.
    fn random_integer(&mut self) -> i64 {
        self.next_u64() as i64
    }

    /// Uniform on [0, 1].
    fn random_inclusive(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / ((1u64 << 53) - 1) as f64
    }

    /// Uniform on [0, 1).
    fn random_inclusive_exclusive(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * TWO_POW_MINUS_53
    }

    /// Uniform on (0, 1].
    fn random_exclusive_inclusive(&mut self) -> f64 {
        ((self.next_u64() >> 11) + 1) as f64 * TWO_POW_MINUS_53
    }

    /// Uniform on (0, 1).
    fn random_exclusive(&mut self) -> f64 {
        ((self.next_u64() >> 12) as f64 + 0.5) * TWO_POW_MINUS_52
    }

    /// `true` with probability `p`.
    fn random_boolean(&mut self, p: f64) -> RuntimeResult<bool> {
        if !probability(p) {
            return raise(
                RuntimeError::invalid_parameter(format!("boolean probability {} outside [0, 1]", p)),
                false,
            );
        }
        Ok(self.random_inclusive_exclusive() < p)
    }

    /// Normal deviate by the Marsaglia polar method.
    fn random_normal(&mut self, mean: f64, sigma: f64) -> RuntimeResult<f64> {
        if !(sigma >= 0.0 && sigma.is_finite() && mean.is_finite()) {
            return invalid_real(format!("normal(mean = {}, sigma = {})", mean, sigma));
        }
        Ok(mean + sigma * standard_normal(self))
    }

    fn random_weibull(&mut self, scale: f64, shape: f64, delay: f64) -> RuntimeResult<f64> {
        if !(positive(scale) && positive(shape) && delay.is_finite()) {
            return invalid_real(format!(
                "weibull(scale = {}, shape = {}, delay = {})",
                scale, shape, delay
            ));
        }
        let u = self.random_exclusive_inclusive();
        Ok(delay + scale * (-u.ln()).powf(1.0 / shape))
    }

    fn random_exponential(&mut self, rate: f64) -> RuntimeResult<f64> {
        if !positive(rate) {
            return invalid_real(format!("exponential(rate = {})", rate));
        }
        Ok(-self.random_exclusive_inclusive().ln() / rate)
    }

    /// Gamma deviate with shape `k` and scale `s` (Marsaglia–Tsang).
    fn random_gamma(&mut self, k: f64, s: f64) -> RuntimeResult<f64> {
        if !(positive(k) && positive(s)) {
            return invalid_real(format!("gamma(k = {}, scale = {})", k, s));
        }
        Ok(standard_gamma(self, k) * s)
    }

    fn random_rayleigh(&mut self, scale: f64) -> RuntimeResult<f64> {
        if !positive(scale) {
            return invalid_real(format!("rayleigh(scale = {})", scale));
        }
        Ok(scale * (-2.0 * self.random_exclusive_inclusive().ln()).sqrt())
    }

    fn random_chi_squared(&mut self, k: f64) -> RuntimeResult<f64> {
        if !positive(k) {
            return invalid_real(format!("chi_squared(k = {})", k));
        }
        Ok(2.0 * standard_gamma(self, k / 2.0))
    }

    fn random_log_normal(&mut self, mean: f64, sigma: f64) -> RuntimeResult<f64> {
        if !(sigma >= 0.0 && sigma.is_finite() && mean.is_finite()) {
            return invalid_real(format!("log_normal(mean = {}, sigma = {})", mean, sigma));
        }
        Ok((mean + sigma * standard_normal(self)).exp())
    }

    fn random_cauchy_lorentz(&mut self, location: f64, scale: f64) -> RuntimeResult<f64> {
        if !(positive(scale) && location.is_finite()) {
            return invalid_real(format!(
                "cauchy_lorentz(location = {}, scale = {})",
                location, scale
            ));
        }
        Ok(location + scale * (PI * (self.random_exclusive() - 0.5)).tan())
    }

    /// Poisson deviate: products of uniforms below a rate of 30, transformed
    /// rejection (PTRS) above.
    fn random_poisson(&mut self, rate: f64) -> RuntimeResult<i64> {
        if !(rate >= 0.0 && rate.is_finite()) {
            return invalid_integer(format!("poisson(rate = {})", rate));
        }
        if rate == 0.0 {
            return Ok(0);
        }
        if rate < POISSON_PTRS_THRESHOLD {
            Ok(poisson_by_multiplication(self, rate))
        } else {
            Ok(poisson_ptrs(self, rate))
        }
    }

    /// Number of successes in `n` trials of probability `p`.
    fn random_binomial(&mut self, n: i64, p: f64) -> RuntimeResult<i64> {
        if n < 0 || !probability(p) {
            return invalid_integer(format!("binomial(n = {}, p = {})", n, p));
        }
        Ok(binomial(self, n, p))
    }

    /// Number of trials up to and including the first success.
    fn random_geometric(&mut self, p: f64) -> RuntimeResult<i64> {
        if !(p > 0.0 && p <= 1.0) {
            return invalid_integer(format!("geometric(p = {})", p));
        }
        if p == 1.0 {
            return Ok(1);
        }
        let u = self.random_exclusive();
        let trials = (u.ln() / (-p).ln_1p()).floor() + 1.0;
        Ok(if trials >= i64::MAX as f64 {
            i64::MAX
        } else {
            trials as i64
        })
    }
}

impl<R: RngCore + ?Sized> Sampling for R {}

fn standard_normal<R: Sampling + ?Sized>(rng: &mut R) -> f64 {
    loop {
        let u = 2.0 * rng.random_exclusive() - 1.0;
        let v = 2.0 * rng.random_exclusive() - 1.0;
        let s = u * u + v * v;
        if s > 0.0 && s < 1.0 {
            return u * (-2.0 * s.ln() / s).sqrt();
        }
    }
}

fn standard_gamma<R: Sampling + ?Sized>(rng: &mut R, k: f64) -> f64 {
    if k < 1.0 {
        let boost = rng.random_exclusive().powf(1.0 / k);
        return standard_gamma(rng, k + 1.0) * boost;
    }
    let d = k - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();
    loop {
        let x = standard_normal(rng);
        let v = 1.0 + c * x;
        if v <= 0.0 {
            continue;
        }
        let v = v * v * v;
        let u = rng.random_exclusive();
        let x2 = x * x;
        if u < 1.0 - 0.0331 * x2 * x2 || u.ln() < 0.5 * x2 + d * (1.0 - v + v.ln()) {
            return d * v;
        }
    }
}

fn poisson_by_multiplication<R: Sampling + ?Sized>(rng: &mut R, rate: f64) -> i64 {
    let limit = (-rate).exp();
    let mut product = rng.random_inclusive_exclusive();
    let mut count = 0;
    while product > limit {
        count += 1;
        product *= rng.random_inclusive_exclusive();
    }
    count
}

/// Hörmann's transformed rejection with squeeze.
fn poisson_ptrs<R: Sampling + ?Sized>(rng: &mut R, rate: f64) -> i64 {
    let sqrt_rate = rate.sqrt();
    let log_rate = rate.ln();
    let b = 0.931 + 2.53 * sqrt_rate;
    let a = -0.059 + 0.02483 * b;
    let inverse_alpha = 1.1239 + 1.1328 / (b - 3.4);
    let v_r = 0.9277 - 3.6224 / (b - 2.0);
    loop {
        let u = rng.random_exclusive() - 0.5;
        let v = rng.random_exclusive();
        let us = 0.5 - u.abs();
        let k = ((2.0 * a / us + b) * u + rate + 0.43).floor();
        if us >= 0.07 && v <= v_r {
            return k as i64;
        }
        if k < 0.0 || (us < 0.013 && v > us) {
            continue;
        }
        let lhs = v.ln() + inverse_alpha.ln() - (a / (us * us) + b).ln();
        let rhs = -rate + k * log_rate - ln_gamma(k + 1.0);
        if lhs <= rhs {
            return k as i64;
        }
    }
}

/// Splits large trial counts with beta-distributed order statistics until
/// few enough trials remain to count directly.
fn binomial<R: Sampling + ?Sized>(rng: &mut R, mut n: i64, mut p: f64) -> i64 {
    let mut successes = 0;
    while n > BINOMIAL_DIRECT_LIMIT {
        if p <= 0.0 {
            return successes;
        }
        if p >= 1.0 {
            return successes + n;
        }
        let a = 1 + n / 2;
        let b = n + 1 - a;
        let x = standard_gamma(rng, a as f64);
        let y = standard_gamma(rng, b as f64);
        let beta = x / (x + y);
        if beta >= p {
            n = a - 1;
            p /= beta;
        } else {
            successes += a;
            n = b - 1;
            p = (p - beta) / (1.0 - beta);
        }
    }
    for _ in 0..n {
        if rng.random_inclusive_exclusive() < p {
            successes += 1;
        }
    }
    successes
}
