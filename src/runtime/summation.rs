//! The summation operator Σ f(i) over finite and infinite bounds.
//!
//! Finite bounds iterate `min..=max`. An infinite bound walks away from the
//! finite one until the partial sums settle, and real-valued alternating
//! series are accelerated with the Cohen–Rodriguez Villegas–Zagier
//! transform. Doubly infinite sums add the two tails `0, 1, 2, …` and
//! `-1, -2, …`.

use std::fmt;

use tracing::trace;

use crate::{
    config::SummationConfig,
    runtime::{
        error::{RuntimeError, RuntimeResult},
        matrix::{Matrix, NumericElement},
        policy::raise,
        scalar::Complex,
    },
};

/// Terms per acceleration order step.
const ACCELERATION_STRIDE: usize = 4;

/// `(3 + √8)^n` leaves the f64 range near n = 402.
const MAXIMUM_ACCELERATION_ORDER: usize = 384;

/// An accelerated estimate is accepted only once the newest term has fallen to
/// this fraction of the term halfway through the window.
const TERM_DECAY_RATIO: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Finite(i64),
    PositiveInfinity,
    NegativeInfinity,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Finite(v) => write!(f, "{}", v),
            Bound::PositiveInfinity => write!(f, "+inf"),
            Bound::NegativeInfinity => write!(f, "-inf"),
        }
    }
}

impl From<i64> for Bound {
    fn from(value: i64) -> Self {
        Bound::Finite(value)
    }
}

/// Values a summation can accumulate.
///
/// The neutral-element helpers take an exemplar so matrix results keep the
/// shape of the terms.
pub trait Summable: Clone {
    fn one_value(exemplar: &Self) -> Self;

    fn zero_value(exemplar: &Self) -> Self;

    /// Relative change `|a - b| / |b|`; 0 when `a == b`.
    fn error_value(a: &Self, b: &Self) -> f64;

    /// Result reported when a series fails to converge and the convergence
    /// class is disabled.
    fn convergence_failure_value(exemplar: &Self) -> Self;

    fn accumulate(&self, term: &Self) -> RuntimeResult<Self>;

    /// Real payload for alternating-series acceleration.
    fn as_real(&self) -> Option<f64> {
        None
    }

    /// Rebuilds a value from an accelerated real estimate.
    fn from_real_estimate(&self, _estimate: f64) -> Self {
        self.clone()
    }
}

fn relative_change(difference: f64, reference: f64) -> f64 {
    if difference == 0.0 {
        0.0
    } else {
        difference / reference
    }
}

impl Summable for i64 {
    fn one_value(_: &Self) -> Self {
        1
    }

    fn zero_value(_: &Self) -> Self {
        0
    }

    fn error_value(a: &Self, b: &Self) -> f64 {
        relative_change(
            a.abs_diff(*b) as f64,
            b.unsigned_abs() as f64,
        )
    }

    fn convergence_failure_value(_: &Self) -> Self {
        0
    }

    fn accumulate(&self, term: &Self) -> RuntimeResult<Self> {
        Ok(self.wrapping_add(*term))
    }
}

impl Summable for f64 {
    fn one_value(_: &Self) -> Self {
        1.0
    }

    fn zero_value(_: &Self) -> Self {
        0.0
    }

    fn error_value(a: &Self, b: &Self) -> f64 {
        if a == b {
            return 0.0;
        }
        relative_change((a - b).abs(), b.abs())
    }

    fn convergence_failure_value(_: &Self) -> Self {
        f64::NAN
    }

    fn accumulate(&self, term: &Self) -> RuntimeResult<Self> {
        Ok(self + term)
    }

    fn as_real(&self) -> Option<f64> {
        Some(*self)
    }

    fn from_real_estimate(&self, estimate: f64) -> Self {
        estimate
    }
}

impl Summable for Complex {
    fn one_value(_: &Self) -> Self {
        Complex::ONE
    }

    fn zero_value(_: &Self) -> Self {
        Complex::ZERO
    }

    fn error_value(a: &Self, b: &Self) -> f64 {
        if a == b {
            return 0.0;
        }
        relative_change((*a - *b).abs(), b.abs())
    }

    fn convergence_failure_value(_: &Self) -> Self {
        Complex::nan()
    }

    fn accumulate(&self, term: &Self) -> RuntimeResult<Self> {
        Ok(*self + *term)
    }
}

impl<T: NumericElement> Summable for Matrix<T> {
    fn one_value(exemplar: &Self) -> Self {
        Matrix::identity(exemplar.rows(), Some(exemplar.columns()))
    }

    fn zero_value(exemplar: &Self) -> Self {
        Matrix::zero(exemplar.rows(), Some(exemplar.columns()))
    }

    /// Frobenius-norm relative change. Shape mismatches never settle.
    fn error_value(a: &Self, b: &Self) -> f64 {
        match a.subtract(b) {
            Ok(difference) => relative_change(difference.frobenius_norm(), b.frobenius_norm()),
            Err(_) => f64::INFINITY,
        }
    }

    fn convergence_failure_value(_: &Self) -> Self {
        Matrix::default()
    }

    fn accumulate(&self, term: &Self) -> RuntimeResult<Self> {
        self.add(term)
    }
}

/// Cohen–Rodriguez Villegas–Zagier estimate of `Σ terms`, where the terms
/// alternate in sign.
fn accelerated_estimate(terms: &[f64]) -> f64 {
    let n = terms.len() as f64;
    let d = (3.0 + 8f64.sqrt()).powf(n);
    let d = (d + 1.0 / d) / 2.0;
    let mut b = -1.0;
    let mut c = -d;
    let mut sum = 0.0;
    for (k, &term) in terms.iter().enumerate() {
        let magnitude = if k % 2 == 0 { term } else { -term };
        c = b - c;
        sum += c * magnitude;
        let k = k as f64;
        b = (k + n) * (k - n) * b / ((k + 0.5) * (k + 1.0));
    }
    sum / d
}

/// Tracks the accelerated estimates of an alternating real series.
struct Accelerator {
    terms: Vec<f64>,
    last_estimate: Option<f64>,
    agreeing: usize,
    active: bool,
}

impl Accelerator {
    fn new(first: Option<f64>, enabled: bool) -> Self {
        let active = enabled && first.is_some_and(|v| v != 0.0 && v.is_finite());
        Self {
            terms: first.filter(|_| active).into_iter().collect(),
            last_estimate: None,
            agreeing: 0,
            active,
        }
    }

    /// Feeds the next term and returns the series value once
    /// `consecutive_terms` successive estimates agree. Acceleration stops for
    /// good when the signs stop alternating or a term grows in magnitude.
    fn push(&mut self, term: Option<f64>, config: &SummationConfig) -> Option<f64> {
        if !self.active {
            return None;
        }
        let alternates = match (self.terms.last(), term) {
            (Some(&previous), Some(term)) => {
                previous * term < 0.0 && term.is_finite() && term.abs() <= previous.abs()
            }
            _ => false,
        };
        if !alternates || self.terms.len() >= MAXIMUM_ACCELERATION_ORDER {
            trace!(terms = self.terms.len(), "alternating acceleration disengaged");
            self.active = false;
            self.terms = Vec::new();
            return None;
        }
        self.terms.extend(term);
        if self.terms.len() % ACCELERATION_STRIDE != 0 {
            return None;
        }

        let estimate = accelerated_estimate(&self.terms);
        if let Some(last) = self.last_estimate {
            if f64::error_value(&estimate, &last) < config.relative_tolerance {
                self.agreeing += 1;
            } else {
                self.agreeing = 0;
            }
        }
        self.last_estimate = Some(estimate);
        (self.agreeing + 1 >= config.consecutive_terms && self.terms_vanish()).then_some(estimate)
    }

    /// The transform also assigns a value to divergent series such as
    /// 1 - 1 + 1 - …, so the terms must visibly head to zero.
    fn terms_vanish(&self) -> bool {
        match (self.terms.last(), self.terms.get(self.terms.len() / 2)) {
            (Some(last), Some(middle)) => last.abs() <= TERM_DECAY_RATIO * middle.abs(),
            _ => false,
        }
    }
}

/// Sums `f(start), f(start + step), …` until the partial sums settle.
fn sum_tail<T, F>(start: i64, step: i64, f: &mut F, config: &SummationConfig) -> RuntimeResult<T>
where
    T: Summable,
    F: FnMut(i64) -> RuntimeResult<T>,
{
    let first = f(start)?;
    let mut accelerator = Accelerator::new(first.as_real(), config.accelerate);
    let mut sum = first;
    let mut settled = 0;
    let mut iterations: u64 = 1;
    let mut index = start;

    while iterations < config.iteration_budget {
        let Some(next_index) = index.checked_add(step) else {
            break;
        };
        index = next_index;
        let term = f(index)?;
        iterations += 1;

        if let Some(estimate) = accelerator.push(term.as_real(), config) {
            trace!(iterations, estimate, "accelerated series converged");
            return Ok(sum.from_real_estimate(estimate));
        }

        let next = sum.accumulate(&term)?;
        if T::error_value(&next, &sum) < config.relative_tolerance {
            settled += 1;
        } else {
            settled = 0;
        }
        sum = next;
        if settled >= config.consecutive_terms {
            trace!(iterations, "series converged");
            return Ok(sum);
        }
    }

    let failure = T::convergence_failure_value(&sum);
    raise(RuntimeError::CanNotConverge { iterations }, failure)
}

/// Σ f(i) between two bounds with the default [`SummationConfig`].
pub fn summation<T, F>(lower: Bound, upper: Bound, f: F) -> RuntimeResult<T>
where
    T: Summable,
    F: FnMut(i64) -> RuntimeResult<T>,
{
    summation_with(lower, upper, &SummationConfig::default(), f)
}

/// Σ f(i) between two bounds. The bounds may be given in either order.
pub fn summation_with<T, F>(
    lower: Bound,
    upper: Bound,
    config: &SummationConfig,
    mut f: F,
) -> RuntimeResult<T>
where
    T: Summable,
    F: FnMut(i64) -> RuntimeResult<T>,
{
    use Bound::{Finite, NegativeInfinity, PositiveInfinity};

    match (lower, upper) {
        (Finite(a), Finite(b)) => {
            let (low, high) = (a.min(b), a.max(b));
            let mut sum = f(low)?;
            for i in (low..=high).skip(1) {
                sum = sum.accumulate(&f(i)?)?;
            }
            Ok(sum)
        }
        (Finite(a), PositiveInfinity) | (PositiveInfinity, Finite(a)) => {
            sum_tail(a, 1, &mut f, config)
        }
        (Finite(a), NegativeInfinity) | (NegativeInfinity, Finite(a)) => {
            sum_tail(a, -1, &mut f, config)
        }
        (NegativeInfinity, PositiveInfinity) | (PositiveInfinity, NegativeInfinity) => {
            let upward = sum_tail(0, 1, &mut f, config)?;
            let downward = sum_tail(-1, -1, &mut f, config)?;
            upward.accumulate(&downward)
        }
        (PositiveInfinity, PositiveInfinity) | (NegativeInfinity, NegativeInfinity) => {
            let exemplar = f(0)?;
            raise(
                RuntimeError::invalid_parameter(format!(
                    "summation bounds {} and {} enclose no terms",
                    lower, upper
                )),
                T::convergence_failure_value(&exemplar),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::matrix::MatrixReal;

    #[test]
    fn finite_bounds_iterate_inclusively_in_either_order() {
        let forward: i64 = summation(Bound::Finite(1), Bound::Finite(100), |i| Ok(i)).unwrap();
        let backward: i64 = summation(Bound::Finite(100), Bound::Finite(1), |i| Ok(i)).unwrap();
        assert_eq!(forward, 5050);
        assert_eq!(backward, 5050);
    }

    #[test]
    fn geometric_tail_converges() {
        let sum: f64 = summation(Bound::Finite(0), Bound::PositiveInfinity, |i| {
            Ok(0.5f64.powi(i as i32))
        })
        .unwrap();
        assert!((sum - 2.0).abs() < 1e-12);
    }

    #[test]
    fn downward_tail_walks_toward_negative_infinity() {
        let sum: f64 = summation(Bound::NegativeInfinity, Bound::Finite(0), |i| {
            Ok(2f64.powi(i as i32))
        })
        .unwrap();
        assert!((sum - 2.0).abs() < 1e-12);
    }

    #[test]
    fn doubly_infinite_sum_combines_tails() {
        let sum: f64 = summation(Bound::NegativeInfinity, Bound::PositiveInfinity, |i| {
            Ok(0.5f64.powi(i.unsigned_abs() as i32))
        })
        .unwrap();
        assert!((sum - 3.0).abs() < 1e-12);
    }

    #[test]
    fn integer_series_settle_on_zero_terms() {
        let sum: i64 = summation(Bound::Finite(0), Bound::PositiveInfinity, |i| {
            Ok(if i < 10 { i } else { 0 })
        })
        .unwrap();
        assert_eq!(sum, 45);
    }

    #[test]
    fn divergent_series_exhaust_the_budget() {
        let config = SummationConfig {
            iteration_budget: 1_000,
            ..SummationConfig::default()
        };
        let result: RuntimeResult<f64> =
            summation_with(Bound::Finite(1), Bound::PositiveInfinity, &config, |i| Ok(i as f64));
        assert_eq!(result, Err(RuntimeError::CanNotConverge { iterations: 1_000 }));
    }

    #[test]
    fn term_errors_propagate() {
        let result: RuntimeResult<f64> = summation(Bound::Finite(0), Bound::PositiveInfinity, |i| {
            if i == 3 {
                Err(RuntimeError::ResultIsNaN)
            } else {
                Ok(1.0)
            }
        });
        assert_eq!(result, Err(RuntimeError::ResultIsNaN));
    }

    #[test]
    fn matrix_terms_keep_their_shape() {
        let sum: MatrixReal = summation(Bound::Finite(0), Bound::Finite(2), |i| {
            Ok(MatrixReal::ones(2, Some(3)).scale(i as f64))
        })
        .unwrap();
        assert_eq!(sum.shape(), (2, 3));
        assert!(sum.iter().all(|&v| v == 3.0));

        let exemplar = MatrixReal::new(2, 3);
        assert_eq!(
            MatrixReal::one_value(&exemplar),
            MatrixReal::identity(2, Some(3))
        );
        assert!(MatrixReal::convergence_failure_value(&exemplar).is_empty());
    }

    #[test]
    fn neutral_elements() {
        assert_eq!(i64::zero_value(&7), 0);
        assert_eq!(f64::one_value(&2.5), 1.0);
        assert!(f64::convergence_failure_value(&1.0).is_nan());
        assert!(Complex::convergence_failure_value(&Complex::ONE).is_nan());
        assert_eq!(f64::error_value(&1.5, &1.0), 0.5);
        assert_eq!(f64::error_value(&0.0, &0.0), 0.0);
    }

    #[test]
    fn acceleration_requires_vanishing_terms() {
        let config = SummationConfig::default();
        let mut grandi = Accelerator::new(Some(1.0), true);
        for k in 1..MAXIMUM_ACCELERATION_ORDER {
            let term = if k % 2 == 0 { 1.0 } else { -1.0 };
            assert_eq!(grandi.push(Some(term), &config), None, "term {k}");
        }

        let mut growing = Accelerator::new(Some(1.0), true);
        assert_eq!(growing.push(Some(-2.0), &config), None);
        assert!(!growing.active);
    }

    #[test]
    fn accelerated_estimate_of_log_two() {
        let terms: Vec<f64> = (0..24)
            .map(|k| {
                let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
                sign / (k as f64 + 1.0)
            })
            .collect();
        let estimate = accelerated_estimate(&terms);
        assert!((estimate - std::f64::consts::LN_2).abs() < 1e-13);
    }
}
