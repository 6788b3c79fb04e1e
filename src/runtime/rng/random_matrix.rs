//! Random matrix generators. Cells are drawn independently in column-major
//! order, so a matrix consumes the same stream as the equivalent sequence
//! of scalar draws.

use crate::runtime::{
    error::RuntimeResult,
    matrix::{Element, Matrix, MatrixBoolean, MatrixInteger, MatrixReal},
    rng::Sampling,
};

/// Builds a `rows × columns` matrix from one draw per cell. The first error
/// stops generation.
pub fn random_matrix<R, T, F>(rng: &mut R, rows: usize, columns: usize, mut draw: F) -> RuntimeResult<Matrix<T>>
where
    R: Sampling + ?Sized,
    T: Element,
    F: FnMut(&mut R) -> RuntimeResult<T>,
{
    let mut values = Vec::with_capacity(rows * columns);
    for _ in 0..rows * columns {
        values.push(draw(rng)?);
    }
    Matrix::build(rows, columns, values)
}

pub fn integer_matrix<R: Sampling + ?Sized>(rng: &mut R, rows: usize, columns: usize) -> MatrixInteger {
    Matrix::from_fn(rows, columns, |_, _| rng.random_integer())
}

/// Cells uniform on [0, 1).
pub fn uniform_matrix<R: Sampling + ?Sized>(rng: &mut R, rows: usize, columns: usize) -> MatrixReal {
    Matrix::from_fn(rows, columns, |_, _| rng.random_inclusive_exclusive())
}

pub fn boolean_matrix<R: Sampling + ?Sized>(
    rng: &mut R,
    rows: usize,
    columns: usize,
    p: f64,
) -> RuntimeResult<MatrixBoolean> {
    random_matrix(rng, rows, columns, |rng| rng.random_boolean(p))
}

pub fn normal_matrix<R: Sampling + ?Sized>(
    rng: &mut R,
    rows: usize,
    columns: usize,
    mean: f64,
    sigma: f64,
) -> RuntimeResult<MatrixReal> {
    random_matrix(rng, rows, columns, |rng| rng.random_normal(mean, sigma))
}

pub fn exponential_matrix<R: Sampling + ?Sized>(
    rng: &mut R,
    rows: usize,
    columns: usize,
    rate: f64,
) -> RuntimeResult<MatrixReal> {
    random_matrix(rng, rows, columns, |rng| rng.random_exponential(rate))
}

pub fn gamma_matrix<R: Sampling + ?Sized>(
    rng: &mut R,
    rows: usize,
    columns: usize,
    k: f64,
    scale: f64,
) -> RuntimeResult<MatrixReal> {
    random_matrix(rng, rows, columns, |rng| rng.random_gamma(k, scale))
}

pub fn poisson_matrix<R: Sampling + ?Sized>(
    rng: &mut R,
    rows: usize,
    columns: usize,
    rate: f64,
) -> RuntimeResult<MatrixInteger> {
    random_matrix(rng, rows, columns, |rng| rng.random_poisson(rate))
}

pub fn binomial_matrix<R: Sampling + ?Sized>(
    rng: &mut R,
    rows: usize,
    columns: usize,
    n: i64,
    p: f64,
) -> RuntimeResult<MatrixInteger> {
    random_matrix(rng, rows, columns, |rng| rng.random_binomial(n, p))
}
