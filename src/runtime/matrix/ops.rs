use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::{Element, Matrix, NumericElement};
use crate::runtime::{
    error::{RuntimeError, RuntimeResult},
    policy::raise,
    scalar::ArithmeticOp,
};

/// Products whose `rows × inner × columns` reaches this many multiply-adds
/// are computed column-parallel.
pub const PARALLEL_THRESHOLD: usize = 64 * 64 * 64;

impl<T: Element> Matrix<T> {
    /// `rows × columns` identity; `columns` defaults to `rows`.
    pub fn identity(rows: usize, columns: Option<usize>) -> Self {
        Self::from_fn(rows, columns.unwrap_or(rows), |r, c| {
            if r == c { T::one() } else { T::zero() }
        })
    }

    pub fn zero(rows: usize, columns: Option<usize>) -> Self {
        Self::new(rows, columns.unwrap_or(rows))
    }

    pub fn ones(rows: usize, columns: Option<usize>) -> Self {
        Self::from_fn(rows, columns.unwrap_or(rows), |_, _| T::one())
    }

    /// Places `other` to the right; the shorter operand is zero-padded to
    /// the taller row count.
    pub fn combine_left_to_right(&self, other: &Matrix<T>) -> Matrix<T> {
        let rows = self.rows.max(other.rows);
        Self::from_fn(rows, self.columns + other.columns, |r, c| {
            let (source, column) = if c < self.columns {
                (self, c)
            } else {
                (other, c - self.columns)
            };
            if r < source.rows {
                source.get(r, column)
            } else {
                T::zero()
            }
        })
    }

    /// Places `other` below; the narrower operand is zero-padded to the wider
    /// column count.
    pub fn combine_top_to_bottom(&self, other: &Matrix<T>) -> Matrix<T> {
        let columns = self.columns.max(other.columns);
        Self::from_fn(self.rows + other.rows, columns, |r, c| {
            let (source, row) = if r < self.rows {
                (self, r)
            } else {
                (other, r - self.rows)
            };
            if c < source.columns {
                source.get(row, c)
            } else {
                T::zero()
            }
        })
    }

    pub fn transpose(&self) -> Matrix<T> {
        Self::from_fn(self.columns, self.rows, |r, c| self.get(c, r))
    }

    pub fn conj(&self) -> Matrix<T> {
        self.map(T::conj)
    }

    /// Conjugate transpose.
    pub fn adjoint(&self) -> Matrix<T> {
        Self::from_fn(self.columns, self.rows, |r, c| self.get(c, r).conj())
    }

    /// Reverses the order of the rows.
    pub fn row_reverse(&self) -> Matrix<T> {
        Self::from_fn(self.rows, self.columns, |r, c| self.get(self.rows - 1 - r, c))
    }

    /// Reverses the order of the columns.
    pub fn column_reverse(&self) -> Matrix<T> {
        Self::from_fn(self.rows, self.columns, |r, c| {
            self.get(r, self.columns - 1 - c)
        })
    }

    /// A row or column vector becomes the square matrix with the vector on
    /// its diagonal; any other matrix keeps only its diagonal.
    pub fn diagonal(&self) -> Matrix<T> {
        if self.rows == 1 || self.columns == 1 {
            let n = self.len();
            return Self::from_fn(n, n, |r, c| {
                if r == c { self.data[r] } else { T::zero() }
            });
        }
        Self::from_fn(self.rows, self.columns, |r, c| {
            if r == c { self.get(r, c) } else { T::zero() }
        })
    }

    /// Diagonal entries as a column vector.
    pub fn diagonal_entries(&self) -> Matrix<T> {
        let n = self.rows.min(self.columns);
        Self::from_fn(n, 1, |r, _| self.get(r, r))
    }

    pub fn trace(&self) -> T {
        (0..self.rows.min(self.columns)).fold(T::zero(), |acc, i| acc.add(self.get(i, i)))
    }

    pub fn frobenius_norm(&self) -> f64 {
        self.data
            .iter()
            .map(|v| v.norm_squared())
            .sum::<f64>()
            .sqrt()
    }

    fn check_same_shape(&self, other: &Matrix<T>) -> RuntimeResult<()> {
        if self.shape() != other.shape() {
            return Err(RuntimeError::incompatible_dimensions(
                self.shape(),
                other.shape(),
            ));
        }
        Ok(())
    }

    fn zip_with(&self, other: &Matrix<T>, f: impl Fn(T, T) -> T) -> Matrix<T> {
        Matrix {
            rows: self.rows,
            columns: self.columns,
            data: Arc::new(
                self.data
                    .iter()
                    .zip(other.data.iter())
                    .map(|(a, b)| f(*a, *b))
                    .collect(),
            ),
        }
    }

    /// Elementwise product.
    pub fn hadamard(&self, other: &Matrix<T>) -> RuntimeResult<Matrix<T>> {
        self.check_same_shape(other)?;
        Ok(self.zip_with(other, T::mul))
    }

    /// Kronecker product with shape `r₁r₂ × c₁c₂`.
    pub fn kronecker(&self, other: &Matrix<T>) -> Matrix<T> {
        Self::from_fn(
            self.rows * other.rows,
            self.columns * other.columns,
            |r, c| {
                let outer = self.get(r / other.rows, c / other.columns);
                outer.mul(other.get(r % other.rows, c % other.columns))
            },
        )
    }

    pub fn add(&self, other: &Matrix<T>) -> RuntimeResult<Matrix<T>> {
        self.check_same_shape(other)?;
        Ok(self.zip_with(other, T::add))
    }

    pub fn scale(&self, factor: T) -> Matrix<T> {
        self.map(|v| v.mul(factor))
    }

    /// Matrix product. Raises `IncompatibleMatrixDimensions` unless the
    /// column count of `self` equals the row count of `other`.
    pub fn multiply(&self, other: &Matrix<T>) -> RuntimeResult<Matrix<T>> {
        if self.columns != other.rows {
            return Err(RuntimeError::incompatible_dimensions(
                self.shape(),
                other.shape(),
            ));
        }
        let rows = self.rows;
        let mut data = vec![T::zero(); rows * other.columns];
        let fill_column = |(column, out): (usize, &mut [T])| {
            for k in 0..self.columns {
                let factor = other.get(k, column);
                let source = &self.data[k * rows..(k + 1) * rows];
                for (cell, value) in out.iter_mut().zip(source) {
                    *cell = cell.add(value.mul(factor));
                }
            }
        };
        if rows == 0 {
            return Ok(Matrix::new(0, other.columns));
        }
        #[cfg(feature = "parallel")]
        if rows * self.columns * other.columns >= PARALLEL_THRESHOLD {
            data.par_chunks_mut(rows).enumerate().for_each(fill_column);
            return Ok(Matrix {
                rows,
                columns: other.columns,
                data: Arc::new(data),
            });
        }
        data.chunks_mut(rows).enumerate().for_each(fill_column);
        Ok(Matrix {
            rows,
            columns: other.columns,
            data: Arc::new(data),
        })
    }

    /// Repeated product for non-negative exponents of a square matrix.
    pub fn power(&self, exponent: i64) -> RuntimeResult<Matrix<T>> {
        if !self.is_square() {
            return Err(RuntimeError::incompatible_dimensions(
                self.shape(),
                self.shape(),
            ));
        }
        if exponent < 0 {
            return raise(
                RuntimeError::invalid_parameter("negative matrix exponent"),
                Matrix::new(self.rows, self.columns),
            );
        }
        let mut result = Matrix::identity(self.rows, None);
        let mut base = self.clone();
        let mut remaining = exponent as u64;
        while remaining > 0 {
            if remaining & 1 == 1 {
                result = result.multiply(&base)?;
            }
            remaining >>= 1;
            if remaining > 0 {
                base = base.multiply(&base)?;
            }
        }
        Ok(result)
    }
}

impl<T: NumericElement> Matrix<T> {
    pub fn subtract(&self, other: &Matrix<T>) -> RuntimeResult<Matrix<T>> {
        self.check_same_shape(other)?;
        Ok(self.zip_with(other, T::sub))
    }

    pub fn negate(&self) -> Matrix<T> {
        self.map(T::neg)
    }

    /// Elementwise arithmetic with the scalar rules of
    /// [`crate::runtime::scalar::Scalar::apply`]; shapes must match.
    pub fn elementwise(&self, op: ArithmeticOp, other: &Matrix<T>) -> RuntimeResult<Matrix<T>> {
        self.check_same_shape(other)?;
        let mut data = Vec::with_capacity(self.len());
        for (a, b) in self.data.iter().zip(other.data.iter()) {
            data.push(apply_element(op, *a, *b)?);
        }
        Matrix::build(self.rows, self.columns, data)
    }

    /// Applies `op` between every element and a scalar. With
    /// `scalar_first` the scalar is the left operand.
    pub fn broadcast(&self, op: ArithmeticOp, scalar: T, scalar_first: bool) -> RuntimeResult<Matrix<T>> {
        let mut data = Vec::with_capacity(self.len());
        for value in self.data.iter() {
            let (a, b) = if scalar_first {
                (scalar, *value)
            } else {
                (*value, scalar)
            };
            data.push(apply_element(op, a, b)?);
        }
        Matrix::build(self.rows, self.columns, data)
    }
}

fn apply_element<T: Element>(op: ArithmeticOp, a: T, b: T) -> RuntimeResult<T> {
    let result = a.to_scalar().apply(op, b.to_scalar())?;
    Ok(T::from_scalar(result).unwrap_or_else(|| {
        T::from_scalar(result.widen_to(T::SCALAR_TYPE)).unwrap_or_default()
    }))
}
