//! Dense column-major matrices over the four scalar element types.
//!
//! Storage is shared behind an `Arc`; clones are O(1) and the first write
//! through a shared handle copies the body. Public indexing is 1-based and
//! writes past the current extent grow the matrix, zero-filling new cells.

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use crate::runtime::{
    error::{RuntimeError, RuntimeResult},
    policy::raise,
    scalar::Complex,
    variant::Variant,
};

mod element;
mod ops;
mod selector;

pub use element::{Element, NumericElement};
pub(crate) use element::{hash_real, real_order};
pub use ops::PARALLEL_THRESHOLD;
pub use selector::Selector;

pub type MatrixBoolean = Matrix<bool>;
pub type MatrixInteger = Matrix<i64>;
pub type MatrixReal = Matrix<f64>;
pub type MatrixComplex = Matrix<Complex>;

#[derive(Debug, Clone)]
pub struct Matrix<T> {
    rows: usize,
    columns: usize,
    data: Arc<Vec<T>>,
}

impl<T: Element> Default for Matrix<T> {
    fn default() -> Self {
        Self {
            rows: 0,
            columns: 0,
            data: Arc::new(Vec::new()),
        }
    }
}

impl<T: Element> Matrix<T> {
    /// Zero-filled `rows × columns` matrix.
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            data: Arc::new(vec![T::zero(); rows * columns]),
        }
    }

    /// Builds from column-major values. A length mismatch raises
    /// `InvalidParameterValue` and falls back to a zero matrix of the
    /// requested shape.
    pub fn build(rows: usize, columns: usize, values: Vec<T>) -> RuntimeResult<Self> {
        if values.len() != rows * columns {
            return raise(
                RuntimeError::invalid_parameter(format!(
                    "{} values can not fill a {}x{} matrix",
                    values.len(),
                    rows,
                    columns
                )),
                Self::new(rows, columns),
            );
        }
        Ok(Self {
            rows,
            columns,
            data: Arc::new(values),
        })
    }

    /// Builds from row slices; every row must have the same length.
    pub fn from_rows(rows: &[&[T]]) -> RuntimeResult<Self> {
        let columns = rows.first().map_or(0, |row| row.len());
        if rows.iter().any(|row| row.len() != columns) {
            return Err(RuntimeError::invalid_parameter("rows differ in length"));
        }
        Ok(Self::from_fn(rows.len(), columns, |r, c| rows[r][c]))
    }

    /// Builds from a function of the 0-based `(row, column)`.
    pub fn from_fn(rows: usize, columns: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(rows * columns);
        for column in 0..columns {
            for row in 0..rows {
                data.push(f(row, column));
            }
        }
        Self {
            rows,
            columns,
            data: Arc::new(data),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.columns
    }

    /// Column-major element slice.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub(crate) fn data_mut(&mut self) -> &mut Vec<T> {
        Arc::make_mut(&mut self.data)
    }

    /// Element at 0-based coordinates. Panics when out of range.
    pub fn get(&self, row: usize, column: usize) -> T {
        self.data[column * self.rows + row]
    }

    /// Element at 1-based coordinates. Out-of-range indexes raise
    /// `InvalidParameterValue` and fall back to zero.
    pub fn at(&self, row: i64, column: i64) -> RuntimeResult<T> {
        match (self.offset(row, self.rows), self.offset(column, self.columns)) {
            (Some(r), Some(c)) => Ok(self.get(r, c)),
            _ => raise(
                RuntimeError::invalid_parameter(format!(
                    "index ({}, {}) out of range for a {}x{} matrix",
                    row, column, self.rows, self.columns
                )),
                T::zero(),
            ),
        }
    }

    /// Slice access. Returns a scalar variant when both selectors are
    /// scalar, otherwise a matrix of `(row picks) × (column picks)`.
    pub fn at_selectors(&self, rows: &Selector, columns: &Selector) -> RuntimeResult<Variant> {
        if let (Selector::Index(row), Selector::Index(column)) = (rows, columns) {
            return Ok(self.at(*row, *column)?.to_scalar().into());
        }
        Ok(T::into_variant(self.slice(rows, columns)?))
    }

    pub fn slice(&self, rows: &Selector, columns: &Selector) -> RuntimeResult<Matrix<T>> {
        let row_offsets = rows.resolve(self.rows)?;
        let column_offsets = columns.resolve(self.columns)?;
        Ok(Self::from_fn(
            row_offsets.len(),
            column_offsets.len(),
            |r, c| self.get(row_offsets[r], column_offsets[c]),
        ))
    }

    /// Writes at 1-based coordinates, growing the matrix when needed.
    pub fn update(&mut self, row: i64, column: i64, value: T) -> RuntimeResult<()> {
        let (Some(r), Some(c)) = (self.offset(row, usize::MAX), self.offset(column, usize::MAX))
        else {
            return raise(
                RuntimeError::invalid_parameter(format!(
                    "matrix index ({}, {}) must be positive",
                    row, column
                )),
                (),
            );
        };
        if r >= self.rows || c >= self.columns {
            self.resize(self.rows.max(r + 1), self.columns.max(c + 1));
        }
        let rows = self.rows;
        self.data_mut()[c * rows + r] = value;
        Ok(())
    }

    /// Changes the shape, keeping the overlapping cells and zero-filling the
    /// rest.
    pub fn resize(&mut self, rows: usize, columns: usize) {
        if rows == self.rows && columns == self.columns {
            return;
        }
        let resized = Self::from_fn(rows, columns, |r, c| {
            if r < self.rows && c < self.columns {
                self.get(r, c)
            } else {
                T::zero()
            }
        });
        *self = resized;
    }

    /// 1-based column as an `rows × 1` matrix.
    pub fn column(&self, column: i64) -> RuntimeResult<Matrix<T>> {
        self.slice(&Selector::All, &Selector::Index(column))
    }

    /// 1-based row as a `1 × columns` matrix.
    pub fn row(&self, row: i64) -> RuntimeResult<Matrix<T>> {
        self.slice(&Selector::Index(row), &Selector::All)
    }

    pub fn map<U: Element>(&self, f: impl Fn(T) -> U) -> Matrix<U> {
        Matrix {
            rows: self.rows,
            columns: self.columns,
            data: Arc::new(self.data.iter().map(|v| f(*v)).collect()),
        }
    }

    /// Lexicographic over the column-major sequence, then by length, then by
    /// row count, then by column count. `Equal` implies identical shape and
    /// elements, which empty matrices need since they have no elements.
    pub fn relative_order(&self, other: &Matrix<T>) -> Ordering {
        if Arc::ptr_eq(&self.data, &other.data) && self.shape() == other.shape() {
            return Ordering::Equal;
        }
        for (a, b) in self.data.iter().zip(other.data.iter()) {
            let ordering = a.relative_order(*b);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        self.len()
            .cmp(&other.len())
            .then_with(|| self.rows.cmp(&other.rows))
            .then_with(|| self.columns.cmp(&other.columns))
    }

    pub(crate) fn hash_into<H: Hasher>(&self, state: &mut H) {
        self.rows.hash(state);
        self.columns.hash(state);
        for value in self.data.iter() {
            value.hash_element(state);
        }
    }

    fn offset(&self, index: i64, extent: usize) -> Option<usize> {
        let position = usize::try_from(index).ok()?;
        (position >= 1 && position <= extent).then(|| position - 1)
    }
}

impl<T: Element> PartialEq for Matrix<T> {
    fn eq(&self, other: &Self) -> bool {
        self.relative_order(other) == Ordering::Equal
    }
}

/// Renders each column as a bracketed list: `[[1, 2], [3, 4]]` is the matrix
/// with first column `1, 2`.
impl<T: Element> fmt::Display for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for column in 0..self.columns {
            if column > 0 {
                write!(f, ", ")?;
            }
            write!(f, "[")?;
            for row in 0..self.rows {
                if row > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", self.get(row, column))?;
            }
            write!(f, "]")?;
        }
        write!(f, "]")
    }
}
