//! Conversion table between value tags.
//!
//! Every conversion has a flag form that never fails and returns the zero
//! value of the target with `false` when the source can not be represented,
//! and a gated form that raises `TypeConversion` in that case.

use crate::runtime::{
    containers::{OrderedSet, Tuple},
    error::{RuntimeError, RuntimeResult},
    matrix::{Element, Matrix, MatrixBoolean, MatrixComplex, MatrixInteger, MatrixReal},
    policy::raise,
    scalar::Complex,
    variant::{ValueType, Variant},
};

const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

/// Exact f64 → i64 conversion for integral values inside the i64 range.
pub(crate) fn exact_integer(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && (-TWO_POW_63..TWO_POW_63).contains(&value) {
        Some(value as i64)
    } else {
        None
    }
}

fn nonzero_matrix<T: Element>(matrix: &Matrix<T>) -> MatrixBoolean {
    matrix.map(|v| !v.is_zero())
}

impl Variant {
    /// Converts to `target`, reporting representability instead of failing.
    pub fn convert_checked(&self, target: ValueType) -> (Variant, bool) {
        match self.convert_inner(target) {
            Some(value) => (value, true),
            None => (Variant::zero_of(target), false),
        }
    }

    /// Converts to `target`. Unrepresentable conversions raise
    /// `TypeConversion(from, to)`; with the class disabled they yield the
    /// zero value of the target.
    pub fn convert(&self, target: ValueType) -> RuntimeResult<Variant> {
        match self.convert_inner(target) {
            Some(value) => Ok(value),
            None => raise(
                RuntimeError::type_conversion(self.value_type(), target),
                Variant::zero_of(target),
            ),
        }
    }

    pub fn can_convert_to(&self, target: ValueType) -> bool {
        self.convert_checked(target).1
    }

    pub fn to_boolean_checked(&self) -> (bool, bool) {
        match self.convert_checked(ValueType::Boolean) {
            (Variant::Boolean(v), ok) => (v, ok),
            _ => (false, false),
        }
    }

    pub fn to_integer_checked(&self) -> (i64, bool) {
        match self.convert_checked(ValueType::Integer) {
            (Variant::Integer(v), ok) => (v, ok),
            _ => (0, false),
        }
    }

    pub fn to_real_checked(&self) -> (f64, bool) {
        match self.convert_checked(ValueType::Real) {
            (Variant::Real(v), ok) => (v, ok),
            _ => (0.0, false),
        }
    }

    pub fn to_complex_checked(&self) -> (Complex, bool) {
        match self.convert_checked(ValueType::Complex) {
            (Variant::Complex(v), ok) => (v, ok),
            _ => (Complex::ZERO, false),
        }
    }

    pub fn to_set(&self) -> RuntimeResult<OrderedSet> {
        match self.convert(ValueType::Set)? {
            Variant::Set(set) => Ok(set),
            _ => Ok(OrderedSet::new()),
        }
    }

    pub fn to_tuple(&self) -> RuntimeResult<Tuple> {
        match self.convert(ValueType::Tuple)? {
            Variant::Tuple(tuple) => Ok(tuple),
            _ => Ok(Tuple::new()),
        }
    }

    pub fn to_matrix_boolean(&self) -> RuntimeResult<MatrixBoolean> {
        match self.convert(ValueType::MatrixBoolean)? {
            Variant::MatrixBoolean(m) => Ok(m),
            _ => Ok(MatrixBoolean::default()),
        }
    }

    pub fn to_matrix_integer(&self) -> RuntimeResult<MatrixInteger> {
        match self.convert(ValueType::MatrixInteger)? {
            Variant::MatrixInteger(m) => Ok(m),
            _ => Ok(MatrixInteger::default()),
        }
    }

    pub fn to_matrix_real(&self) -> RuntimeResult<MatrixReal> {
        match self.convert(ValueType::MatrixReal)? {
            Variant::MatrixReal(m) => Ok(m),
            _ => Ok(MatrixReal::default()),
        }
    }

    pub fn to_matrix_complex(&self) -> RuntimeResult<MatrixComplex> {
        match self.convert(ValueType::MatrixComplex)? {
            Variant::MatrixComplex(m) => Ok(m),
            _ => Ok(MatrixComplex::default()),
        }
    }

    fn convert_inner(&self, target: ValueType) -> Option<Variant> {
        use ValueType as T;

        if self.value_type() == target {
            return Some(self.clone());
        }
        match (self, target) {
            (Variant::None, _) => Some(Variant::zero_of(target)),

            (Variant::Boolean(v), T::Integer) => Some(Variant::Integer(*v as i64)),
            (Variant::Boolean(v), T::Real) => Some(Variant::Real(if *v { 1.0 } else { 0.0 })),
            (Variant::Boolean(v), T::Complex) => Some(Variant::Complex(Complex::from(*v))),

            (Variant::Integer(v), T::Boolean) => Some(Variant::Boolean(*v != 0)),
            (Variant::Integer(v), T::Real) => Some(Variant::Real(*v as f64)),
            (Variant::Integer(v), T::Complex) => Some(Variant::Complex(Complex::from(*v))),

            (Variant::Real(v), T::Boolean) => Some(Variant::Boolean(*v != 0.0)),
            (Variant::Real(v), T::Integer) => exact_integer(*v).map(Variant::Integer),
            (Variant::Real(v), T::Complex) => Some(Variant::Complex(Complex::from_real(*v))),

            (Variant::Complex(v), T::Boolean) => Some(Variant::Boolean(!v.is_zero())),
            (Variant::Complex(v), T::Integer) if v.imag == 0.0 => {
                exact_integer(v.real).map(Variant::Integer)
            }
            (Variant::Complex(v), T::Real) if v.imag == 0.0 => Some(Variant::Real(v.real)),

            (Variant::Set(set), T::Boolean) => Some(Variant::Boolean(!set.is_empty())),
            (Variant::Tuple(tuple), T::Boolean) => Some(Variant::Boolean(!tuple.is_empty())),

            (Variant::MatrixBoolean(m), T::MatrixInteger) => {
                Some(Variant::MatrixInteger(m.map(|v| v as i64)))
            }
            (Variant::MatrixBoolean(m), T::MatrixReal) => {
                Some(Variant::MatrixReal(m.map(|v| if v { 1.0 } else { 0.0 })))
            }
            (Variant::MatrixBoolean(m), T::MatrixComplex) => {
                Some(Variant::MatrixComplex(m.map(Complex::from)))
            }

            (Variant::MatrixInteger(m), T::MatrixBoolean) => {
                Some(Variant::MatrixBoolean(nonzero_matrix(m)))
            }
            (Variant::MatrixInteger(m), T::MatrixReal) => {
                Some(Variant::MatrixReal(m.map(|v| v as f64)))
            }
            (Variant::MatrixInteger(m), T::MatrixComplex) => {
                Some(Variant::MatrixComplex(m.map(Complex::from)))
            }

            (Variant::MatrixReal(m), T::MatrixBoolean) => {
                Some(Variant::MatrixBoolean(nonzero_matrix(m)))
            }
            (Variant::MatrixReal(m), T::MatrixComplex) => {
                Some(Variant::MatrixComplex(m.map(Complex::from_real)))
            }

            (Variant::MatrixComplex(m), T::MatrixBoolean) => {
                Some(Variant::MatrixBoolean(nonzero_matrix(m)))
            }

            _ => None,
        }
    }
}
