//! Arithmetic, logical and comparison intrinsics on variants.
//!
//! Scalar pairs follow [`Scalar::apply`]. A scalar combined with a matrix is
//! broadcast over the elements, and two matrices combine elementwise, except
//! for `*` which is the matrix product. Operands are first promoted to a
//! common element type, never narrower than Integer.

use std::cmp::Ordering;

use crate::runtime::{
    conversion::inline_to_boolean,
    error::{RuntimeError, RuntimeResult},
    matrix::{Matrix, NumericElement},
    scalar::{ArithmeticOp, Complex, Scalar},
    variant::{ValueType, Variant, implicit_ordering},
};

/// Matrix operand promoted to a numeric element type.
enum Numeric {
    Integer(Matrix<i64>),
    Real(Matrix<f64>),
    Complex(Matrix<Complex>),
}

fn element_type(value: &Variant) -> Option<ValueType> {
    match value.value_type() {
        t if t.is_scalar() => Some(t),
        t => t.element_type(),
    }
}

fn promote_matrix(value: &Variant, target: ValueType) -> RuntimeResult<Numeric> {
    Ok(match target {
        ValueType::Integer => Numeric::Integer(value.to_matrix_integer()?),
        ValueType::Real => Numeric::Real(value.to_matrix_real()?),
        _ => Numeric::Complex(value.to_matrix_complex()?),
    })
}

fn unsupported(op: &str, a: &Variant, b: &Variant) -> RuntimeError {
    RuntimeError::invalid_parameter(format!(
        "can not apply {} to {} and {}",
        op,
        a.value_type(),
        b.value_type()
    ))
}

fn matrix_pair<T: NumericElement>(
    op: ArithmeticOp,
    a: &Matrix<T>,
    b: &Matrix<T>,
) -> RuntimeResult<Matrix<T>> {
    match op {
        ArithmeticOp::Multiply => a.multiply(b),
        ArithmeticOp::Add => a.add(b),
        ArithmeticOp::Subtract => a.subtract(b),
        ArithmeticOp::Divide | ArithmeticOp::Remainder => a.elementwise(op, b),
    }
}

fn scalar_element<T: NumericElement>(scalar: Scalar) -> T {
    T::from_scalar(scalar.widen_to(T::SCALAR_TYPE)).unwrap_or_default()
}

/// Applies a binary arithmetic operator.
pub fn binary(op: ArithmeticOp, a: &Variant, b: &Variant) -> RuntimeResult<Variant> {
    if let (Some(x), Some(y)) = (a.as_scalar(), b.as_scalar()) {
        return x.apply(op, y).map(Variant::from);
    }
    let (Some(ta), Some(tb)) = (element_type(a), element_type(b)) else {
        return Err(unsupported(&format!("{:?}", op), a, b));
    };
    let target = ta.max(tb).max(ValueType::Integer);

    match (a.as_scalar(), b.as_scalar()) {
        (Some(scalar), None) => broadcast(op, promote_matrix(b, target)?, scalar, true),
        (None, Some(scalar)) => broadcast(op, promote_matrix(a, target)?, scalar, false),
        _ => match (promote_matrix(a, target)?, promote_matrix(b, target)?) {
            (Numeric::Integer(x), Numeric::Integer(y)) => matrix_pair(op, &x, &y).map(Variant::from),
            (Numeric::Real(x), Numeric::Real(y)) => matrix_pair(op, &x, &y).map(Variant::from),
            (Numeric::Complex(x), Numeric::Complex(y)) => matrix_pair(op, &x, &y).map(Variant::from),
            _ => Err(unsupported(&format!("{:?}", op), a, b)),
        },
    }
}

fn broadcast(
    op: ArithmeticOp,
    matrix: Numeric,
    scalar: Scalar,
    scalar_first: bool,
) -> RuntimeResult<Variant> {
    match matrix {
        Numeric::Integer(m) => m
            .broadcast(op, scalar_element(scalar), scalar_first)
            .map(Variant::from),
        Numeric::Real(m) => m
            .broadcast(op, scalar_element(scalar), scalar_first)
            .map(Variant::from),
        Numeric::Complex(m) => m
            .broadcast(op, scalar_element(scalar), scalar_first)
            .map(Variant::from),
    }
}

pub fn add(a: &Variant, b: &Variant) -> RuntimeResult<Variant> {
    binary(ArithmeticOp::Add, a, b)
}

pub fn subtract(a: &Variant, b: &Variant) -> RuntimeResult<Variant> {
    binary(ArithmeticOp::Subtract, a, b)
}

pub fn multiply(a: &Variant, b: &Variant) -> RuntimeResult<Variant> {
    binary(ArithmeticOp::Multiply, a, b)
}

pub fn divide(a: &Variant, b: &Variant) -> RuntimeResult<Variant> {
    binary(ArithmeticOp::Divide, a, b)
}

pub fn negate(value: &Variant) -> RuntimeResult<Variant> {
    if let Some(scalar) = value.as_scalar() {
        return Ok(scalar.negate().into());
    }
    match value {
        Variant::MatrixBoolean(_) | Variant::MatrixInteger(_) => {
            Ok(value.to_matrix_integer()?.negate().into())
        }
        Variant::MatrixReal(m) => Ok(m.negate().into()),
        Variant::MatrixComplex(m) => Ok(m.negate().into()),
        other => Err(RuntimeError::invalid_parameter(format!(
            "can not negate {}",
            other.value_type()
        ))),
    }
}

/// Integer power. Square matrices use repeated products.
pub fn power(base: &Variant, exponent: i64) -> RuntimeResult<Variant> {
    if let Some(scalar) = base.as_scalar() {
        return Ok(scalar.power(exponent).into());
    }
    match base {
        Variant::MatrixBoolean(_) | Variant::MatrixInteger(_) => {
            Ok(base.to_matrix_integer()?.power(exponent)?.into())
        }
        Variant::MatrixReal(m) => Ok(m.power(exponent)?.into()),
        Variant::MatrixComplex(m) => Ok(m.power(exponent)?.into()),
        other => Err(RuntimeError::invalid_parameter(format!(
            "can not raise {} to a power",
            other.value_type()
        ))),
    }
}

pub fn logical_and(a: &Variant, b: &Variant) -> RuntimeResult<bool> {
    Ok(inline_to_boolean(a)? && inline_to_boolean(b)?)
}

pub fn logical_or(a: &Variant, b: &Variant) -> RuntimeResult<bool> {
    Ok(inline_to_boolean(a)? || inline_to_boolean(b)?)
}

pub fn logical_not(value: &Variant) -> RuntimeResult<bool> {
    Ok(!inline_to_boolean(value)?)
}

/// Ordering used by `<`, `>`, `<=` and `>=`. Scalar pairs follow the scalar
/// rules, so Complex operands must have zero imaginary parts; `None` means
/// the comparison is false. Other pairs use the cross-type total order.
pub fn compare(a: &Variant, b: &Variant) -> RuntimeResult<Option<Ordering>> {
    match (a.as_scalar(), b.as_scalar()) {
        (Some(x), Some(y)) => x.compare(y),
        _ => Ok(Some(implicit_ordering(a, b))),
    }
}

pub fn less_than(a: &Variant, b: &Variant) -> RuntimeResult<bool> {
    Ok(compare(a, b)? == Some(Ordering::Less))
}

pub fn greater_than(a: &Variant, b: &Variant) -> RuntimeResult<bool> {
    Ok(compare(a, b)? == Some(Ordering::Greater))
}

pub fn less_equal(a: &Variant, b: &Variant) -> RuntimeResult<bool> {
    Ok(matches!(compare(a, b)?, Some(Ordering::Less | Ordering::Equal)))
}

pub fn greater_equal(a: &Variant, b: &Variant) -> RuntimeResult<bool> {
    Ok(matches!(
        compare(a, b)?,
        Some(Ordering::Greater | Ordering::Equal)
    ))
}

/// `==` under the cross-type total order.
pub fn equal(a: &Variant, b: &Variant) -> bool {
    implicit_ordering(a, b) == Ordering::Equal
}
