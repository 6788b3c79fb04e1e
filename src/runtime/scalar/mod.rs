//! Intrinsic scalar types and promoted arithmetic.
//!
//! Binary operations promote both operands to the widest type involved, in the
//! order Boolean → Integer → Real → Complex. Booleans are not arithmetic, so two
//! Booleans meet at Integer.

use std::{cmp::Ordering, fmt};

use crate::runtime::{
    error::{RuntimeError, RuntimeResult},
    policy::raise,
    variant::ValueType,
};

pub mod complex;

pub use complex::Complex;

pub type Boolean = bool;
pub type Integer = i64;
pub type Real = f64;

/// A scalar operand with its type tag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Complex(Complex),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Boolean(v) => write!(f, "{}", v),
            Scalar::Integer(v) => write!(f, "{}", v),
            Scalar::Real(v) => write!(f, "{}", v),
            Scalar::Complex(v) => write!(f, "{}", v),
        }
    }
}

impl Scalar {
    pub fn value_type(self) -> ValueType {
        match self {
            Scalar::Boolean(_) => ValueType::Boolean,
            Scalar::Integer(_) => ValueType::Integer,
            Scalar::Real(_) => ValueType::Real,
            Scalar::Complex(_) => ValueType::Complex,
        }
    }

    pub fn to_complex(self) -> Complex {
        match self {
            Scalar::Boolean(v) => Complex::from(v),
            Scalar::Integer(v) => Complex::from(v),
            Scalar::Real(v) => Complex::from_real(v),
            Scalar::Complex(v) => v,
        }
    }

    /// Logical truth: non-zero after promotion to Complex.
    pub fn is_true(self) -> bool {
        !self.to_complex().is_zero()
    }

    /// Widens to `target`. Narrowing requests return the value unchanged.
    pub fn widen_to(self, target: ValueType) -> Scalar {
        match (self, target) {
            (Scalar::Boolean(v), ValueType::Integer) => Scalar::Integer(v as i64),
            (Scalar::Boolean(v), ValueType::Real) => Scalar::Real(if v { 1.0 } else { 0.0 }),
            (Scalar::Integer(v), ValueType::Real) => Scalar::Real(v as f64),
            (value, ValueType::Complex) => Scalar::Complex(value.to_complex()),
            (value, _) => value,
        }
    }

    /// Promotes both operands to their common arithmetic type.
    pub fn promote_pair(left: Scalar, right: Scalar) -> (Scalar, Scalar) {
        let target = left
            .value_type()
            .max(right.value_type())
            .max(ValueType::Integer);
        (left.widen_to(target), right.widen_to(target))
    }

    pub fn apply(self, op: ArithmeticOp, other: Scalar) -> RuntimeResult<Scalar> {
        match Scalar::promote_pair(self, other) {
            (Scalar::Integer(a), Scalar::Integer(b)) => integer_op(op, a, b).map(Scalar::Integer),
            (Scalar::Real(a), Scalar::Real(b)) => Ok(Scalar::Real(real_op(op, a, b))),
            (Scalar::Complex(a), Scalar::Complex(b)) => complex_op(op, a, b).map(Scalar::Complex),
            (a, b) => Err(RuntimeError::invalid_parameter(format!(
                "can not apply {:?} to {} and {}",
                op,
                a.value_type(),
                b.value_type()
            ))),
        }
    }

    pub fn negate(self) -> Scalar {
        match self {
            Scalar::Boolean(v) => Scalar::Integer(-(v as i64)),
            Scalar::Integer(v) => Scalar::Integer(v.wrapping_neg()),
            Scalar::Real(v) => Scalar::Real(-v),
            Scalar::Complex(v) => Scalar::Complex(-v),
        }
    }

    /// Raises to an integer power. Integer bases with negative exponents
    /// produce Real results.
    pub fn power(self, exponent: i64) -> Scalar {
        match self.widen_to(ValueType::Integer) {
            Scalar::Integer(base) if exponent >= 0 => {
                let exponent = u32::try_from(exponent).unwrap_or(u32::MAX);
                Scalar::Integer(base.wrapping_pow(exponent))
            }
            Scalar::Integer(base) => Scalar::Real((base as f64).powf(exponent as f64)),
            Scalar::Real(base) => Scalar::Real(base.powf(exponent as f64)),
            Scalar::Complex(base) => Scalar::Complex(base.powi(exponent)),
            Scalar::Boolean(v) => Scalar::Integer(v as i64).power(exponent),
        }
    }

    /// Three-way comparison between real-valued scalars. Complex operands must
    /// be essentially real.
    pub fn compare(self, other: Scalar) -> RuntimeResult<Option<Ordering>> {
        match Scalar::promote_pair(self, other) {
            (Scalar::Integer(a), Scalar::Integer(b)) => Ok(Some(a.cmp(&b))),
            (Scalar::Real(a), Scalar::Real(b)) => Ok(compare_mixed(self, other).or(a.partial_cmp(&b))),
            (Scalar::Complex(a), Scalar::Complex(b)) => {
                if a.is_essentially_real() && b.is_essentially_real() {
                    Ok(a.real.partial_cmp(&b.real))
                } else {
                    raise(
                        RuntimeError::type_conversion(ValueType::Complex, ValueType::Real),
                        None,
                    )
                }
            }
            _ => Ok(None),
        }
    }

    pub fn less_than(self, other: Scalar) -> RuntimeResult<bool> {
        Ok(self.compare(other)? == Some(Ordering::Less))
    }

    pub fn greater_than(self, other: Scalar) -> RuntimeResult<bool> {
        Ok(self.compare(other)? == Some(Ordering::Greater))
    }

    pub fn less_equal(self, other: Scalar) -> RuntimeResult<bool> {
        Ok(matches!(
            self.compare(other)?,
            Some(Ordering::Less | Ordering::Equal)
        ))
    }

    pub fn greater_equal(self, other: Scalar) -> RuntimeResult<bool> {
        Ok(matches!(
            self.compare(other)?,
            Some(Ordering::Greater | Ordering::Equal)
        ))
    }
}

/// Exact comparison when one side is an Integer and the other a Real, avoiding
/// the rounding of large integers through f64.
fn compare_mixed(left: Scalar, right: Scalar) -> Option<Ordering> {
    match (left, right) {
        (Scalar::Integer(a), Scalar::Real(b)) => compare_integer_real(a, b),
        (Scalar::Real(a), Scalar::Integer(b)) => compare_integer_real(b, a).map(Ordering::reverse),
        _ => None,
    }
}

/// Exact ordering of an i64 against an f64. Returns `None` for NaN.
pub fn compare_integer_real(integer: i64, real: f64) -> Option<Ordering> {
    if real.is_nan() {
        return None;
    }
    // 2^63 is exactly representable; anything at or beyond it exceeds every i64.
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    if real >= TWO_POW_63 {
        return Some(Ordering::Less);
    }
    if real < -TWO_POW_63 {
        return Some(Ordering::Greater);
    }
    let truncated = real.trunc();
    let whole = truncated as i64;
    match integer.cmp(&whole) {
        Ordering::Equal => {
            let fraction = real - truncated;
            if fraction > 0.0 {
                Some(Ordering::Less)
            } else if fraction < 0.0 {
                Some(Ordering::Greater)
            } else {
                Some(Ordering::Equal)
            }
        }
        other => Some(other),
    }
}

fn integer_op(op: ArithmeticOp, a: i64, b: i64) -> RuntimeResult<i64> {
    match op {
        ArithmeticOp::Add => Ok(a.wrapping_add(b)),
        ArithmeticOp::Subtract => Ok(a.wrapping_sub(b)),
        ArithmeticOp::Multiply => Ok(a.wrapping_mul(b)),
        ArithmeticOp::Divide if b == 0 => raise(RuntimeError::ResultIsInfinite, 0),
        ArithmeticOp::Divide => Ok(a.wrapping_div(b)),
        ArithmeticOp::Remainder if b == 0 => raise(RuntimeError::ResultIsInfinite, 0),
        ArithmeticOp::Remainder => Ok(a.wrapping_rem(b)),
    }
}

fn real_op(op: ArithmeticOp, a: f64, b: f64) -> f64 {
    match op {
        ArithmeticOp::Add => a + b,
        ArithmeticOp::Subtract => a - b,
        ArithmeticOp::Multiply => a * b,
        ArithmeticOp::Divide => a / b,
        ArithmeticOp::Remainder => a % b,
    }
}

fn complex_op(op: ArithmeticOp, a: Complex, b: Complex) -> RuntimeResult<Complex> {
    match op {
        ArithmeticOp::Add => Ok(a + b),
        ArithmeticOp::Subtract => Ok(a - b),
        ArithmeticOp::Multiply => Ok(a * b),
        ArithmeticOp::Divide => Ok(a / b),
        ArithmeticOp::Remainder => raise(
            RuntimeError::invalid_parameter("remainder is not defined for complex values"),
            Complex::nan(),
        ),
    }
}
