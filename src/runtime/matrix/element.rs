use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

use crate::runtime::{
    matrix::Matrix,
    scalar::{Complex, Scalar},
    variant::{ValueType, Variant},
};

/// Scalar type that can be stored in a [`Matrix`].
///
/// `add` and `mul` form a semiring with `zero` and `one`; for booleans they
/// are `||` and `&&`.
pub trait Element:
    Copy + Default + PartialEq + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    const SCALAR_TYPE: ValueType;
    const MATRIX_TYPE: ValueType;
    /// Element code of the binary matrix format. Uppercase marks a
    /// little-endian payload.
    const CODE: u8;

    fn zero() -> Self {
        Self::default()
    }

    fn one() -> Self;

    fn add(self, rhs: Self) -> Self;

    fn mul(self, rhs: Self) -> Self;

    fn conj(self) -> Self {
        self
    }

    fn is_zero(self) -> bool {
        self == Self::zero()
    }

    /// Total order used by matrix comparison. NaN sorts above every number
    /// and equals itself; `-0.0` equals `0.0`.
    fn relative_order(self, other: Self) -> Ordering;

    /// Hash consistent with [`Element::relative_order`].
    fn hash_element<H: Hasher>(self, state: &mut H);

    fn norm_squared(self) -> f64;

    fn to_scalar(self) -> Scalar;

    /// Extracts a scalar of exactly this type.
    fn from_scalar(value: Scalar) -> Option<Self>;

    fn into_variant(matrix: Matrix<Self>) -> Variant;

    fn matrix_of(value: &Variant) -> Option<&Matrix<Self>>;
}

/// Elements with additive inverses.
pub trait NumericElement: Element {
    fn sub(self, rhs: Self) -> Self;

    fn neg(self) -> Self;
}

/// Total order on f64 with NaN above every number.
pub(crate) fn real_order(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Hashes an f64 so that `-0.0` and `0.0` collide, as do all NaNs.
pub(crate) fn hash_real<H: Hasher>(value: f64, state: &mut H) {
    if value.is_nan() {
        u64::MAX.hash(state);
    } else if value == 0.0 {
        0u64.hash(state);
    } else {
        value.to_bits().hash(state);
    }
}

impl Element for bool {
    const SCALAR_TYPE: ValueType = ValueType::Boolean;
    const MATRIX_TYPE: ValueType = ValueType::MatrixBoolean;
    const CODE: u8 = b'B';

    fn one() -> Self {
        true
    }

    fn add(self, rhs: Self) -> Self {
        self || rhs
    }

    fn mul(self, rhs: Self) -> Self {
        self && rhs
    }

    fn relative_order(self, other: Self) -> Ordering {
        self.cmp(&other)
    }

    fn hash_element<H: Hasher>(self, state: &mut H) {
        self.hash(state);
    }

    fn norm_squared(self) -> f64 {
        if self { 1.0 } else { 0.0 }
    }

    fn to_scalar(self) -> Scalar {
        Scalar::Boolean(self)
    }

    fn from_scalar(value: Scalar) -> Option<Self> {
        match value {
            Scalar::Boolean(v) => Some(v),
            _ => None,
        }
    }

    fn into_variant(matrix: Matrix<Self>) -> Variant {
        Variant::MatrixBoolean(matrix)
    }

    fn matrix_of(value: &Variant) -> Option<&Matrix<Self>> {
        match value {
            Variant::MatrixBoolean(m) => Some(m),
            _ => None,
        }
    }
}

impl Element for i64 {
    const SCALAR_TYPE: ValueType = ValueType::Integer;
    const MATRIX_TYPE: ValueType = ValueType::MatrixInteger;
    const CODE: u8 = b'I';

    fn one() -> Self {
        1
    }

    fn add(self, rhs: Self) -> Self {
        self.wrapping_add(rhs)
    }

    fn mul(self, rhs: Self) -> Self {
        self.wrapping_mul(rhs)
    }

    fn relative_order(self, other: Self) -> Ordering {
        self.cmp(&other)
    }

    fn hash_element<H: Hasher>(self, state: &mut H) {
        self.hash(state);
    }

    fn norm_squared(self) -> f64 {
        let v = self as f64;
        v * v
    }

    fn to_scalar(self) -> Scalar {
        Scalar::Integer(self)
    }

    fn from_scalar(value: Scalar) -> Option<Self> {
        match value {
            Scalar::Integer(v) => Some(v),
            _ => None,
        }
    }

    fn into_variant(matrix: Matrix<Self>) -> Variant {
        Variant::MatrixInteger(matrix)
    }

    fn matrix_of(value: &Variant) -> Option<&Matrix<Self>> {
        match value {
            Variant::MatrixInteger(m) => Some(m),
            _ => None,
        }
    }
}

impl NumericElement for i64 {
    fn sub(self, rhs: Self) -> Self {
        self.wrapping_sub(rhs)
    }

    fn neg(self) -> Self {
        self.wrapping_neg()
    }
}

impl Element for f64 {
    const SCALAR_TYPE: ValueType = ValueType::Real;
    const MATRIX_TYPE: ValueType = ValueType::MatrixReal;
    const CODE: u8 = b'R';

    fn one() -> Self {
        1.0
    }

    fn add(self, rhs: Self) -> Self {
        self + rhs
    }

    fn mul(self, rhs: Self) -> Self {
        self * rhs
    }

    fn is_zero(self) -> bool {
        self == 0.0
    }

    fn relative_order(self, other: Self) -> Ordering {
        real_order(self, other)
    }

    fn hash_element<H: Hasher>(self, state: &mut H) {
        hash_real(self, state);
    }

    fn norm_squared(self) -> f64 {
        self * self
    }

    fn to_scalar(self) -> Scalar {
        Scalar::Real(self)
    }

    fn from_scalar(value: Scalar) -> Option<Self> {
        match value {
            Scalar::Real(v) => Some(v),
            _ => None,
        }
    }

    fn into_variant(matrix: Matrix<Self>) -> Variant {
        Variant::MatrixReal(matrix)
    }

    fn matrix_of(value: &Variant) -> Option<&Matrix<Self>> {
        match value {
            Variant::MatrixReal(m) => Some(m),
            _ => None,
        }
    }
}

impl NumericElement for f64 {
    fn sub(self, rhs: Self) -> Self {
        self - rhs
    }

    fn neg(self) -> Self {
        -self
    }
}

impl Element for Complex {
    const SCALAR_TYPE: ValueType = ValueType::Complex;
    const MATRIX_TYPE: ValueType = ValueType::MatrixComplex;
    const CODE: u8 = b'C';

    fn one() -> Self {
        Complex::ONE
    }

    fn add(self, rhs: Self) -> Self {
        self + rhs
    }

    fn mul(self, rhs: Self) -> Self {
        self * rhs
    }

    fn conj(self) -> Self {
        Complex::conj(self)
    }

    fn is_zero(self) -> bool {
        Complex::is_zero(self)
    }

    /// Real part first, then imaginary part.
    fn relative_order(self, other: Self) -> Ordering {
        real_order(self.real, other.real).then_with(|| real_order(self.imag, other.imag))
    }

    fn hash_element<H: Hasher>(self, state: &mut H) {
        hash_real(self.real, state);
        hash_real(self.imag, state);
    }

    fn norm_squared(self) -> f64 {
        Complex::norm_squared(self)
    }

    fn to_scalar(self) -> Scalar {
        Scalar::Complex(self)
    }

    fn from_scalar(value: Scalar) -> Option<Self> {
        match value {
            Scalar::Complex(v) => Some(v),
            _ => None,
        }
    }

    fn into_variant(matrix: Matrix<Self>) -> Variant {
        Variant::MatrixComplex(matrix)
    }

    fn matrix_of(value: &Variant) -> Option<&Matrix<Self>> {
        match value {
            Variant::MatrixComplex(m) => Some(m),
            _ => None,
        }
    }
}

impl NumericElement for Complex {
    fn sub(self, rhs: Self) -> Self {
        self - rhs
    }

    fn neg(self) -> Self {
        -self
    }
}
