//! Tagged runtime values.
//!
//! ## Memory model
//!
//! Scalars are stored inline. Container payloads (sets, tuples and the four
//! matrix types) share an immutable body behind an `Arc`; cloning a `Variant`
//! is O(1) and the first mutation through a shared handle copies the body.
//! Containers store their elements by value, so a value graph can never form
//! a cycle.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::runtime::{
    containers::{OrderedSet, Tuple},
    matrix::{MatrixBoolean, MatrixComplex, MatrixInteger, MatrixReal},
    scalar::{Complex, Scalar},
};

pub mod arith;
mod convert;
pub mod functions;
mod ordering;

pub(crate) use convert::exact_integer;
pub use ordering::{fallback_ordering, implicit_ordering};

/// Value tags in their total order.
///
/// The discriminants define cross-type comparison: a value of a lower tag
/// sorts before any value of a higher tag unless both are numeric scalars.
#[repr(u8)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    #[default]
    None = 0,
    Boolean = 1,
    Integer = 2,
    Real = 3,
    Complex = 4,
    Set = 5,
    Tuple = 6,
    MatrixBoolean = 7,
    MatrixInteger = 8,
    MatrixReal = 9,
    MatrixComplex = 10,
}

impl ValueType {
    pub const ALL: [ValueType; 11] = [
        ValueType::None,
        ValueType::Boolean,
        ValueType::Integer,
        ValueType::Real,
        ValueType::Complex,
        ValueType::Set,
        ValueType::Tuple,
        ValueType::MatrixBoolean,
        ValueType::MatrixInteger,
        ValueType::MatrixReal,
        ValueType::MatrixComplex,
    ];

    /// Boolean, Integer, Real or Complex.
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            ValueType::Boolean | ValueType::Integer | ValueType::Real | ValueType::Complex
        )
    }

    pub fn is_matrix(self) -> bool {
        matches!(
            self,
            ValueType::MatrixBoolean
                | ValueType::MatrixInteger
                | ValueType::MatrixReal
                | ValueType::MatrixComplex
        )
    }

    /// Scalar type of a matrix tag's elements.
    pub fn element_type(self) -> Option<ValueType> {
        match self {
            ValueType::MatrixBoolean => Some(ValueType::Boolean),
            ValueType::MatrixInteger => Some(ValueType::Integer),
            ValueType::MatrixReal => Some(ValueType::Real),
            ValueType::MatrixComplex => Some(ValueType::Complex),
            _ => None,
        }
    }

    /// Matrix tag holding elements of this scalar type.
    pub fn matrix_type(self) -> Option<ValueType> {
        match self {
            ValueType::Boolean => Some(ValueType::MatrixBoolean),
            ValueType::Integer => Some(ValueType::MatrixInteger),
            ValueType::Real => Some(ValueType::MatrixReal),
            ValueType::Complex => Some(ValueType::MatrixComplex),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueType::None => "None",
            ValueType::Boolean => "Boolean",
            ValueType::Integer => "Integer",
            ValueType::Real => "Real",
            ValueType::Complex => "Complex",
            ValueType::Set => "Set",
            ValueType::Tuple => "Tuple",
            ValueType::MatrixBoolean => "MatrixBoolean",
            ValueType::MatrixInteger => "MatrixInteger",
            ValueType::MatrixReal => "MatrixReal",
            ValueType::MatrixComplex => "MatrixComplex",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A dynamically tagged runtime value.
///
/// `PartialEq`, `Eq`, `Ord` and `Hash` all follow the cross-type total order
/// of [`implicit_ordering`]: `Integer(2)`, `Real(2.0)` and `Complex(1 + 1i)`
/// are equal, and every NaN equals every other NaN.
#[derive(Debug, Clone, Default)]
pub enum Variant {
    #[default]
    None,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Complex(Complex),
    Set(OrderedSet),
    Tuple(Tuple),
    MatrixBoolean(MatrixBoolean),
    MatrixInteger(MatrixInteger),
    MatrixReal(MatrixReal),
    MatrixComplex(MatrixComplex),
}

impl Variant {
    pub fn value_type(&self) -> ValueType {
        match self {
            Variant::None => ValueType::None,
            Variant::Boolean(_) => ValueType::Boolean,
            Variant::Integer(_) => ValueType::Integer,
            Variant::Real(_) => ValueType::Real,
            Variant::Complex(_) => ValueType::Complex,
            Variant::Set(_) => ValueType::Set,
            Variant::Tuple(_) => ValueType::Tuple,
            Variant::MatrixBoolean(_) => ValueType::MatrixBoolean,
            Variant::MatrixInteger(_) => ValueType::MatrixInteger,
            Variant::MatrixReal(_) => ValueType::MatrixReal,
            Variant::MatrixComplex(_) => ValueType::MatrixComplex,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Variant::None)
    }

    /// Returns the scalar payload, if any.
    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Variant::Boolean(v) => Some(Scalar::Boolean(*v)),
            Variant::Integer(v) => Some(Scalar::Integer(*v)),
            Variant::Real(v) => Some(Scalar::Real(*v)),
            Variant::Complex(v) => Some(Scalar::Complex(*v)),
            _ => None,
        }
    }

    /// The zero value of a tag: `false`, `0`, `0.0`, `0 + 0i`, `{}`, `()` or
    /// an empty matrix.
    pub fn zero_of(value_type: ValueType) -> Variant {
        match value_type {
            ValueType::None => Variant::None,
            ValueType::Boolean => Variant::Boolean(false),
            ValueType::Integer => Variant::Integer(0),
            ValueType::Real => Variant::Real(0.0),
            ValueType::Complex => Variant::Complex(Complex::ZERO),
            ValueType::Set => Variant::Set(OrderedSet::new()),
            ValueType::Tuple => Variant::Tuple(Tuple::new()),
            ValueType::MatrixBoolean => Variant::MatrixBoolean(MatrixBoolean::default()),
            ValueType::MatrixInteger => Variant::MatrixInteger(MatrixInteger::default()),
            ValueType::MatrixReal => Variant::MatrixReal(MatrixReal::default()),
            ValueType::MatrixComplex => Variant::MatrixComplex(MatrixComplex::default()),
        }
    }
}

impl From<Scalar> for Variant {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Boolean(v) => Variant::Boolean(v),
            Scalar::Integer(v) => Variant::Integer(v),
            Scalar::Real(v) => Variant::Real(v),
            Scalar::Complex(v) => Variant::Complex(v),
        }
    }
}

impl From<bool> for Variant {
    fn from(value: bool) -> Self {
        Variant::Boolean(value)
    }
}

impl From<i64> for Variant {
    fn from(value: i64) -> Self {
        Variant::Integer(value)
    }
}

impl From<f64> for Variant {
    fn from(value: f64) -> Self {
        Variant::Real(value)
    }
}

impl From<Complex> for Variant {
    fn from(value: Complex) -> Self {
        Variant::Complex(value)
    }
}

impl From<OrderedSet> for Variant {
    fn from(value: OrderedSet) -> Self {
        Variant::Set(value)
    }
}

impl From<Tuple> for Variant {
    fn from(value: Tuple) -> Self {
        Variant::Tuple(value)
    }
}

impl From<MatrixBoolean> for Variant {
    fn from(value: MatrixBoolean) -> Self {
        Variant::MatrixBoolean(value)
    }
}

impl From<MatrixInteger> for Variant {
    fn from(value: MatrixInteger) -> Self {
        Variant::MatrixInteger(value)
    }
}

impl From<MatrixReal> for Variant {
    fn from(value: MatrixReal) -> Self {
        Variant::MatrixReal(value)
    }
}

impl From<MatrixComplex> for Variant {
    fn from(value: MatrixComplex) -> Self {
        Variant::MatrixComplex(value)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::None => write!(f, "None"),
            Variant::Boolean(v) => write!(f, "{}", v),
            Variant::Integer(v) => write!(f, "{}", v),
            Variant::Real(v) => write!(f, "{}", v),
            Variant::Complex(v) => write!(f, "{}", v),
            Variant::Set(set) => {
                let items: Vec<String> = set.iter().map(|e| e.to_string()).collect();
                write!(f, "{{{}}}", items.join(", "))
            }
            Variant::Tuple(tuple) => {
                let items: Vec<String> = tuple.iter().map(|e| e.to_string()).collect();
                write!(f, "({})", items.join(", "))
            }
            Variant::MatrixBoolean(m) => write!(f, "{}", m),
            Variant::MatrixInteger(m) => write!(f, "{}", m),
            Variant::MatrixReal(m) => write!(f, "{}", m),
            Variant::MatrixComplex(m) => write!(f, "{}", m),
        }
    }
}

#[cfg(test)]
mod ordering_test;
